// src/parse/profiles.rs
// Guardian profile and child extraction from the profile endpoint

use super::{Parsed, str_field};
use crate::error::{AulaError, Result};
use crate::model::{Child, Profile};
use serde_json::Value;

/// Parse the `data` object of `profiles.getProfilesByLogin`.
///
/// Fails only when the `profiles` container is absent; individual profiles
/// or children that don't normalize are skipped with a warning.
pub fn parse_profiles(data: &Value) -> Result<Parsed<Profile>> {
    let raw_profiles = data
        .get("profiles")
        .and_then(Value::as_array)
        .ok_or_else(|| AulaError::Parse("profile response has no profiles array".to_string()))?;

    let mut parsed = Parsed::new();
    for raw in raw_profiles {
        let mut profile = Profile::default();
        let children = raw.get("children").and_then(Value::as_array);
        for raw_child in children.into_iter().flatten() {
            match parse_child(raw_child) {
                Some(child) => profile.children.push(child),
                None => parsed.warn("child", format!("missing id or name: {}", raw_child)),
            }
        }
        parsed.push(profile);
    }
    Ok(parsed)
}

/// One child record; id and name are required, the rest is optional
fn parse_child(raw: &Value) -> Option<Child> {
    let id = str_field(raw, "id")?;
    let name = str_field(raw, "name")?;
    let user_id = str_field(raw, "userId").unwrap_or_default();
    let institution_name = raw
        .get("institutionProfile")
        .and_then(|p| str_field(p, "institutionName"));

    Some(Child {
        id,
        name,
        user_id,
        institution_name,
    })
}
