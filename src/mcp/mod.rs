// src/mcp/mod.rs
// MCP Server implementation

pub mod tools;

use crate::data::DataManager;
use crate::session::SessionManager;
use rmcp::{
    ErrorData, ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::ToolCallContext, wrapper::Parameters},
    model::{
        CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam,
        ServerCapabilities, ServerInfo,
    },
    schemars,
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// MCP Server state
#[derive(Clone)]
pub struct AulaServer {
    pub data: Arc<DataManager>,
    tool_router: ToolRouter<Self>,
}

impl AulaServer {
    pub fn new(data: Arc<DataManager>) -> Self {
        Self {
            data,
            tool_router: Self::tool_router(),
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        self.data.session()
    }
}

// Request types for tools with parameters

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetChildByIdRequest {
    #[schemars(description = "ID of the child")]
    pub child_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetCalendarEventsRequest {
    #[schemars(description = "ID of the child")]
    pub child_id: String,
    #[schemars(description = "Days to fetch from today (default 14)")]
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetEventsForDateRangeRequest {
    #[schemars(description = "ID of the child")]
    pub child_id: String,
    #[schemars(description = "Start date (YYYY-MM-DD, default today)")]
    pub start_date: Option<String>,
    #[schemars(description = "End date (YYYY-MM-DD, inclusive)")]
    pub end_date: Option<String>,
    #[schemars(description = "Window in days when no end date is given (default 14)")]
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetPresenceRequest {
    #[schemars(description = "ID of the child")]
    pub child_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetGalleryRequest {
    #[schemars(description = "Max items to return (default 3)")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetSummaryRequest {
    #[schemars(description = "Force a fresh fetch regardless of cache age")]
    pub force_update: Option<bool>,
}

#[tool_router]
impl AulaServer {
    #[tool(description = "Force a new login to the platform (data tools log in automatically).")]
    async fn login(&self) -> Result<String, String> {
        tools::auth::login(self).await
    }

    #[tool(description = "Get the list of children attached to the account.")]
    async fn get_children(&self) -> Result<String, String> {
        tools::children::get_children(self).await
    }

    #[tool(description = "Get one child by id.")]
    async fn get_child_by_id(
        &self,
        Parameters(req): Parameters<GetChildByIdRequest>,
    ) -> Result<String, String> {
        tools::children::get_child_by_id(self, req.child_id).await
    }

    #[tool(description = "Get calendar events for a child over the coming days.")]
    async fn get_calendar_events(
        &self,
        Parameters(req): Parameters<GetCalendarEventsRequest>,
    ) -> Result<String, String> {
        tools::calendar::get_calendar_events(self, req.child_id, req.days).await
    }

    #[tool(description = "Get calendar events for a child in a date range (both dates inclusive).")]
    async fn get_events_for_date_range(
        &self,
        Parameters(req): Parameters<GetEventsForDateRangeRequest>,
    ) -> Result<String, String> {
        tools::calendar::get_events_for_date_range(
            self,
            req.child_id,
            req.start_date,
            req.end_date,
            req.days,
        )
        .await
    }

    #[tool(description = "Get unread messages: count plus the unread list, most recent first.")]
    async fn get_unread_messages(&self) -> Result<String, String> {
        tools::messages::get_unread_messages(self).await
    }

    #[tool(description = "Get presence records (check-in/check-out/status) for a child.")]
    async fn get_presence_data(
        &self,
        Parameters(req): Parameters<GetPresenceRequest>,
    ) -> Result<String, String> {
        tools::presence::get_presence_data(self, req.child_id).await
    }

    #[tool(description = "Get the newest gallery items.")]
    async fn get_gallery_items(
        &self,
        Parameters(req): Parameters<GetGalleryRequest>,
    ) -> Result<String, String> {
        tools::gallery::get_gallery_items(self, req.limit).await
    }

    #[tool(description = "Get a combined summary of children, messages, presence and calendar. Cached for 15 minutes unless forced.")]
    async fn get_summary(
        &self,
        Parameters(req): Parameters<GetSummaryRequest>,
    ) -> Result<String, String> {
        tools::gallery::get_summary(self, req.force_update.unwrap_or(false)).await
    }

    #[tool(description = "Refresh all platform data now.")]
    async fn refresh_data(&self) -> Result<String, String> {
        tools::auth::refresh_data(self).await
    }
}

impl ServerHandler for AulaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: "aula-mcp".into(),
                title: Some("Aula - school platform tools".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only access to the Aula school platform: children, calendar, messages, presence and gallery.".into(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let tool_name = request.name.to_string();
            let start = std::time::Instant::now();

            let ctx = ToolCallContext::new(self, request, context);
            let result = self.tool_router.call(ctx).await;

            debug!(
                tool = %tool_name,
                duration_ms = start.elapsed().as_millis() as u64,
                success = result.is_ok(),
                "Tool call finished"
            );
            result
        }
    }
}
