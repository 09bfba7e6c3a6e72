//! The MCP tools: thin wrappers around the command handlers.

use crate::args::{AddArgs, ListArgs, SearchArgs};
use crate::commands::{self, OutputFormat};
use crate::mcp::mcp_utils::tool_result;
use crate::mcp::StockServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

/// Parameters for the refresh_records tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[schemars(title = "RefreshParams")]
pub struct RefreshParams {
    /// How to render the records: 'table' (markdown, default), 'json' or 'csv'.
    #[serde(default)]
    pub format: OutputFormat,
}

#[tool_router(vis = "pub(super)")]
impl StockServer {
    /// Log a new inventory record. The current local time is used as its timestamp.
    ///
    /// # Parameters
    ///
    /// - `name` (required): the item or person the event is about. Must not be blank.
    /// - `amount`: quantity or sum of money, a number or a string such as "1,200". Must not be
    ///   negative. Defaults to 0.
    /// - `category` (required): '입고' (inbound), '출고' (outbound) or '기타' (other). The English
    ///   names are accepted too.
    /// - `note`: free-form text. Defaults to empty.
    ///
    /// Returns the record as it was written to the worksheet.
    #[tool]
    async fn add_record(
        &self,
        Parameters(args): Parameters<AddArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: add_record called");
        tool_result(commands::add(&self.inventory, args).await)
    }

    /// List every record in the worksheet, oldest first. Results may come from a cache that is
    /// cleared whenever a record is added; pass `refresh: true` to read the worksheet again.
    ///
    /// The response status is 'data', or 'no_data' when the worksheet holds no records.
    #[tool]
    async fn list_records(
        &self,
        Parameters(args): Parameters<ListArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: list_records called");
        tool_result(commands::list(&self.inventory, args).await)
    }

    /// Find the records whose name contains `term`. Case is ignored and the term is matched
    /// literally (it is not a pattern).
    ///
    /// The response status is 'data', 'no_results' when nothing matched, or 'no_data' when the
    /// worksheet holds no records at all.
    #[tool]
    async fn search_records(
        &self,
        Parameters(args): Parameters<SearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: search_records called");
        tool_result(commands::search(&self.inventory, args).await)
    }

    /// Discard cached records and read the worksheet again. Use this when someone may have
    /// edited the sheet by hand.
    #[tool]
    async fn refresh_records(
        &self,
        Parameters(params): Parameters<RefreshParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: refresh_records called");
        let args = ListArgs {
            format: params.format,
            refresh: true,
        };
        tool_result(commands::list(&self.inventory, args).await)
    }
}
