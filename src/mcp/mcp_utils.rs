use crate::commands::Out;
use crate::error::ErrorType;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{error, warn};

pub(super) fn to_content<T>(out: Out<T>) -> Vec<Content>
where
    T: Debug + Clone + Serialize,
{
    let mut content = vec![Content::text(out.message())];
    if let Some(object) = out.structure() {
        match Content::json(object) {
            Ok(json) => content.push(json),
            Err(e) => error!("Unable to serialize JSON output: {e}"),
        };
    }
    content
}

/// Converts a command result into a tool result. Errors are reported to the agent as tool errors,
/// prefixed with their type so that a rejected input can be told apart from a store failure.
pub(super) fn tool_result<T>(result: crate::Result<Out<T>>) -> Result<CallToolResult, ErrorData>
where
    T: Debug + Clone + Serialize,
{
    Ok(match result {
        Ok(out) => CallToolResult::success(to_content(out)),
        Err(e) => {
            warn!("Tool call failed: {e:?}");
            let message = match e.error_type() {
                ErrorType::Validation => format!("Invalid input: {e}"),
                error_type => format!("{error_type} error: {e}"),
            };
            CallToolResult::error(vec![Content::text(message)])
        }
    })
}
