use crate::error::{ConnectionError, Result};
use crate::manager::ConnectionManager;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use wings_protocol::{CommandRequest, CommandResponse, Connection};

/// Executes Command API requests against a [`ConnectionManager`]
pub struct CommandHandler {
    manager: Arc<ConnectionManager>,
}

impl CommandHandler {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Parse and execute a raw JSON request
    pub async fn execute_json(&self, raw: &str) -> CommandResponse {
        match serde_json::from_str::<CommandRequest>(raw) {
            Ok(request) => self.execute(request).await,
            Err(e) => CommandResponse::error("invalid_request", format!("Invalid request: {e}"))
                .with_hint(
                    "Expected {\"action\": \"analyze_item|batch_analyze|link|unlink|related|refresh|stats\", \"payload\": {...}}",
                ),
        }
    }

    pub async fn execute(&self, request: CommandRequest) -> CommandResponse {
        let started = Instant::now();
        let action = request.action();
        log::debug!("Executing {} command", action);

        let mut response = match self.dispatch(request).await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("{} command failed: {}", action, err);
                error_response(&err)
            }
        };
        response.meta.action = Some(action.to_string());
        response.meta.duration_ms = Some(started.elapsed().as_millis() as u64);
        response
    }

    async fn dispatch(&self, request: CommandRequest) -> Result<CommandResponse> {
        let manager = &self.manager;
        match request {
            CommandRequest::AnalyzeItem { item_id } => {
                let created = manager.analyze_connections_for_item_id(&item_id).await?;
                Ok(connections_response(created))
            }
            CommandRequest::BatchAnalyze { item_ids } => {
                let created = match item_ids {
                    Some(ids) => manager.batch_analyze_ids(&ids).await?,
                    None => manager.batch_analyze_all().await?,
                };
                Ok(connections_response(created))
            }
            CommandRequest::Link { item_id1, item_id2 } => {
                let connection = manager
                    .create_manual_connection(&item_id1, &item_id2)
                    .await?;
                Ok(CommandResponse::ok(json!({ "connection": connection }))
                    .with_message(format!("linked {item_id1} and {item_id2}")))
            }
            CommandRequest::Unlink { item_id1, item_id2 } => {
                let removed = manager.remove_connection(&item_id1, &item_id2).await?;
                let message = if removed {
                    format!("unlinked {item_id1} and {item_id2}")
                } else {
                    format!("no connection between {item_id1} and {item_id2}")
                };
                Ok(CommandResponse::ok(json!({ "removed": removed })).with_message(message))
            }
            CommandRequest::Related { item_id } => {
                let items = manager.get_related_items(&item_id).await?;
                let message = found_message(items.len());
                Ok(CommandResponse::ok(json!({ "count": items.len(), "items": items }))
                    .with_message(message))
            }
            CommandRequest::Refresh { item_id } => {
                let created = manager.refresh_connections(&item_id).await?;
                Ok(connections_response(created))
            }
            CommandRequest::Stats => {
                let stats = manager.get_connection_stats().await?;
                Ok(CommandResponse::ok(to_value(&stats)?))
            }
        }
    }
}

fn connections_response(created: Vec<Connection>) -> CommandResponse {
    let message = found_message(created.len());
    CommandResponse::ok(json!({ "count": created.len(), "connections": created }))
        .with_message(message)
}

fn found_message(count: usize) -> String {
    if count == 0 {
        "no connections yet".to_string()
    } else {
        format!("connections found: {count}")
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ConnectionError::Other(e.to_string()))
}

fn error_response(err: &ConnectionError) -> CommandResponse {
    let response = CommandResponse::error(err.code(), err.to_string());
    match err {
        ConnectionError::ItemNotFound(_) => {
            response.with_hint("Import the item into the store before analyzing it")
        }
        ConnectionError::SelfConnection(_) => {
            response.with_hint("Pass two different item ids")
        }
        _ => response,
    }
}
