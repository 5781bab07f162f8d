use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const COMMAND_API_VERSION: u32 = 1;

/// Closed set of connection commands.
///
/// Wire shape: `{"action": "<snake_case>", "payload": {...}}`. `stats` takes
/// no payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum CommandRequest {
    /// Score one item against the rest of the corpus
    AnalyzeItem { item_id: String },

    /// Batch pass over the listed items (whole corpus when omitted)
    BatchAnalyze {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_ids: Option<Vec<String>>,
    },

    Link { item_id1: String, item_id2: String },

    Unlink { item_id1: String, item_id2: String },

    Related { item_id: String },

    /// Drop every connection of an item and analyze it again
    Refresh { item_id: String },

    Stats,
}

impl CommandRequest {
    pub const fn action(&self) -> &'static str {
        match self {
            CommandRequest::AnalyzeItem { .. } => "analyze_item",
            CommandRequest::BatchAnalyze { .. } => "batch_analyze",
            CommandRequest::Link { .. } => "link",
            CommandRequest::Unlink { .. } => "unlink",
            CommandRequest::Related { .. } => "related",
            CommandRequest::Refresh { .. } => "refresh",
            CommandRequest::Stats => "stats",
        }
    }

    /// Whether executing this command may write to the store
    pub const fn is_mutating(&self) -> bool {
        !matches!(self, CommandRequest::Related { .. } | CommandRequest::Stats)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub version: u32,
    pub status: CommandStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub meta: CommandMeta,
}

impl CommandResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            version: COMMAND_API_VERSION,
            status: CommandStatus::Ok,
            message: None,
            error: None,
            data,
            meta: CommandMeta::default(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            version: COMMAND_API_VERSION,
            status: CommandStatus::Error,
            message: Some(message.clone()),
            error: Some(ErrorEnvelope {
                code: code.into(),
                message,
                hint: None,
            }),
            data: Value::Null,
            meta: CommandMeta::default(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.hint = Some(hint.into());
        }
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == CommandStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_parses_adjacently_tagged_payload() {
        let req: CommandRequest = serde_json::from_str(
            r#"{"action":"link","payload":{"item_id1":"a","item_id2":"b"}}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            CommandRequest::Link {
                item_id1: "a".to_string(),
                item_id2: "b".to_string()
            }
        );
        assert_eq!(req.action(), "link");
    }

    #[test]
    fn stats_needs_no_payload() {
        let req: CommandRequest = serde_json::from_str(r#"{"action":"stats"}"#).unwrap();
        assert_eq!(req, CommandRequest::Stats);
        assert!(!req.is_mutating());
    }

    #[test]
    fn batch_item_ids_are_optional() {
        let req: CommandRequest =
            serde_json::from_str(r#"{"action":"batch_analyze","payload":{}}"#).unwrap();
        assert_eq!(req, CommandRequest::BatchAnalyze { item_ids: None });
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = serde_json::from_str::<CommandRequest>(r#"{"action":"explode"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn error_response_carries_envelope() {
        let resp = CommandResponse::error("not_found", "Item not found: x").with_hint("import it");
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["code"], "not_found");
        assert_eq!(value["error"]["hint"], "import it");
        assert!(!resp.is_ok());
    }
}
