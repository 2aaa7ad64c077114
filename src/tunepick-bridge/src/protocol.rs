//! Method channel message types.
//!
//! Calls arrive as [`MethodCall`]s naming a command; every call is answered by
//! exactly one [`MethodResponse`]. On the JSON-lines transport each answer is
//! wrapped in a [`MethodReply`] carrying the id of the call it belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;
use tunepick_core::models::MediaItem;

/// Default channel name the bridge registers under.
pub const CHANNEL_NAME: &str = "apple_music_picker";

/// An inbound call from the calling layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Caller-chosen id for correlating the reply.
    #[serde(default)]
    pub id: u64,
    /// Command name, e.g. `"pick"`.
    pub method: String,
    /// Ignored by every supported command.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl MethodCall {
    pub fn new(id: u64, method: impl Into<String>) -> Self {
        Self {
            id,
            method: method.into(),
            arguments: serde_json::Value::Null,
        }
    }
}

/// Commands the bridge understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeCommand {
    /// Let the user pick songs from the device library.
    Pick,
}

impl BridgeCommand {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "pick" => Some(Self::Pick),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pick => "pick",
        }
    }
}

impl fmt::Display for BridgeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single terminal answer to a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum MethodResponse {
    /// Picked items in library order. Empty when the user cancelled.
    Success(Vec<MediaItem>),
    /// The request could not be carried out.
    Error(BridgeError),
    /// The command name is not supported.
    NotImplemented,
}

impl MethodResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Error(_) => "error",
            Self::NotImplemented => "not_implemented",
        }
    }
}

/// Structured error delivered through the response channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeError {
    pub code: ErrorCode,
    pub message: String,
}

impl BridgeError {
    pub fn no_permission(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NoPermission,
            message: message.into(),
        }
    }

    pub fn no_ui_host(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NoUiHost,
            message: message.into(),
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for BridgeError {}

/// Stable error codes. Messages are localized; codes are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The user (or device policy) refused media library access.
    NoPermission,
    /// There was no UI root to present the picker on.
    NoUiHost,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPermission => "no_permission",
            Self::NoUiHost => "no_ui_host",
        }
    }
}

/// A response correlated to its call for line-oriented transports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodReply {
    pub id: u64,
    pub response: MethodResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_pick_parses() {
        assert_eq!(BridgeCommand::parse("pick"), Some(BridgeCommand::Pick));
        assert_eq!(BridgeCommand::parse("Pick"), None);
        assert_eq!(BridgeCommand::parse("browse"), None);
        assert_eq!(BridgeCommand::parse(""), None);
    }

    #[test]
    fn call_without_arguments_deserializes() {
        let call: MethodCall = serde_json::from_str(r#"{"id":7,"method":"pick"}"#).unwrap();
        assert_eq!(call, MethodCall::new(7, "pick"));
    }

    #[test]
    fn error_response_wire_shape() {
        let response =
            MethodResponse::Error(BridgeError::no_permission("Apple Music access denied"));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": "error",
                "result": {"code": "no_permission", "message": "Apple Music access denied"}
            })
        );
    }

    #[test]
    fn empty_success_and_not_implemented_wire_shape() {
        assert_eq!(
            serde_json::to_value(MethodResponse::Success(vec![])).unwrap(),
            json!({"status": "success", "result": []})
        );
        assert_eq!(
            serde_json::to_value(MethodResponse::NotImplemented).unwrap(),
            json!({"status": "not_implemented"})
        );
    }

    #[test]
    fn reply_deserializes() {
        let json = r#"{"id":3,"response":{"status":"success","result":[{"title":"t","artist":"a","album":"b","duration":1.5,"url":"file:///t.m4a"}]}}"#;
        let reply: MethodReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.id, 3);
        match reply.response {
            MethodResponse::Success(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].artwork, None);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }
}
