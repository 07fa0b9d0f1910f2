//! Raw message records as they appear in log files.
//!
//! Field names are accepted in camelCase (`branchId`) and snake_case
//! (`branch_id`). Every field is optional at this level so that validation
//! can explain what is missing instead of failing inside serde.

use crate::types::{Message, Role};
use chrono::DateTime;
use serde::Deserialize;

/// A message record before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawMessage {
    id: Option<serde_json::Value>,
    role: Option<String>,
    #[serde(alias = "ts", alias = "createdAt", alias = "created_at")]
    timestamp: Option<RawTimestamp>,
    #[serde(alias = "branch_id")]
    branch_id: Option<String>,
    #[serde(alias = "branch_point")]
    branch_point: Option<String>,
    #[serde(alias = "text", alias = "body")]
    content: Option<String>,
}

/// Timestamps come as epoch milliseconds or as RFC 3339 strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Float(f64),
    Text(String),
}

impl RawTimestamp {
    fn to_millis(&self) -> Result<i64, String> {
        match self {
            RawTimestamp::Millis(ms) => Ok(*ms),
            RawTimestamp::Float(value) if value.is_finite() => Ok(value.trunc() as i64),
            RawTimestamp::Float(value) => Err(format!("timestamp is not finite: {}", value)),
            RawTimestamp::Text(text) => {
                if let Ok(ms) = text.trim().parse::<i64>() {
                    return Ok(ms);
                }
                DateTime::parse_from_rfc3339(text.trim())
                    .map(|ts| ts.timestamp_millis())
                    .map_err(|e| format!("invalid timestamp {:?}: {}", text, e))
            }
        }
    }
}

impl RawMessage {
    /// Validate and convert into a [`Message`].
    pub(crate) fn into_message(self) -> Result<Message, String> {
        let id = match self.id {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::String(_)) => return Err("empty id".to_string()),
            Some(other) => return Err(format!("id must be a string or number, got {}", other)),
            None => return Err("missing id".to_string()),
        };

        let role: Role = self
            .role
            .ok_or_else(|| "missing role".to_string())?
            .parse()?;

        let timestamp = self
            .timestamp
            .ok_or_else(|| "missing timestamp".to_string())?
            .to_millis()?;

        Ok(Message {
            id,
            role,
            timestamp,
            branch_id: self.branch_id.filter(|b| !b.is_empty()),
            branch_point: self.branch_point.filter(|p| !p.is_empty()),
            content: self.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Message, String> {
        serde_json::from_str::<RawMessage>(json)
            .map_err(|e| e.to_string())?
            .into_message()
    }

    #[test]
    fn test_camel_and_snake_case_fields() {
        let camel = parse(
            r#"{"id":"a2","role":"assistant","timestamp":2,"branchId":"r1","branchPoint":"u0"}"#,
        )
        .unwrap();
        let snake = parse(
            r#"{"id":"a2","role":"assistant","timestamp":2,"branch_id":"r1","branch_point":"u0"}"#,
        )
        .unwrap();

        assert_eq!(camel, snake);
        assert_eq!(camel.branch_id.as_deref(), Some("r1"));
        assert_eq!(camel.branch_point.as_deref(), Some("u0"));
    }

    #[test]
    fn test_timestamp_forms() {
        let millis = parse(r#"{"id":"1","role":"user","timestamp":1700000000000}"#).unwrap();
        let text = parse(r#"{"id":"1","role":"user","timestamp":"2023-11-14T22:13:20Z"}"#).unwrap();
        let float = parse(r#"{"id":"1","role":"user","ts":1700000000000.7}"#).unwrap();

        assert_eq!(millis.timestamp, 1_700_000_000_000);
        assert_eq!(text.timestamp, 1_700_000_000_000);
        assert_eq!(float.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_numeric_id_and_content_alias() {
        let msg = parse(r#"{"id":42,"role":"human","timestamp":1,"text":"hi"}"#).unwrap();
        assert_eq!(msg.id, "42");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content.as_deref(), Some("hi"));
    }

    #[test]
    fn test_empty_branch_fields_mean_main() {
        let msg = parse(r#"{"id":"1","role":"user","timestamp":1,"branchId":""}"#).unwrap();
        assert!(msg.is_main_line());
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            parse(r#"{"role":"user","timestamp":1}"#).unwrap_err(),
            "missing id"
        );
        assert_eq!(
            parse(r#"{"id":" ","role":"user","timestamp":1}"#).unwrap_err(),
            "empty id"
        );
        assert!(parse(r#"{"id":"1","role":"tool","timestamp":1}"#)
            .unwrap_err()
            .contains("unknown role"));
        assert_eq!(
            parse(r#"{"id":"1","role":"user"}"#).unwrap_err(),
            "missing timestamp"
        );
        assert!(parse(r#"{"id":"1","role":"user","timestamp":"yesterday"}"#)
            .unwrap_err()
            .contains("invalid timestamp"));
    }
}
