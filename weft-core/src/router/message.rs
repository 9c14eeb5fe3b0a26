//! Wire messages from the browser.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Method name of heartbeat messages.
pub const HEARTBEAT: &str = "heartbeat";

/// Pseudo-method that only asks for a render.
pub const REFRESH: &str = "Refresh";

/// Pseudo-method that sets a field from a two-way binding.
pub const SET_ATTRIBUTE: &str = "SetAttribute";

/// A client message as it appears on the wire.
///
/// ```json
/// { "method": "c3.Delete", "key": "0", "value": "" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A decoded client event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Liveness only; bypasses routing.
    Heartbeat,
    /// Render without mutating anything.
    Refresh,
    /// Set `field` on `target` to `value`.
    SetAttribute {
        target: String,
        field: Option<String>,
        value: Option<String>,
    },
    /// Call handler `method` on `target`.
    Invoke {
        target: String,
        method: String,
        key: Option<String>,
        value: Option<String>,
    },
}

impl Message {
    /// Parse a text frame without interpreting the method.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Event {
    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        Message::decode(text)?.try_into()
    }

    /// Build an event from the parts the router contract names.
    pub fn from_parts(component_id: &str, method: &str, key: Option<&str>, value: Option<&str>) -> Self {
        let key = key.map(str::to_owned);
        let value = value.map(str::to_owned);
        match method {
            REFRESH => Event::Refresh,
            SET_ATTRIBUTE => Event::SetAttribute {
                target: component_id.to_owned(),
                field: key,
                value,
            },
            _ => Event::Invoke {
                target: component_id.to_owned(),
                method: method.to_owned(),
                key,
                value,
            },
        }
    }
}

impl TryFrom<Message> for Event {
    type Error = DecodeError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        if message.method == HEARTBEAT {
            return Ok(Event::Heartbeat);
        }

        let (target, method) = message
            .method
            .split_once('.')
            .filter(|(target, method)| !target.is_empty() && !method.is_empty())
            .ok_or_else(|| DecodeError::Method(message.method.clone()))?;

        Ok(Event::from_parts(
            target,
            method,
            message.key.as_deref(),
            message.value.as_deref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_heartbeat() {
        assert_eq!(Event::decode(r#"{"method":"heartbeat"}"#).unwrap(), Event::Heartbeat);
    }

    #[test]
    fn decodes_refresh_for_any_target() {
        assert_eq!(Event::decode(r#"{"method":"app.Refresh"}"#).unwrap(), Event::Refresh);
        assert_eq!(Event::decode(r#"{"method":"c9.Refresh"}"#).unwrap(), Event::Refresh);
    }

    #[test]
    fn decodes_set_attribute() {
        let event = Event::decode(r#"{"method":"c3.SetAttribute","key":"Name","value":"Bob"}"#).unwrap();
        assert_eq!(
            event,
            Event::SetAttribute {
                target: "c3".into(),
                field: Some("Name".into()),
                value: Some("Bob".into()),
            }
        );
    }

    #[test]
    fn decodes_invoke_with_optional_arguments() {
        let event = Event::decode(r#"{"method":"c3.Delete","key":"0"}"#).unwrap();
        assert_eq!(
            event,
            Event::Invoke {
                target: "c3".into(),
                method: "Delete".into(),
                key: Some("0".into()),
                value: None,
            }
        );
    }

    #[test]
    fn method_splits_at_first_dot() {
        let event = Event::decode(r#"{"method":"c3.Do.Thing"}"#).unwrap();
        assert!(matches!(event, Event::Invoke { ref method, .. } if method == "Do.Thing"));
    }

    #[test]
    fn rejects_malformed_messages() {
        assert!(matches!(Event::decode("not json"), Err(DecodeError::Json(_))));
        assert!(matches!(Event::decode(r#"{"key":"x"}"#), Err(DecodeError::Json(_))));
        for method in ["AddOne", ".AddOne", "c3.", ""] {
            let text = serde_json::to_string(&Message {
                method: method.into(),
                key: None,
                value: None,
            })
            .unwrap();
            assert!(matches!(Event::decode(&text), Err(DecodeError::Method(_))), "{method}");
        }
    }
}
