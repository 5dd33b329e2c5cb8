//! Inbound payloads: invocation triggers and the events they carry
//!
//! A trigger is whatever the host handed to the relay (an HTTP proxy event, a
//! queue record, or a bare event). Decoding it yields an [`InboundEvent`] in
//! exactly one of its shapes.

use crate::error::{RelayError, RelayResult};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// How the relay was invoked; decides the shape of the final response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// HTTP proxy event (`httpMethod` present)
    Http,
    /// Queue record (`Records[0].Sns.Message`)
    Queue,
    /// The event itself, handed over directly
    Direct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub kind: TriggerKind,
    pub payload: Value,
}

impl Trigger {
    /// Unwrap the payload from a raw invocation event
    pub fn decode(raw: Value) -> RelayResult<Self> {
        if let Some(method) = raw.get("httpMethod") {
            let payload = if method.as_str() == Some("GET") {
                raw.get("queryStringParameters")
                    .cloned()
                    .unwrap_or(Value::Null)
            } else {
                match raw.get("body") {
                    Some(Value::String(body)) => serde_json::from_str(body)?,
                    Some(body) if !body.is_null() => body.clone(),
                    _ => {
                        return Err(RelayError::InvalidPayload(
                            "HTTP trigger has no body".to_string(),
                        ));
                    }
                }
            };
            return Ok(Self {
                kind: TriggerKind::Http,
                payload,
            });
        }

        if let Some(records) = raw.get("Records") {
            let message = records
                .pointer("/0/Sns/Message")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    RelayError::InvalidPayload("queue record has no message".to_string())
                })?;
            return Ok(Self {
                kind: TriggerKind::Queue,
                payload: serde_json::from_str(message)?,
            });
        }

        Ok(Self {
            kind: TriggerKind::Direct,
            payload: raw,
        })
    }
}

/// Read a JSON `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One `{title, value}` pair of attachment metadata
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AttachmentField {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

/// A message attachment
///
/// Slack nests metadata under `fields`; a flat `{title, value}` attachment is
/// treated as a single field.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<AttachmentField>,
}

impl Attachment {
    fn field_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        let flat = match (&self.title, &self.value) {
            (Some(title), Some(value)) => Some((title.as_str(), value.as_str())),
            _ => None,
        };
        flat.into_iter().chain(
            self.fields
                .iter()
                .map(|field| (field.title.as_str(), field.value.as_str())),
        )
    }
}

/// A raw event as posted by the messaging platform
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PlatformEvent {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    /// Set when the event is a reply inside a thread
    #[serde(default, alias = "threadId", alias = "thread_id")]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub event_ts: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

impl PlatformEvent {
    /// Value of the first attachment field titled `title`
    pub fn field(&self, title: &str) -> Option<&str> {
        self.attachments
            .as_deref()?
            .iter()
            .flat_map(Attachment::field_pairs)
            .find(|(field_title, _)| *field_title == title)
            .map(|(_, value)| value)
    }

    /// Anchor used to reply under this event
    pub fn anchor(&self) -> Option<&str> {
        self.event_ts.as_deref().or(self.ts.as_deref())
    }
}

/// A message already packaged upstream; only needs translating and posting
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RelayMessage {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default, rename = "threadId", alias = "thread_ts", alias = "thread_id")]
    pub thread_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

/// Queue envelope: the source webhook payload plus the text to translate
#[derive(Debug, Clone, Deserialize)]
struct QueueEnvelope {
    #[serde(default)]
    input: Value,
    #[serde(default)]
    comment: Option<String>,
}

impl From<QueueEnvelope> for RelayMessage {
    fn from(envelope: QueueEnvelope) -> Self {
        let event = envelope.input.get("event");
        let string_at = |key: &str| {
            event
                .and_then(|event| event.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        RelayMessage {
            channel: string_at("channel"),
            thread_id: string_at("event_ts").or_else(|| string_at("ts")),
            text: envelope.comment.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Platform(PlatformEvent),
    Relay(RelayMessage),
    /// Endpoint ownership check sent once when the webhook is registered
    UrlVerification { challenge: String },
    /// Neither an event nor a relay message
    Unrecognized,
}

impl InboundEvent {
    /// Decide which shape `payload` has and deserialize it
    pub fn from_value(payload: Value) -> RelayResult<Self> {
        let Some(object) = payload.as_object() else {
            return Ok(InboundEvent::Unrecognized);
        };

        if object.get("type").and_then(Value::as_str) == Some("url_verification") {
            if let Some(challenge) = object.get("challenge").and_then(Value::as_str) {
                return Ok(InboundEvent::UrlVerification {
                    challenge: challenge.to_string(),
                });
            }
        }

        if object.contains_key("input") {
            let envelope: QueueEnvelope = serde_json::from_value(payload)?;
            return Ok(InboundEvent::Relay(envelope.into()));
        }

        if let Some(event) = object.get("event") {
            if event.is_null() {
                return Ok(InboundEvent::Unrecognized);
            }
            return Ok(InboundEvent::Platform(serde_json::from_value(event.clone())?));
        }

        if object.contains_key("type") || object.contains_key("attachments") {
            return Ok(InboundEvent::Platform(serde_json::from_value(payload)?));
        }

        if object.contains_key("text") {
            return Ok(InboundEvent::Relay(serde_json::from_value(payload)?));
        }

        Ok(InboundEvent::Unrecognized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ========== Trigger Tests ==========

    #[test]
    fn test_decode_http_post_body_string() {
        let raw = json!({
            "httpMethod": "POST",
            "body": "{\"event\":{\"type\":\"message\"}}"
        });
        let trigger = Trigger::decode(raw).unwrap();
        assert_eq!(trigger.kind, TriggerKind::Http);
        assert_eq!(trigger.payload, json!({"event": {"type": "message"}}));
    }

    #[test]
    fn test_decode_http_get_query() {
        let raw = json!({
            "httpMethod": "GET",
            "queryStringParameters": {"channel": "C1", "text": "hi"}
        });
        let trigger = Trigger::decode(raw).unwrap();
        assert_eq!(trigger.kind, TriggerKind::Http);
        assert_eq!(trigger.payload, json!({"channel": "C1", "text": "hi"}));
    }

    #[test]
    fn test_decode_http_without_body() {
        let raw = json!({"httpMethod": "POST", "body": null});
        assert!(matches!(
            Trigger::decode(raw),
            Err(RelayError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_decode_http_body_not_json() {
        let raw = json!({"httpMethod": "POST", "body": "channel=C1"});
        assert!(matches!(Trigger::decode(raw), Err(RelayError::Json(_))));
    }

    #[test]
    fn test_decode_queue_record() {
        let raw = json!({
            "Records": [{"Sns": {"Message": "{\"input\":{},\"comment\":\"hi\"}"}}]
        });
        let trigger = Trigger::decode(raw).unwrap();
        assert_eq!(trigger.kind, TriggerKind::Queue);
        assert_eq!(trigger.payload, json!({"input": {}, "comment": "hi"}));
    }

    #[test]
    fn test_decode_direct() {
        let raw = json!({"event": {"type": "message"}});
        let trigger = Trigger::decode(raw.clone()).unwrap();
        assert_eq!(trigger.kind, TriggerKind::Direct);
        assert_eq!(trigger.payload, raw);
    }

    // ========== Event Shape Tests ==========

    #[test]
    fn test_platform_event_from_envelope() {
        let event = InboundEvent::from_value(json!({
            "type": "event_callback",
            "event": {
                "type": "message",
                "channel": "C1",
                "event_ts": "1700000000.000100",
                "text": "hi",
                "attachments": [{"fields": [{"title": "lang", "value": "ja"}]}]
            }
        }))
        .unwrap();
        match event {
            InboundEvent::Platform(event) => {
                assert_eq!(event.kind.as_deref(), Some("message"));
                assert_eq!(event.anchor(), Some("1700000000.000100"));
                assert_eq!(event.field("lang"), Some("ja"));
                assert_eq!(event.thread_ts, None);
            }
            other => panic!("Expected Platform, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_platform_event_accepts_thread_id_alias() {
        let event = InboundEvent::from_value(json!({
            "type": "message",
            "channel": "C1",
            "threadId": "1.2",
        }))
        .unwrap();
        match event {
            InboundEvent::Platform(event) => assert_eq!(event.thread_ts.as_deref(), Some("1.2")),
            other => panic!("Expected Platform, got {:?}", other),
        }
    }

    #[test]
    fn test_relay_message() {
        let event = InboundEvent::from_value(json!({
            "channel": "C1",
            "threadId": "1.2",
            "text": "hello"
        }))
        .unwrap();
        assert_eq!(
            event,
            InboundEvent::Relay(RelayMessage {
                channel: Some("C1".to_string()),
                thread_id: Some("1.2".to_string()),
                text: "hello".to_string(),
            })
        );
    }

    #[test]
    fn test_queue_envelope_becomes_relay_message() {
        let event = InboundEvent::from_value(json!({
            "input": {"event": {"channel": "C9", "event_ts": "5.6"}},
            "comment": "안녕하세요"
        }))
        .unwrap();
        assert_eq!(
            event,
            InboundEvent::Relay(RelayMessage {
                channel: Some("C9".to_string()),
                thread_id: Some("5.6".to_string()),
                text: "안녕하세요".to_string(),
            })
        );
    }

    #[test]
    fn test_url_verification() {
        let event = InboundEvent::from_value(json!({
            "type": "url_verification",
            "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
        }))
        .unwrap();
        assert!(matches!(event, InboundEvent::UrlVerification { .. }));
    }

    #[test]
    fn test_unrecognized_payloads() {
        assert_eq!(
            InboundEvent::from_value(json!({"token": "x"})).unwrap(),
            InboundEvent::Unrecognized
        );
        assert_eq!(
            InboundEvent::from_value(json!({"event": null})).unwrap(),
            InboundEvent::Unrecognized
        );
        assert_eq!(
            InboundEvent::from_value(json!("text")).unwrap(),
            InboundEvent::Unrecognized
        );
    }

    // ========== Attachment Lookup Tests ==========

    #[test]
    fn test_null_field_entries_are_tolerated() {
        let event = InboundEvent::from_value(json!({
            "event": {
                "type": "message",
                "channel": "C1",
                "attachments": [
                    {"fields": [{"title": null, "value": "x"}, {"title": "lang", "value": "ja"}]},
                    {"fields": null}
                ]
            }
        }))
        .unwrap();
        match event {
            InboundEvent::Platform(event) => {
                assert_eq!(event.field("lang"), Some("ja"));
                assert_eq!(event.field("comment"), None);
            }
            other => panic!("Expected Platform, got {:?}", other),
        }
    }

    #[test]
    fn test_relay_message_with_null_text() {
        let event = InboundEvent::from_value(json!({"channel": "C1", "text": null})).unwrap();
        match event {
            InboundEvent::Relay(message) => assert_eq!(message.text, ""),
            other => panic!("Expected Relay, got {:?}", other),
        }
    }

    #[test]
    fn test_field_lookup_first_match_wins() {
        let event = PlatformEvent {
            attachments: Some(vec![
                Attachment {
                    title: Some("lang".to_string()),
                    value: Some("ko".to_string()),
                    fields: vec![],
                },
                Attachment {
                    fields: vec![AttachmentField {
                        title: "lang".to_string(),
                        value: "ja".to_string(),
                    }],
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };
        assert_eq!(event.field("lang"), Some("ko"));
        assert_eq!(event.field("comment"), None);
    }

    #[test]
    fn test_field_lookup_without_attachments() {
        assert_eq!(PlatformEvent::default().field("lang"), None);
    }

    #[test]
    fn test_anchor_falls_back_to_ts() {
        let event = PlatformEvent {
            ts: Some("9.9".to_string()),
            ..Default::default()
        };
        assert_eq!(event.anchor(), Some("9.9"));
    }
}
