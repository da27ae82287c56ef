//! The failed-delivery record and the diagnostic envelope built from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single delivery that a consumer callback failed to process.
///
/// This is the reporter's view of the original message: enough to republish it
/// with full context, nothing more. Broker-level properties are captured as an
/// opaque key/value snapshot so the envelope preserves whatever the original
/// message carried without the reporter interpreting any of it.
#[derive(Debug, Clone)]
pub struct FailedDelivery {
    /// Routing key the original message was published with.
    pub routing_key: String,
    /// Exchange the original message arrived through.
    pub exchange: String,
    /// Raw message body.
    pub body: Vec<u8>,
    /// Snapshot of the broker metadata attached to the delivery
    /// (content type, delivery mode, headers, ...).
    pub metadata: BTreeMap<String, String>,
}

impl FailedDelivery {
    /// Creates a delivery record with no broker metadata.
    pub fn new(
        routing_key: impl Into<String>,
        exchange: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            routing_key: routing_key.into(),
            exchange: exchange.into(),
            body: body.into(),
            metadata: BTreeMap::new(),
        }
    }
}

/// The diagnostic record published to the error queue for one failed delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    /// Routing key of the original message.
    pub routing_key: String,
    /// Source exchange of the original message.
    pub exchange: String,
    /// Stringified failure, including every underlying cause.
    pub error: String,
    /// Original body decoded as text. Lossy if the body was not valid UTF-8.
    pub body: String,
    /// Wall-clock time the failure was captured.
    pub captured_at: DateTime<Utc>,
    /// Broker metadata snapshot taken from the original delivery.
    pub metadata: BTreeMap<String, String>,
}

impl ErrorEnvelope {
    /// Builds an envelope from a failed delivery and the error its handler raised.
    pub fn capture(delivery: &FailedDelivery, error: &(dyn std::error::Error + Send + Sync)) -> Self {
        Self {
            routing_key: delivery.routing_key.clone(),
            exchange: delivery.exchange.clone(),
            error: render_error_chain(error),
            body: String::from_utf8_lossy(&delivery.body).into_owned(),
            captured_at: Utc::now(),
            metadata: delivery.metadata.clone(),
        }
    }
}

/// Renders an error and its full `source()` chain as a single text block,
/// one cause per line.
pub fn render_error_chain(error: &(dyn std::error::Error + Send + Sync)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str("\ncaused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct ChainedError {
        message: &'static str,
        cause: Option<Box<ChainedError>>,
    }

    impl fmt::Display for ChainedError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl std::error::Error for ChainedError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.cause.as_deref().map(|c| c as &(dyn std::error::Error + 'static))
        }
    }

    #[test]
    fn capture_preserves_delivery_fields() {
        let mut delivery = FailedDelivery::new("orders.created", "orders", "{\"id\":1}");
        delivery.metadata.insert("content_type".to_string(), "application/json".to_string());

        let error = ChainedError { message: "bad json", cause: None };
        let envelope = ErrorEnvelope::capture(&delivery, &error);

        assert_eq!(envelope.routing_key, "orders.created");
        assert_eq!(envelope.exchange, "orders");
        assert_eq!(envelope.body, "{\"id\":1}");
        assert_eq!(envelope.error, "bad json");
        assert_eq!(envelope.metadata.get("content_type").unwrap(), "application/json");
    }

    #[test]
    fn error_chain_includes_every_cause() {
        let error = ChainedError {
            message: "handler failed",
            cause: Some(Box::new(ChainedError {
                message: "bad json",
                cause: Some(Box::new(ChainedError { message: "unexpected token", cause: None })),
            })),
        };

        let rendered = render_error_chain(&error);
        assert_eq!(rendered, "handler failed\ncaused by: bad json\ncaused by: unexpected token");
    }

    #[test]
    fn non_utf8_body_decodes_lossily() {
        let delivery = FailedDelivery::new("k", "x", vec![0xff, 0xfe, b'o', b'k']);
        let error = ChainedError { message: "boom", cause: None };

        let envelope = ErrorEnvelope::capture(&delivery, &error);
        assert!(envelope.body.ends_with("ok"));
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let delivery = FailedDelivery::new("orders.created", "orders", "{\"id\":1}");
        let error = ChainedError { message: "bad json", cause: None };
        let envelope = ErrorEnvelope::capture(&delivery, &error);

        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: ErrorEnvelope = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(decoded, envelope);
        assert_eq!(decoded.routing_key, "orders.created");
        assert_eq!(decoded.exchange, "orders");
        assert_eq!(decoded.body, "{\"id\":1}");
        assert_eq!(decoded.error, "bad json");
        assert!(decoded.captured_at <= Utc::now());
    }
}
