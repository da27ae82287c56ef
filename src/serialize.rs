//! Envelope serialization.

use crate::envelope::ErrorEnvelope;
use crate::error::ReportError;

/// Encodes an [`ErrorEnvelope`] into the bytes published to the error queue.
///
/// Implementations must be deterministic and side-effect free; a failure here
/// is treated as an unexpected fault by the reporter.
pub trait EnvelopeSerializer: Send + Sync {
    fn serialize(&self, envelope: &ErrorEnvelope) -> Result<Vec<u8>, ReportError>;
}

/// JSON wire format for the error envelope.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEnvelopeSerializer;

impl EnvelopeSerializer for JsonEnvelopeSerializer {
    fn serialize(&self, envelope: &ErrorEnvelope) -> Result<Vec<u8>, ReportError> {
        Ok(serde_json::to_vec(envelope)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::FailedDelivery;
    use std::io;

    #[test]
    fn serialized_envelope_contains_wire_fields() {
        let delivery = FailedDelivery::new("orders.created", "orders", "{\"id\":1}");
        let error = io::Error::new(io::ErrorKind::InvalidData, "bad json");
        let envelope = ErrorEnvelope::capture(&delivery, &error);

        let bytes = JsonEnvelopeSerializer.serialize(&envelope).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("\"routing_key\":\"orders.created\""));
        assert!(text.contains("\"exchange\":\"orders\""));
        assert!(text.contains("bad json"));
        assert!(text.contains("captured_at"));
    }
}
