//! # RabbitMQ Error Reporter
//! Dead-letter redirection for message consumers: when a handler fails, capture the
//! delivery and its error, and durably republish both to a dedicated error queue
//! without ever propagating broker trouble back into the consuming pipeline.

pub mod amqp;
pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod reporter;
pub mod serialize;
pub mod transport;

// Re-export key components for easy access
pub use amqp::{AmqpConnection, AmqpConnectionFactory, AmqpSession};
pub use diagnostics::{DiagnosticSink, LogDiagnosticSink};
pub use envelope::{ErrorEnvelope, FailedDelivery};
pub use error::ReportError;
pub use reporter::{ErrorReporter, ERROR_EXCHANGE_NAME, ERROR_QUEUE_NAME, ERROR_ROUTING_KEY};
pub use serialize::{EnvelopeSerializer, JsonEnvelopeSerializer};
pub use transport::{BrokerConnection, BrokerSession, ConnectionFactory};
