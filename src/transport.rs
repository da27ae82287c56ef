//! Collaborator seams between the reporter and the broker client.
//!
//! The reporter never touches the broker library directly; it works against
//! these traits so every connectivity fault arrives already classified as a
//! [`ReportError`](crate::ReportError) and so tests can inject faults at any
//! step of the handling path.

use crate::error::ReportError;
use async_trait::async_trait;

/// Creates broker connections for the error-reporting path.
///
/// The identity accessors describe where the factory connects; they are used
/// only to build diagnostic text when the broker is unreachable.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// The connection type this factory produces.
    type Connection: BrokerConnection;

    /// Opens a new connection to the broker.
    ///
    /// Fails with [`ReportError::BrokerUnreachable`] when the broker cannot
    /// be reached.
    async fn create_connection(&self) -> Result<Self::Connection, ReportError>;

    /// Host name the factory connects to.
    fn host(&self) -> &str;

    /// Virtual host the factory connects to.
    fn virtual_host(&self) -> &str;

    /// Principal (user name) the factory authenticates as.
    fn principal(&self) -> &str;
}

/// A live broker connection owned by the reporter.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    /// The per-call session type opened on this connection.
    type Session: BrokerSession;

    /// Whether the connection is still usable. A closed connection is
    /// replaced on the next handling call rather than repaired.
    fn is_open(&self) -> bool;

    /// Opens a fresh session for a single handling call. Sessions are not
    /// shared across tasks.
    async fn open_session(&self) -> Result<Self::Session, ReportError>;

    /// Closes the connection. Called once, at dispose time.
    async fn close(&self) -> Result<(), ReportError>;
}

/// One channel-equivalent session, scoped to a single handling call.
#[async_trait]
pub trait BrokerSession: Send + Sync {
    /// Declares the destination queue: durable, non-exclusive, non-auto-deleting.
    async fn declare_queue(&self, queue: &str) -> Result<(), ReportError>;

    /// Declares the destination exchange: direct routing, durable.
    async fn declare_exchange(&self, exchange: &str) -> Result<(), ReportError>;

    /// Binds the queue to the exchange with the given routing key.
    async fn bind_queue(&self, queue: &str, exchange: &str, routing_key: &str)
        -> Result<(), ReportError>;

    /// Publishes a persistent message to the exchange.
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8])
        -> Result<(), ReportError>;

    /// Releases the session. Invoked on every exit path of a handling call.
    async fn close(&self) -> Result<(), ReportError>;
}
