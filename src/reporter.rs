//! The error reporter: lazy connection, declare-once topology, absorbed faults.

use crate::diagnostics::DiagnosticSink;
use crate::envelope::{ErrorEnvelope, FailedDelivery};
use crate::error::ReportError;
use crate::serialize::EnvelopeSerializer;
use crate::transport::{BrokerConnection, BrokerSession, ConnectionFactory};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Well-known name of the durable queue that collects failed deliveries.
pub const ERROR_QUEUE_NAME: &str = "message_errors";

/// Well-known name of the direct exchange bound to the error queue.
pub const ERROR_EXCHANGE_NAME: &str = "message_errors_exchange";

/// Routing key used for the error binding and for every error publish.
pub const ERROR_ROUTING_KEY: &str = "";

/// Redirects failed deliveries to the error queue.
///
/// One instance serves a whole consumption pipeline and may be called from any
/// number of tasks at once. The broker connection is created on the first
/// failure and replaced when it reports closed; the destination topology is
/// declared at most once per instance, with concurrent callers waiting on the
/// first declaration instead of racing it.
///
/// Reconnection never repeats the declarations: once the queue or the binding
/// has been declared successfully, a later reconnect assumes the broker-side
/// state still exists. If the error queue or exchange is deleted externally
/// while the process is running, subsequent publishes fail and surface only as
/// diagnostics.
///
/// No fault in the reporting path ever reaches the caller. Everything is
/// classified, written to the diagnostic sink, and swallowed, so a broken
/// error path can never stop the primary pipeline.
pub struct ErrorReporter<F, S, D>
where
    F: ConnectionFactory,
    S: EnvelopeSerializer,
    D: DiagnosticSink,
{
    factory: F,
    serializer: S,
    sink: D,
    connection: Mutex<Option<Arc<F::Connection>>>,
    queue_declared: OnceCell<()>,
    binding_declared: OnceCell<()>,
    disposed: AtomicBool,
}

impl<F, S, D> ErrorReporter<F, S, D>
where
    F: ConnectionFactory,
    S: EnvelopeSerializer,
    D: DiagnosticSink,
{
    /// Creates a reporter. No connection is opened until the first failure.
    pub fn new(factory: F, serializer: S, sink: D) -> Self {
        Self {
            factory,
            serializer,
            sink,
            connection: Mutex::new(None),
            queue_declared: OnceCell::new(),
            binding_declared: OnceCell::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Captures a failed delivery and publishes it to the error queue.
    ///
    /// Safe to call concurrently. Never returns an error and never panics on
    /// broker trouble: every fault in the reporting path is converted into a
    /// diagnostic log entry so the calling pipeline keeps consuming.
    pub async fn handle_failure(
        &self,
        delivery: &FailedDelivery,
        error: &(dyn std::error::Error + Send + Sync),
    ) {
        if self.disposed.load(Ordering::SeqCst) {
            self.sink.record_error(&format!(
                "error reporter is disposed; dropping failure report for routing key '{}'",
                delivery.routing_key
            ));
            return;
        }

        if let Err(fault) = self.try_report(delivery, error).await {
            self.diagnose(&fault);
        }
    }

    /// Releases the held connection, if any. Idempotent; later calls are
    /// no-ops, and calling it on a reporter that never saw a failure is safe.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let connection = self.connection.lock().await.take();
        if let Some(connection) = connection {
            if let Err(fault) = connection.close().await {
                self.diagnose(&fault);
            }
        }
    }

    async fn try_report(
        &self,
        delivery: &FailedDelivery,
        error: &(dyn std::error::Error + Send + Sync),
    ) -> Result<(), ReportError> {
        let connection = self.ensure_connection().await?;

        // One session per call; publishing is not assumed to be safe to share
        // across tasks on a single session.
        let session = connection.open_session().await?;
        let outcome = self.declare_and_publish(&session, delivery, error).await;
        let _ = session.close().await;
        outcome
    }

    /// Returns the held connection, replacing it when absent or closed.
    ///
    /// The slot lock makes the failure-handling path the single writer of the
    /// connection; it is released before any declare or publish happens.
    async fn ensure_connection(&self) -> Result<Arc<F::Connection>, ReportError> {
        let mut slot = self.connection.lock().await;

        if let Some(connection) = slot.as_ref() {
            if connection.is_open() {
                return Ok(Arc::clone(connection));
            }
        }

        let fresh = Arc::new(self.factory.create_connection().await?);
        *slot = Some(Arc::clone(&fresh));
        Ok(fresh)
    }

    async fn declare_and_publish(
        &self,
        session: &<F::Connection as BrokerConnection>::Session,
        delivery: &FailedDelivery,
        error: &(dyn std::error::Error + Send + Sync),
    ) -> Result<(), ReportError> {
        // Each cell initializes at most once; a failed attempt leaves it
        // unset, so a later call completes the missing half without touching
        // the half that already succeeded.
        self.queue_declared
            .get_or_try_init(|| session.declare_queue(ERROR_QUEUE_NAME))
            .await?;

        self.binding_declared
            .get_or_try_init(|| async {
                session.declare_exchange(ERROR_EXCHANGE_NAME).await?;
                session
                    .bind_queue(ERROR_QUEUE_NAME, ERROR_EXCHANGE_NAME, ERROR_ROUTING_KEY)
                    .await
            })
            .await?;

        let envelope = ErrorEnvelope::capture(delivery, error);
        let payload = self.serializer.serialize(&envelope)?;

        session
            .publish(ERROR_EXCHANGE_NAME, ERROR_ROUTING_KEY, &payload)
            .await
    }

    /// Converts an absorbed fault into one diagnostic sink entry.
    fn diagnose(&self, fault: &ReportError) {
        const GUIDANCE: &str =
            "check that the broker is running, reachable, and accepting the configured credentials";

        let message = match fault {
            ReportError::BrokerUnreachable(detail) => format!(
                "failed to report a processing error: broker unreachable at host '{}', vhost '{}', as '{}': {}; {}",
                self.factory.host(),
                self.factory.virtual_host(),
                self.factory.principal(),
                detail,
                GUIDANCE
            ),
            ReportError::Interrupted(reason) => format!(
                "failed to report a processing error: broker connection interrupted: {}; {}",
                reason, GUIDANCE
            ),
            other => format!("failed to report a processing error: {}", other),
        };

        self.sink.record_error(&message);
    }
}
