//! Diagnostic output for faults absorbed by the reporter.

/// Receives the diagnostic text produced when the error-reporting path itself
/// fails. Fire-and-forget: implementations must not fail or block.
pub trait DiagnosticSink: Send + Sync {
    fn record_error(&self, message: &str);
}

/// Default sink that writes diagnostics through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnosticSink;

impl DiagnosticSink for LogDiagnosticSink {
    fn record_error(&self, message: &str) {
        log::error!("{}", message);
    }
}
