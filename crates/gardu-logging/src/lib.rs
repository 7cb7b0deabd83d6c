//! ---
//! gardu_section: "03-logging"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Structured logging context and operator event helpers."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Structured logging helpers shared by the dashboard binaries.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Install a console-only subscriber on stderr, used when file logging is disabled.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Identity key of the gardu the event concerns.
    pub gardu: Option<&'a str>,
    /// Feeder (penyulang) the gardu belongs to.
    pub penyulang: Option<&'a str>,
    /// Operator-facing operation (`update`, `create`, `load`, ...).
    pub operation: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a gardu identity key.
    pub fn with_gardu(mut self, gardu: &'a str) -> Self {
        self.gardu = Some(gardu);
        self
    }

    /// Attach a feeder name.
    pub fn with_penyulang(mut self, penyulang: &'a str) -> Self {
        self.penyulang = Some(penyulang);
        self
    }

    /// Attach an operation name.
    pub fn with_operation(mut self, operation: &'a str) -> Self {
        self.operation = Some(operation);
        self
    }
}

/// Outcome of an operator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The action completed.
    Success,
    /// The action completed but a best-effort step was skipped.
    Degraded,
    /// The action failed or was rejected.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Degraded => "degraded",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized operator event with its outcome.
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    macro_rules! emit {
        ($level:expr) => {
            tracing::event!(
                $level,
                event,
                outcome = outcome.as_str(),
                gardu = ctx.gardu.unwrap_or(""),
                penyulang = ctx.penyulang.unwrap_or(""),
                operation = ctx.operation.unwrap_or(""),
                message = %message
            )
        };
    }
    match outcome {
        SystemEventOutcome::Success => emit!(Level::INFO),
        SystemEventOutcome::Degraded => emit!(Level::WARN),
        SystemEventOutcome::Fault => emit!(Level::ERROR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_emit_without_panic() {
        init();
        let ctx = LogContext::new()
            .with_gardu("BL-001")
            .with_penyulang("KARANGLO");
        gardu_info!(context = ctx.clone(), "record refreshed");
        gardu_debug!("debug message");
        gardu_warn!(context = ctx.clone(), "history delivery skipped");
        gardu_error!(context = ctx, "update rejected with status {}", 502);
    }

    #[test]
    fn system_event_helper_emits() {
        init();
        let ctx = LogContext::new()
            .with_gardu("BL-001")
            .with_operation("update");
        log_system_event(
            Some(&ctx),
            "gardu.update",
            "record updated",
            SystemEventOutcome::Success,
        );
        log_system_event(
            Some(&ctx),
            "gardu.update",
            "history not recorded",
            SystemEventOutcome::Degraded,
        );
        log_system_event(
            None,
            "gardu.create",
            "append failed",
            SystemEventOutcome::Fault,
        );
    }
}
