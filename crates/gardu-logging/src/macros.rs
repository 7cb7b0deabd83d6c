//! ---
//! gardu_section: "03-logging"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Structured logging context and operator event helpers."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
/// Emit an informational log enriched with gardu context.
#[macro_export]
macro_rules! gardu_info {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::INFO,
            gardu = ctx.gardu.unwrap_or(""),
            penyulang = ctx.penyulang.unwrap_or(""),
            operation = ctx.operation.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::gardu_info!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit a debug log enriched with gardu context.
#[macro_export]
macro_rules! gardu_debug {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::DEBUG,
            gardu = ctx.gardu.unwrap_or(""),
            penyulang = ctx.penyulang.unwrap_or(""),
            operation = ctx.operation.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::gardu_debug!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit a warning log enriched with gardu context.
#[macro_export]
macro_rules! gardu_warn {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::WARN,
            gardu = ctx.gardu.unwrap_or(""),
            penyulang = ctx.penyulang.unwrap_or(""),
            operation = ctx.operation.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::gardu_warn!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit an error log enriched with gardu context.
#[macro_export]
macro_rules! gardu_error {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::ERROR,
            gardu = ctx.gardu.unwrap_or(""),
            penyulang = ctx.penyulang.unwrap_or(""),
            operation = ctx.operation.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::gardu_error!(context = $crate::LogContext::default(), $($arg)+)
    }};
}
