//! Subscriber setup and the span-scoped logging macros

use std::{io::IsTerminal, str::FromStr};

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer,
    filter::FilterFn,
    prelude::__tracing_subscriber_SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Emit an event inside a span named after its direction
#[macro_export]
macro_rules! log {
    ($level:expr, $span:expr, $($msg:expr),*) => {{
        let span = $crate::tracing::span!($level, $span);
        let _enter = span.enter();

        $crate::tracing::event!($level, $($msg),*)
    }};
}

/// A request leaving for the remote platform
#[macro_export]
macro_rules! outgoing {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "outgoing", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::outgoing!(level = TRACE, $($msg),*)
    };
}

/// A response arriving from the remote platform
#[macro_export]
macro_rules! incoming {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "incoming", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::incoming!(level = TRACE, $($msg),*)
    };
}

/// Herald's own bookkeeping such as pacing and checkpoints
#[macro_export]
macro_rules! internal {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "internal", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::internal!(level = TRACE, $($msg),*)
    };
}

const LEVEL_ENV: &str = "LOG_LEVEL";

/// Resolve the configured level, keeping `default` for unset or unknown values
fn parse_level(value: Option<&str>, default: LevelFilter) -> LevelFilter {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return default;
    };

    LevelFilter::from_str(value).unwrap_or_else(|_| {
        eprintln!("Invalid {LEVEL_ENV} {value:?}, defaulting to {default}");
        default
    })
}

/// Install the global subscriber
///
/// Events go to stderr so the summaries printed on stdout stay clean. The
/// level comes from `LOG_LEVEL`, falling back to TRACE for debug builds and
/// INFO otherwise. Only `herald*` targets are emitted.
///
/// # Errors
/// If a global subscriber was already installed
pub fn init() -> Result<(), TryInitError> {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };
    let level = parse_level(std::env::var(LEVEL_ENV).ok().as_deref(), default);

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .compact()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("herald")
                })),
        )
        .try_init()
}
