//! Library-scoped log formatting for `ai-llm-service`.
//!
//! The binary composes [`layer`] into its global subscriber so that provider
//! calls render with the same compact format as the rest of the service.

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Crate target prefix used to filter only library-originated logs.
pub const TARGET_PREFIX: &str = "ai_llm_service";

/// RFC3339 UTC timer, e.g. `2025-09-12T10:20:30Z`.
#[derive(Clone, Debug, Default)]
pub struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// Formatting layer that renders only events emitted by this crate.
///
/// Single-line output with `file:line`, span close durations for
/// `#[instrument]`ed provider calls, and ANSI colors only on a terminal.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let only_this_crate = filter::filter_fn(|meta| meta.target().starts_with(TARGET_PREFIX));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(io::stdout().is_terminal())
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_this_crate)
}

/// Directive like `ai_llm_service=debug`.
pub fn level_directive(level: Level) -> Directive {
    format!("{TARGET_PREFIX}={}", level.as_str().to_lowercase())
        .parse()
        .unwrap_or_else(|_| Directive::from(LevelFilter::from_level(level)))
}

/// `EnvFilter` from `RUST_LOG` (or `default`) with a per-crate level for this library.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    base.add_directive(level_directive(level))
}
