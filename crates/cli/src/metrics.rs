//! Prometheus registry for the command line driver.
//!
//! Holds the command counter and everything exported by
//! `marquee_core::metrics`, so a run can dump its counters on exit.

use std::io::Write;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Commands executed, by subcommand and outcome.
pub static COMMANDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_commands_total", "Commands executed"),
        &["command", "outcome"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(COMMANDS_TOTAL.clone()))
        .unwrap();

    for metric in marquee_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Record a finished command.
pub fn record_command(command: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    COMMANDS_TOTAL.with_label_values(&[command, outcome]).inc();
}

/// Record a command's outcome and, if asked, dump the metrics to `out`.
///
/// The dump happens before the command's error is returned, so failed
/// runs still report their counters.
pub fn finish_command(
    command: &str,
    result: Result<()>,
    dump: bool,
    out: &mut impl Write,
) -> Result<()> {
    record_command(command, result.is_ok());

    if dump {
        let text = encode_metrics()?;
        out.write_all(text.as_bytes()).context("Failed to write metrics")?;
    }

    result
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not UTF-8")
}
