//! Prometheus metrics recording and endpoint.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use voice_relay_core::types::Stage;

/// Install the Prometheus metrics recorder and return the handle for rendering.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Record one chat run: outcome counter, fallback stage, and duration.
pub fn record_chat(failure_stage: Option<Stage>, duration_secs: f64) {
    let outcome = if failure_stage.is_some() { "fallback" } else { "success" };
    let labels = [("outcome", outcome.to_string())];
    metrics::counter!("chat_runs_total", &labels).increment(1);
    metrics::histogram!("chat_run_duration_seconds", &labels).record(duration_secs);

    if let Some(stage) = failure_stage {
        let labels = [("stage", stage.as_str().to_string())];
        metrics::counter!("chat_fallbacks_total", &labels).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_chat_does_not_panic() {
        // No recorder installed: the metrics crate falls back to a no-op.
        record_chat(None, 0.42);
        record_chat(Some(Stage::Tts), 1.5);
    }
}
