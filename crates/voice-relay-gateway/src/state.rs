//! Gateway shared state.

use std::path::PathBuf;
use std::sync::Arc;

use voice_relay_agent::VoicePipeline;
use voice_relay_core::config::Config;
use voice_relay_core::session::SessionStore;
use voice_relay_core::session_store::InMemorySessionStore;

/// Shared state accessible from all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<VoicePipeline>,
    pub uploads_dir: PathBuf,
    #[cfg(feature = "metrics")]
    pub metrics: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Arc<Config>, pipeline: Arc<VoicePipeline>) -> Self {
        let uploads_dir = config.uploads_dir();
        Self {
            config,
            pipeline,
            uploads_dir,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Build the session store and provider clients described by `config`.
    pub fn from_config(config: Arc<Config>) -> anyhow::Result<Self> {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(
            Some(config.session_ttl()),
            Some(config.max_sessions()),
        ));
        let pipeline = Arc::new(VoicePipeline::from_config(&config, sessions)?);
        Ok(Self::new(config, pipeline))
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        self.pipeline.sessions()
    }
}
