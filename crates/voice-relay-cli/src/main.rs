use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use voice_relay_core::config::{Config, LoggingConfig};
use voice_relay_gateway::AppState;

#[derive(Parser)]
#[command(
    name = "voice-relay",
    about = "Voice chat relay: speech-to-text, text generation and text-to-speech behind one HTTP endpoint",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to listen on (default: 8000)
        #[arg(long)]
        port: Option<u16>,

        /// Do not serve the browser UI
        #[arg(long)]
        no_ui: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show system status
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get a specific config value
    Get { key: String },
    /// Check the configuration for problems
    Validate,
}

/// Filter directives used when `RUST_LOG` is not set.
fn filter_directives(logging: Option<&LoggingConfig>, verbose: bool) -> String {
    let level = if verbose {
        "debug".to_string()
    } else {
        logging
            .and_then(|l| l.level.clone())
            .unwrap_or_else(|| "info".to_string())
    };

    let mut directives = vec![level];
    if let Some(logging) = logging {
        directives.extend(logging.filters.iter().cloned());
    }
    directives.join(",")
}

fn init_logging(logging: Option<&LoggingConfig>, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(logging, verbose)));

    let to_stdout = logging.is_some_and(|l| l.output == "stdout");
    let writer = || {
        if to_stdout {
            BoxMakeWriter::new(std::io::stdout)
        } else {
            BoxMakeWriter::new(std::io::stderr)
        }
    };

    let fmt_layer = if logging.is_some_and(|l| l.format == "json") {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer())
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(writer()).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Provider keys usually live in a local .env file.
    dotenvy::dotenv().ok();

    // Load config
    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(Config::config_path);

    let config = Config::load(&config_path)?;

    init_logging(config.logging.as_ref(), cli.verbose);

    match cli.command {
        Commands::Serve { port, no_ui } => {
            let port = port.unwrap_or_else(|| config.gateway_port());
            let (warnings, errors) = config.validate();
            for w in &warnings {
                tracing::warn!("{w}");
            }
            if !errors.is_empty() {
                anyhow::bail!("invalid configuration: {}", errors.join("; "));
            }

            #[allow(unused_mut)]
            let mut state = AppState::from_config(Arc::new(config))?;

            #[cfg(feature = "metrics")]
            {
                state.metrics = Some(voice_relay_gateway::metrics::install_prometheus_recorder()?);
                tracing::info!("Prometheus metrics enabled at /metrics");
            }

            tracing::info!(
                port,
                ui = !no_ui,
                uploads = %state.uploads_dir.display(),
                "Starting voice relay gateway"
            );
            voice_relay_gateway::start_gateway(Arc::new(state), port, !no_ui).await?;
        }
        Commands::Status => {
            let yes_no = |key: Option<String>| if key.is_some() { "configured" } else { "missing" };
            println!("Voice Relay v{}", env!("CARGO_PKG_VERSION"));
            println!("Config: {}", config_path.display());
            println!("Gateway: {}:{}", config.gateway_bind(), config.gateway_port());
            println!("Uploads: {}", config.uploads_dir().display());
            println!(
                "AssemblyAI key: {}",
                yes_no(config.transcription().resolve_api_key())
            );
            println!(
                "Gemini key: {} (model {})",
                yes_no(config.generation().resolve_api_key()),
                config.generation().model()
            );
            println!(
                "Murf key: {} (voice {})",
                yes_no(config.tts().resolve_api_key()),
                config.tts().voice_id()
            );
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(&config)?;
                println!("{json}");
            }
            ConfigAction::Get { key } => match config.get_path(&key) {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => anyhow::bail!("config key '{key}' is not set"),
            },
            ConfigAction::Validate => {
                let (warnings, errors) = config.validate();
                for w in &warnings {
                    println!("warning: {w}");
                }
                for e in &errors {
                    println!("error: {e}");
                }
                if !errors.is_empty() {
                    anyhow::bail!("{} configuration error(s)", errors.len());
                }
                println!("Configuration OK");
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_to_info() {
        assert_eq!(filter_directives(None, false), "info");
        assert_eq!(filter_directives(None, true), "debug");
    }

    #[test]
    fn test_filter_uses_config_level_and_filters() {
        let logging = LoggingConfig {
            level: Some("warn".into()),
            filters: vec!["voice_relay_agent=debug".into(), "tower_http=info".into()],
            ..LoggingConfig::default()
        };
        assert_eq!(
            filter_directives(Some(&logging), false),
            "warn,voice_relay_agent=debug,tower_http=info"
        );
        // --verbose overrides the configured level but keeps per-crate filters.
        assert!(filter_directives(Some(&logging), true).starts_with("debug,"));
    }

    #[test]
    fn test_cli_parses_serve_flags() {
        let cli = Cli::parse_from(["voice-relay", "serve", "--port", "9000", "--no-ui"]);
        match cli.command {
            Commands::Serve { port, no_ui } => {
                assert_eq!(port, Some(9000));
                assert!(no_ui);
            }
            _ => panic!("expected serve"),
        }
    }
}
