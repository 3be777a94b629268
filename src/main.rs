use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bassline::config::{BasslineConfig, LogFormat, LoggingConfig};
use bassline::debug_logs::LogCollector;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bassline",
    about = "Use VNC to discretely gain access to another computer",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (defaults to $BASSLINE_CONFIG, then /etc/bassline/bassline.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Bind address (overrides server.listen_address)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Collect the debug log bundle via the privileged helper
    DebugLogs {
        /// Write the bundle to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Load the config under a temporary stderr subscriber so rejected
/// config sources are reported before the configured one exists.
fn load_config(path: Option<&Path>) -> Result<BasslineConfig> {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(bootstrap, || match path {
        Some(path) => BasslineConfig::load(path),
        None => Ok(BasslineConfig::load_or_default()),
    })
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = env_filter(&logging.level);
    // stdout is reserved for the debug log bundle.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.listen_address.clone());
            tracing::info!(%bind, "Starting Bassline");
            bassline::serve(&bind, &config).await?;
        }
        Commands::DebugLogs { output } => {
            let collector = LogCollector::from_config(&config.debug_logs);
            let bundle = tokio::task::spawn_blocking(move || collector.collect()).await??;

            match output {
                Some(path) => {
                    std::fs::write(&path, bundle.as_bytes())
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), bytes = bundle.len(), "Debug logs written");
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(bundle.as_bytes())?;
                    stdout.flush()?;
                }
            }
        }
    }

    Ok(())
}
