use clap::Parser;
use sambahayan::cli::{Cli, Commands};
use sambahayan::types::config::Config;
use sambahayan::SuggestResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> SuggestResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config).unwrap_or_default()
    } else {
        Config::default()
    };

    // CLI flags take precedence over the configured log level
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("sambahayan={}", log_level)
            .parse()
            .unwrap_or_else(|_| {
                "sambahayan=info"
                    .parse()
                    .expect("fallback directive is valid")
            }),
    );

    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    tracing::debug!("configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            sambahayan::cli::commands::init(path).await?;
        }
        Commands::Serve { port } => {
            sambahayan::cli::commands::serve(port, &config).await?;
        }
        Commands::Stats => {
            sambahayan::cli::commands::stats(&config).await?;
        }
        Commands::Version => {
            sambahayan::cli::commands::version();
        }
    }

    Ok(())
}
