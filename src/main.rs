//! composedeck CLI entry point

use clap::{Parser, Subcommand};
use composedeck::api::{ApiHandler, Server};
use composedeck::auth::Authenticator;
use composedeck::compose::{ComposeCommand, ComposeParser, Executor, Scanner, StatusCollector};
use composedeck::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// composedeck - docker-compose project dashboard backend
#[derive(Parser)]
#[command(name = "composedeck")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Discover and drive docker-compose projects on this host", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Listen port (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scan the configured roots and list discovered compose files
    Scan,

    /// Parse one compose file and print its normalized services
    Inspect {
        /// Path to a compose file
        file: PathBuf,
    },

    /// Run a lifecycle command against one compose file
    Exec {
        /// Path to a compose file
        file: PathBuf,
        /// One of: up, down, build, ps, logs
        command: String,
    },

    /// Show container status for one compose file
    Status {
        /// Path to a compose file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            config.validate_for_serve()?;

            tracing::info!(
                "Scanning directories: {}",
                config
                    .scan_directories
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            let auth = Authenticator::new(
                &config.admin_username,
                &config.admin_password,
                &config.jwt_secret,
            )?;
            let handler = ApiHandler::new(&config, auth);
            Server::new(handler, config.port).run().await?;
        }

        Commands::Scan => {
            let scanner = Scanner::new(config.scan_directories.clone())
                .with_excludes(config.scan_excludes.clone())
                .with_max_depth(config.scan_max_depth);
            let files = scanner.scan();
            println!("{}", serde_json::to_string_pretty(&files)?);
        }

        Commands::Inspect { file } => {
            let details = ComposeParser::parse_file(&file)?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }

        Commands::Exec { file, command } => {
            let command: ComposeCommand = command.parse()?;
            let executor = Executor::new(config.compose_legacy, config.use_sudo);
            let result = executor.run(&file, command).await?;
            print!("{}", result.stdout);
            eprint!("{}", result.stderr);
            if !result.success {
                std::process::exit(result.exit_code.unwrap_or(1));
            }
        }

        Commands::Status { file } => {
            let executor = Executor::new(config.compose_legacy, config.use_sudo);
            let summary = StatusCollector::new(executor).collect(&file).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
