use clap::{Parser, Subcommand};
use signage_admin::config::AppConfig;
use signage_admin::feedback::LogReporter;
use signage_admin::store::HttpApiClient;
use signage_admin::{edit_group, edit_screen, parse_assignment};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "signage-admin", about = "Edit and save signage screens and screen groups")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Edit a screen and save it with its groups and playlists
    Screen {
        id: String,
        /// Field edit as path=value, e.g. dimensions.width=1920
        #[arg(long = "set", value_name = "PATH=VALUE")]
        set: Vec<String>,
    },
    /// Edit a screen group's attributes
    Group {
        id: String,
        #[arg(long = "set", value_name = "PATH=VALUE")]
        set: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    use env_logger::{Builder, Env};
    use log::LevelFilter;

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("hyper", LevelFilter::Warn)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load()?;
    log::debug!("Using signage API at {}", config.api.base_url);

    let api = Arc::new(HttpApiClient::from_config(&config.api)?);
    let reporter = Arc::new(LogReporter);

    let succeeded = match cli.command {
        Command::Screen { id, set } => {
            let edits = set
                .iter()
                .map(|text| parse_assignment(text))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let policy = config.save.reference_policy;
            let report = edit_screen(api, reporter, policy, &id, &edits).await?;
            for error in &report.errors {
                log::warn!("{}", error);
            }
            report.is_success()
        }
        Command::Group { id, set } => {
            let edits = set
                .iter()
                .map(|text| parse_assignment(text))
                .collect::<anyhow::Result<Vec<_>>>()?;
            match edit_group(api, reporter, &id, &edits).await {
                Ok(_) => true,
                Err(err) => {
                    log::warn!("{:#}", err);
                    false
                }
            }
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
