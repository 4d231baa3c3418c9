//! RISKscan assistant CLI.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::info;

use riskscan::adapters::cli::{render_scenario, run_chat};
use riskscan::chat::ChatController;
use riskscan::config::Config;
use riskscan::gateway::gemini::GeminiClient;
use riskscan::gateway::TextGenerator;
use riskscan::logging;
use riskscan::scenario::{
    BranchCountBucket, ImpactProfile, PlatformType, ScenarioGenerator, UserCountBucket,
};

#[derive(Parser)]
#[command(name = "riskscan", version, about = "RISKscan lead-qualification assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the Solut.ia assistant in the terminal.
    Chat,
    /// Generate an AD attack impact scenario for an organization profile.
    Scenario {
        /// Directory users: 1-100, 101-500, 501-1000, 1000+.
        #[arg(long, default_value = "1-100")]
        users: UserCountBucket,
        /// Branch offices: 1, 2-5, 6-10, 10+.
        #[arg(long, default_value = "1")]
        branches: BranchCountBucket,
        /// Platform: Híbrido, Entra ID, Active Directory On-Premise.
        #[arg(long, default_value = "Híbrido")]
        platform: PlatformType,
        /// Print the scenario as JSON instead of cards.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration (API key redacted).
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;

    match cli.command {
        Command::Chat => run_chat_command(&config).await,
        Command::Scenario {
            users,
            branches,
            platform,
            json,
        } => {
            logging::init_cli(&config.logging.level);
            let profile = ImpactProfile {
                users,
                branches,
                platform,
            };
            run_scenario_command(&config, &profile, json).await
        }
        Command::Config => {
            logging::init_cli(&config.logging.level);
            println!("{config:#?}");
            Ok(())
        }
    }
}

fn build_generator(config: &Config) -> Result<Arc<dyn TextGenerator>> {
    let client = GeminiClient::new(
        config.gateway.base_url.clone(),
        config.gateway.model.clone(),
        config.gateway.api_key.clone(),
        config.gateway.timeout(),
    )
    .context("failed to build generation client")?;
    Ok(Arc::new(client))
}

async fn run_chat_command(config: &Config) -> Result<()> {
    let _guard = match &config.logging.logs_dir {
        Some(dir) => Some(logging::init_session(dir, &config.logging.level)?),
        None => {
            logging::init_cli(&config.logging.level);
            None
        }
    };

    let generator = build_generator(config)?;
    info!(model = generator.model_id(), "starting chat session");
    let mut controller = ChatController::new(generator, config.chat.thinking_delay());

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    run_chat(&mut controller, &config.chat.booking_url, stdin, &mut stdout).await
}

async fn run_scenario_command(config: &Config, profile: &ImpactProfile, json: bool) -> Result<()> {
    let generator = build_generator(config)?;
    let mut scenarios = ScenarioGenerator::new(generator);

    let outcome = scenarios.generate(profile).await.map(|s| s.cloned());
    match outcome {
        Ok(Some(scenario)) => {
            if json {
                let rendered = serde_json::to_string_pretty(&scenario)
                    .context("failed to serialize scenario")?;
                println!("{rendered}");
            } else {
                println!("{}", render_scenario(&scenario));
            }
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            let message = scenarios.error().unwrap_or_default().to_owned();
            eprintln!("{message}");
            Err(anyhow::Error::new(err).context("scenario generation failed"))
        }
    }
}
