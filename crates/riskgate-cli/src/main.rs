// CLI for evaluating contexts and inspecting policies and configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod inputs;

#[derive(Parser)]
#[command(name = "riskgate")]
#[command(about = "riskgate - risk aggregation and authentication decisions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide on an authentication context
    Evaluate {
        /// Auth context JSON file
        #[arg(short = 'x', long)]
        context: PathBuf,

        /// Risk configuration TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Policy drafts JSON file (array)
        #[arg(short, long)]
        policies: Option<PathBuf>,

        /// Canned enrichment responses JSON file (array)
        #[arg(short, long)]
        enrichment: Option<PathBuf>,

        /// Overall deadline in milliseconds
        #[arg(short, long)]
        deadline_ms: Option<u64>,
    },

    /// Show which policy applies to a region and framework
    Resolve {
        /// Region code (EU, US, BR, ...)
        #[arg(short, long)]
        region: String,

        /// Framework code (GDPR, HIPAA, ...)
        #[arg(short, long)]
        framework: String,

        /// Industry (finance, healthcare, ...)
        #[arg(short, long)]
        industry: Option<String>,

        /// Policy drafts JSON file (array)
        #[arg(short, long)]
        policies: PathBuf,
    },

    /// Configuration tools
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigSubcommand,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Evaluate {
            context,
            config,
            policies,
            enrichment,
            deadline_ms,
        } => {
            commands::evaluate::run(commands::evaluate::EvaluateArgs {
                context,
                config,
                policies,
                enrichment,
                deadline_ms,
            })
            .await
        }
        Commands::Resolve {
            region,
            framework,
            industry,
            policies,
        } => commands::resolve::run(&region, &framework, industry.as_deref(), &policies),
        Commands::Config { command } => commands::config::handle_config_command(&command),
    }
}
