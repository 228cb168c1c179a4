use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod dispatch;
mod prompt;

#[derive(Parser)]
#[command(name = "henchman")]
#[command(about = "Run a task plan concurrently across a fleet of hosts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a plan against every host in it
    Run {
        /// Path to the plan file
        plan: PathBuf,

        /// User to run as
        #[arg(short, long)]
        user: Option<String>,

        /// Use password authentication (prompts for the password)
        #[arg(long)]
        password: bool,

        /// Use key authentication even if the config file asks for a password
        #[arg(long, conflicts_with = "password")]
        no_password: bool,

        /// Path to the private key file
        #[arg(long)]
        private_keyfile: Option<PathBuf>,

        /// SSH port for hosts that don't name one
        #[arg(short, long)]
        port: Option<u16>,

        /// Extra plan variables, e.g. "a=x b=y"
        #[arg(long, default_value = "")]
        args: String,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or initialize the config file
    Config {
        /// Print the config file path only
        #[arg(long)]
        path: bool,

        /// Write a sample config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            plan,
            user,
            password,
            no_password,
            private_keyfile,
            port,
            args,
            json,
        } => {
            let config = henchman_core::Config::load_default()?;
            let opts = commands::run::RunOptions {
                plan,
                user,
                password,
                no_password,
                private_keyfile,
                port,
                extra_args: args,
                json,
            };
            let any_failed = commands::run::run(&config, opts).await?;
            if any_failed {
                std::process::exit(2);
            }
        }
        Commands::Config { path, init } => {
            commands::config::run(path, init)?;
        }
    }

    Ok(())
}
