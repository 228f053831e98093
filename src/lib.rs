use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

pub mod commands;
pub mod error;
pub mod gate;
pub mod policy;
pub mod util;
pub mod validator;

pub use gate::{review, ScriptReport, Verdict};
pub use policy::{PolicyConfiguration, PolicyFile};
pub use validator::{validate, validate_messages, ValidationIssue};

use commands::logs::SessionLogger;
use commands::validate::Outcome;

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "Checks Roblox scripts against the NEXUS upload policy")]
#[command(version)]
struct Cli {
    /// Don't write a session log under the NEXUS home directory.
    #[arg(long, global = true, default_value_t = false)]
    no_log: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Review script files (`-` reads stdin). Exits 1 if any is rejected.
    Validate {
        #[arg(long)]
        policy: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Only print rejected scripts and errors.
        #[arg(long, default_value_t = false)]
        quiet: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },
}

#[derive(Subcommand)]
enum PolicyCommand {
    /// Print the effective policy as JSON.
    Show {
        #[arg(long)]
        policy: Option<PathBuf>,
    },
    /// Write the built-in policy to disk.
    Init {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn expanded(path: Option<PathBuf>) -> Option<PathBuf> {
    path.map(|p| PathBuf::from(util::expand_tilde(&p.to_string_lossy())))
}

async fn dispatch(cli: Cli) -> anyhow::Result<Outcome> {
    match cli.command {
        Commands::Validate {
            policy,
            json,
            quiet,
            files,
        } => {
            // Policy errors stop the process before any script is read.
            let policy = commands::config::load_policy(expanded(policy).as_deref())?;

            let logger = match (cli.no_log, util::nexus_home()) {
                (false, Some(home)) => SessionLogger::new(&home).await,
                _ => None,
            };

            let files: Vec<PathBuf> = files
                .into_iter()
                .map(|f| PathBuf::from(util::expand_tilde(&f.to_string_lossy())))
                .collect();
            let (reviews, outcome) =
                commands::validate::run_validate(&files, &policy, logger.as_ref()).await;
            if let Some(logger) = logger {
                logger.finish().await;
            }

            if json {
                println!("{}", commands::validate::render_json(&reviews)?);
            } else {
                print!("{}", commands::validate::render_text(&reviews, quiet));
            }
            Ok(outcome)
        }
        Commands::Policy { command } => match command {
            PolicyCommand::Show { policy } => {
                let policy = commands::config::load_policy(expanded(policy).as_deref())?;
                println!("{}", commands::policy::show_policy(&policy)?);
                Ok(Outcome::AllAccepted)
            }
            PolicyCommand::Init { path, force } => {
                let path = expanded(path)
                    .or_else(commands::config::default_policy_path)
                    .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?;
                commands::policy::init_policy(&path, force)?;
                println!("Wrote {}", path.display());
                Ok(Outcome::AllAccepted)
            }
        },
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("nexus: failed to start runtime: {e}");
            return ExitCode::from(Outcome::Failed.code());
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(outcome) => ExitCode::from(outcome.code()),
        Err(e) => {
            eprintln!("nexus: {e:#}");
            ExitCode::from(Outcome::Failed.code())
        }
    }
}
