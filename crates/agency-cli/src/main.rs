mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "agency",
    about = "Hire roles and skills from a shared HQ, and feed project learnings back into it",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from agency.yaml or .git/)
    #[arg(long, global = true, env = "AGENCY_ROOT")]
    root: Option<PathBuf>,

    /// HQ directory (default: <root>/.agency-hq if present, else ~/.agency-hq)
    #[arg(long, global = true, env = "AGENCY_HQ")]
    hq: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision roles and skills into the project
    Hire {
        /// Hire a single role by identifier instead of reading agency.yaml
        role: Option<String>,
        /// Project configuration to hire from (default: <root>/agency.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show what a hire would provision, without writing anything
    Infer {
        /// Free-text requirements to match against the registry
        text: Option<String>,
        /// Project configuration to read requirements from
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Harvest the project's learnings and skill feedback into the HQ
    Learn,

    /// Consolidate archived learnings into role standards
    Upskill,

    /// Record whether a skill helped on this project
    Feedback {
        /// Skill identifier
        #[arg(long)]
        skill: String,
        /// helpful, neutral, or harmful
        #[arg(long)]
        result: String,
        /// Optional note
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Show or set the project's active persona
    Persona {
        /// Role to activate (omit to show the current persona)
        role: Option<String>,
    },

    /// Project and HQ status
    Status,

    /// List capabilities in the HQ registry
    Registry {
        /// Only list one kind: role or skill
        #[arg(long)]
        kind: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let ctx = cmd::Context {
        hq: root::resolve_hq(cli.hq.as_deref(), &root),
        root,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Hire { role, config } => cmd::hire::run(&ctx, role.as_deref(), config.as_deref()),
        Commands::Infer { text, config } => {
            cmd::infer::run(&ctx, text.as_deref(), config.as_deref())
        }
        Commands::Learn => cmd::learn::run(&ctx),
        Commands::Upskill => cmd::upskill::run(&ctx),
        Commands::Feedback {
            skill,
            result,
            note,
        } => cmd::feedback::run(&ctx, &skill, &result, &note),
        Commands::Persona { role } => cmd::persona::run(&ctx, role.as_deref()),
        Commands::Status => cmd::status::run(&ctx),
        Commands::Registry { kind } => cmd::registry::run(&ctx, kind.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
