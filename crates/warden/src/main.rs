use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::error;

use warden::{initialize, RootError, WardenConfig};
use warden_core::InvocationContext;

/// Warden: restriction policies for chat commands
///
/// Validates the restriction declarations of every configured command and
/// checks invocations against the compiled policies.
#[derive(Parser, Debug)]
#[command(name = "warden", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register every configured command and print its compiled policy
    Check,

    /// Check one invocation of a command
    Evaluate {
        /// Name of the invoked command
        command: String,

        /// JSON invocation context file, or "-" for stdin
        #[arg(long)]
        context: PathBuf,
    },

    /// List the registered restriction ids
    Restrictions,
}

fn init_tracing(verbose: bool, configured: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("warden=debug,warden_policy=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or("warden=info")))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<WardenConfig, RootError> {
    match path {
        Some(p) => WardenConfig::load(p),
        None => {
            let default_path = WardenConfig::default_config_path();
            WardenConfig::load(&default_path)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(
        cli.verbose,
        config.as_ref().ok().map(|c| c.logging.filter.as_str()),
    );

    let result = config.and_then(|config| run(cli.command, config));
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: WardenConfig) -> Result<(), RootError> {
    match command {
        Commands::Check => cmd_check(config),
        Commands::Evaluate { command, context } => cmd_evaluate(config, &command, &context),
        Commands::Restrictions => cmd_restrictions(config),
    }
}

fn cmd_check(config: WardenConfig) -> Result<(), RootError> {
    let state = initialize(config)?;

    let commands = state.engine.commands();
    println!("Registered commands ({}):", commands.len());
    for definition in commands {
        match &definition.policy {
            Some(policy) => println!("  {}: {}", definition.name, policy),
            None => println!("  {}: unrestricted", definition.name),
        }
    }

    if !state.rejected.is_empty() {
        println!("Rejected commands ({}):", state.rejected.len());
        for rejected in &state.rejected {
            println!("  {}: {}", rejected.name, rejected.error);
        }
    }
    Ok(())
}

fn cmd_evaluate(config: WardenConfig, command: &str, context: &Path) -> Result<(), RootError> {
    let state = initialize(config)?;

    let raw = if context == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(context)?
    };
    let context: InvocationContext = serde_json::from_str(&raw)?;

    if state.check(command, &context)? {
        println!("allowed");
    } else {
        println!("denied");
    }
    Ok(())
}

fn cmd_restrictions(config: WardenConfig) -> Result<(), RootError> {
    let state = initialize(config)?;
    for id in state.engine.registry().ids() {
        println!("{}", id);
    }
    Ok(())
}
