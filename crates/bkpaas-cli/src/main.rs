//! BkPaaS CLI - deployment control and process autoscaling

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod context;
mod error;
mod exit_codes;

use context::Context;
use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "bkpaas")]
#[command(author = "BlueKing PaaS Contributors")]
#[command(version)]
#[command(about = "Control BkPaaS deployments and process autoscaling", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.config/bkpaas/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding local deployment and build records
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deployment operations
    Deploy {
        #[command(subcommand)]
        command: DeployCommands,
    },

    /// Build operations
    Build {
        #[command(subcommand)]
        command: BuildCommands,
    },

    /// Process autoscaling resources
    Autoscaling {
        #[command(subcommand)]
        command: AutoscalingCommands,
    },
}

#[derive(Subcommand)]
enum DeployCommands {
    /// Request the interruption of a running deployment
    Interrupt {
        /// Deployment id
        id: String,

        /// Requesting user (default: operator from config)
        #[arg(short, long, env = "BKPAAS_USER")]
        user: Option<String>,
    },

    /// Show a deployment
    Status {
        /// Deployment id
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum BuildCommands {
    /// Show the latest build of an environment
    Latest {
        /// Application code
        #[arg(long)]
        code: String,

        /// Module name
        #[arg(long, default_value = "default")]
        module: String,

        /// Environment (stag/prod)
        #[arg(long, default_value = "prod")]
        env: String,
    },
}

#[derive(Subcommand)]
enum AutoscalingCommands {
    /// Print the cluster resource for an autoscaling file
    Render {
        /// Autoscaling file
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Decode and summarize a GeneralPodAutoscaler resource
    Inspect {
        /// Resource file (YAML or JSON)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Create or update the resource in the current cluster
    Apply {
        /// Autoscaling file
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Delete the resource from the current cluster
    Delete {
        /// Resource name
        name: String,

        /// Namespace (default: namespace from config)
        #[arg(short, long)]
        namespace: Option<String>,
    },
}

fn init_tracing(ctx: &Context, debug: bool) {
    let default_level = if debug {
        "debug".to_string()
    } else {
        ctx.settings.log_level.clone()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.config.as_deref(), cli.data_dir)?;
    init_tracing(&ctx, cli.debug);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Other {
            message: format!("failed to start async runtime: {}", e),
        })?;

    match cli.command {
        Commands::Deploy { command } => match command {
            DeployCommands::Interrupt { id, user } => {
                rt.block_on(commands::deploy::interrupt(&ctx, &id, user.as_deref()))
            }
            DeployCommands::Status { id, json } => {
                rt.block_on(commands::deploy::status(&ctx, &id, json))
            }
        },

        Commands::Build { command } => match command {
            BuildCommands::Latest { code, module, env } => {
                rt.block_on(commands::build::latest(&ctx, &code, &module, &env))
            }
        },

        Commands::Autoscaling { command } => match command {
            AutoscalingCommands::Render { file } => commands::autoscaling::render(&ctx, &file),
            AutoscalingCommands::Inspect { file } => commands::autoscaling::inspect(&file),
            AutoscalingCommands::Apply { file } => {
                rt.block_on(commands::autoscaling::apply(&ctx, &file))
            }
            AutoscalingCommands::Delete { name, namespace } => rt.block_on(
                commands::autoscaling::delete(&ctx, &name, namespace.as_deref()),
            ),
        },
    }
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    if cli.debug {
        // SAFETY: We're the only thread at this point (start of main)
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }

    if let Err(e) = run(cli) {
        let code = e.exit_code();
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(code);
    }
}
