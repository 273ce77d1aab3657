use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod loader;
mod output;

use error::{format_error, Result};
use output::{OutputFormat, OutputManager};

#[derive(Parser)]
#[command(name = "sloctl")]
#[command(about = "sloctl - SLO compliance reporting from monitoring backends")]
#[command(version)]
#[command(long_about = "
sloctl computes SLO compliance reports from metrics stored in a monitoring
backend, evaluating each SLO config against an error budget policy.

Examples:
  sloctl report -f slo_config.yaml -b policy.yaml        # Compute reports
  sloctl report -f ./slos --export --format json          # Batch run with export
  sloctl validate -f ./slos -b policy.yaml                # Check configs
  sloctl delete -f slo_config.yaml -b policy.yaml         # Remove hosted SLOs
")]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormatArg,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormatArg {
    Table,
    Json,
    Yaml,
    Csv,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Yaml => OutputFormat::Yaml,
            OutputFormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute SLO compliance reports
    Report(commands::ReportArgs),

    /// Validate SLO configs and error budget policies
    Validate(commands::ValidateArgs),

    /// Delete provider-hosted SLO definitions
    Delete(commands::DeleteArgs),

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn setup_logging(cli: &Cli) {
    let default_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(&cli);

    if cli.no_color {
        console::set_colors_enabled(false);
    }
    let output = OutputManager::new(
        cli.format.clone().into(),
        !cli.no_color,
        cli.quiet,
    );

    let result: Result<()> = match cli.command {
        Commands::Report(args) => commands::report::run(args, &output).await,
        Commands::Validate(args) => commands::validate::run(args).await,
        Commands::Delete(args) => commands::delete::run(args, &output).await,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "sloctl",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{}", format_error(&err));
        std::process::exit(err.exit_code());
    }
}
