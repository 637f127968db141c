use crate::demo::{run_demo, run_relation_import, DemoArgs, RelationImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use perf_review::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Performance Review Service",
    about = "Run the performance review API or explore it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with period relation sheets
    Relations {
        #[command(subcommand)]
        command: RelationsCommand,
    },
    /// Seed a synthetic review period and print the resulting rankings
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum RelationsCommand {
    /// Replace a period's relations from a CSV sheet and print the import report
    Import(RelationImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the synthetic dataset before accepting requests
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Relations {
            command: RelationsCommand::Import(args),
        } => run_relation_import(args),
        Command::Demo(args) => run_demo(args),
    }
}
