use crate::demo::{run_demo, run_shelter_seed, DemoArgs, ShelterSeedArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use reliefnet::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Relief Coordination Service",
    about = "Run and demonstrate the disaster-relief coordination service from the command line",
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
    /// Manage the safe-shelter seed data
    Shelters {
        #[command(subcommand)]
        command: ShelterCommand,
    },
    /// Run an end-to-end CLI demo covering the request lifecycle and alerts
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ShelterCommand {
    /// Validate a shelter CSV (or the built-in sample set) and upload it
    Seed(ShelterSeedArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Shelters {
            command: ShelterCommand::Seed(args),
        } => run_shelter_seed(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
