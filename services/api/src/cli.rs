use crate::demo::{run_demo, run_summary_report, DemoArgs, SummaryReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use emi_portal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "EMI Portal",
    about = "Run the retail EMI application portal service from the command line",
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
    /// Print a portal summary over seeded demo data
    Report(SummaryReportArgs),
    /// Run an end-to-end CLI demo covering submission, review, and audit
    Demo(DemoArgs),
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
        Command::Report(args) => run_summary_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
