use crate::console::{
    run_board, run_evaluate, run_insert, run_report, run_toggle, BoardArgs, EvaluateArgs,
    InsertArgs, ReportArgs, ToggleArgs,
};
use crate::server;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use semaforo::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Semaforo",
    about = "Track onboarding customers through their three-day semaphore window",
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
    /// Evaluate the table and print the (filtered) board
    Board(BoardArgs),
    /// Schedule the three-day block of a new customer
    Insert(InsertArgs),
    /// Flip one product mark on a customer's row for today
    Toggle(ToggleArgs),
    /// Recompute statuses, archive and purge expired blocks
    Evaluate(EvaluateArgs),
    /// Print the paginated status report
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Pin the service's notion of today (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Board(args) => run_board(args),
        Command::Insert(args) => run_insert(args),
        Command::Toggle(args) => run_toggle(args),
        Command::Evaluate(args) => run_evaluate(args),
        Command::Report(args) => run_report(args),
    }
}
