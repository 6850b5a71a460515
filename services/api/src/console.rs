use crate::infra::{build_service, parse_date, parse_product, parse_status, resolve_now};
use chrono::NaiveDate;
use clap::Args;
use semaforo::config::AppConfig;
use semaforo::error::AppError;
use semaforo::telemetry;
use semaforo::workflows::onboarding::{
    CustomerRecord, EvaluationOutcome, NewCustomer, OperatorContext, Product, RecordFilter,
    Semaphore,
};

const CONSOLE_OPERATOR: &str = "console";

#[derive(Args, Debug, Default)]
pub(crate) struct FilterArgs {
    /// Substring match on the call center id
    #[arg(long)]
    pub(crate) call_center: Option<String>,
    /// Substring match on the sales agent
    #[arg(long)]
    pub(crate) agent: Option<String>,
    /// Substring match on the customer name
    #[arg(long)]
    pub(crate) customer: Option<String>,
    /// Exact status (GREEN, YELLOW, RED, BLUE_FINALIZED)
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<Semaphore>,
}

impl From<FilterArgs> for RecordFilter {
    fn from(args: FilterArgs) -> Self {
        RecordFilter {
            call_center: args.call_center,
            sales_agent: args.agent,
            customer: args.customer,
            status: args.status,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct BoardArgs {
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    /// Evaluation date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct InsertArgs {
    /// Call center the block belongs to
    #[arg(long)]
    pub(crate) call_center: String,
    /// Sales agent that closed the customer
    #[arg(long)]
    pub(crate) agent: String,
    /// Customer name; must not already have a block
    #[arg(long)]
    pub(crate) customer: String,
    /// Insertion date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ToggleArgs {
    /// Customer whose row for today is edited
    #[arg(long)]
    pub(crate) customer: String,
    /// Product code (F2025, F2026, HL, VIGILANCIA, IMPLANT, DENUNCIAS)
    #[arg(long, value_parser = parse_product)]
    pub(crate) product: Product,
    /// Current date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct EvaluateArgs {
    /// Evaluation date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    /// Report date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn prepare() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn operator() -> OperatorContext {
    OperatorContext::administrator(CONSOLE_OPERATOR)
}

pub(crate) fn run_board(args: BoardArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let service = build_service(&config);
    let filter = RecordFilter::from(args.filter);

    let board = service.board(&operator(), &filter, resolve_now(args.today))?;

    println!(
        "Showing {} of {} customers",
        board.shown_customers, board.total_customers
    );
    print_rows(&board.records);
    for failure in &board.export_failures {
        println!("Archive export failed for {}: {}", failure.label, failure.error);
    }
    Ok(())
}

pub(crate) fn run_insert(args: InsertArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let service = build_service(&config);
    let customer = NewCustomer {
        call_center_id: Some(args.call_center),
        sales_agent: args.agent,
        customer_name: args.customer,
    };

    let rows = service.insert_customer(&operator(), customer, resolve_now(args.today))?;
    println!("Scheduled {} rows", rows.len());
    print_rows(&rows);
    Ok(())
}

pub(crate) fn run_toggle(args: ToggleArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let service = build_service(&config);
    let now = resolve_now(args.today);

    let row = service.toggle_product(&operator(), &args.customer, now.date(), args.product, now)?;
    let state = if row.product_marks.is_marked(args.product) {
        "marked"
    } else {
        "unmarked"
    };
    println!("{} {} on {}: {}", row.customer_name, args.product, row.scheduled_date, state);
    print_rows(std::slice::from_ref(&row));
    Ok(())
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let service = build_service(&config);

    let outcome = service.evaluate(resolve_now(args.today))?;
    render_outcome(&outcome);
    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let service = build_service(&config);
    let filter = RecordFilter::from(args.filter);

    let document = service.report(&operator(), &filter, resolve_now(args.today))?;
    println!("{}", document.to_text());
    Ok(())
}

fn render_outcome(outcome: &EvaluationOutcome) {
    println!("Rows remaining: {}", outcome.table.len());

    if outcome.purged.is_empty() {
        println!("Expired blocks: none");
    } else {
        println!("Expired blocks");
        for block in &outcome.purged {
            let destination = block
                .archived_as
                .map(|kind| kind.tag())
                .unwrap_or("not archived");
            println!(
                "- {} (expired {}, final status {}): {}",
                block.customer_name,
                block.expiry_date.format("%d/%m/%Y"),
                block.final_status,
                destination
            );
        }
    }

    for receipt in &outcome.archived {
        println!("Archived {} rows as {} -> {}", receipt.rows, receipt.label, receipt.location);
    }
    for failure in &outcome.export_failures {
        println!("Archive export failed for {}: {}", failure.label, failure.error);
    }
}

fn print_rows(rows: &[CustomerRecord]) {
    let header: Vec<_> = Product::ordered().iter().map(|product| product.code()).collect();
    println!(
        "{:<14} {:<14} {:<20} {:<10} {} STATUS",
        "CALL",
        "AGENT",
        "CUSTOMER",
        "DAY",
        header.join(" ")
    );
    for row in rows {
        let marks: Vec<_> = row
            .product_marks
            .iter()
            .map(|(product, marked)| {
                let glyph = if marked { "✔" } else { "❌" };
                format!("{glyph:<width$}", width = product.code().len())
            })
            .collect();
        println!(
            "{:<14} {:<14} {:<20} {:<10} {} {}",
            row.call_center_id,
            row.sales_agent,
            row.customer_name,
            row.scheduled_date.format("%d/%m/%Y"),
            marks.join(" "),
            row.status
        );
    }
}
