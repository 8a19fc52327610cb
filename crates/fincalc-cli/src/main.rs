mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::bonds::BondArgs;
use commands::interest::{
    CdArgs, CompoundInterestArgs, InterestScheduleArgs, RecurringDepositArgs, SimpleInterestArgs,
};
use commands::investments::{GoalArgs, LumpsumArgs, SipArgs};
use commands::loans::{AprArgs, LeaseArgs, LoanArgs, MortgageArgs};
use commands::ratios::{ChitFundArgs, DtiArgs, RefinanceArgs, RentalArgs};
use commands::tax::IncomeTaxArgs;
use commands::tvm::TvmArgs;
use output::OutputOptions;

/// Loan, bond, deposit and investment calculators
#[derive(Parser)]
#[command(
    name = "fincalc",
    version,
    about = "Loan, bond, deposit and investment calculators",
    long_about = "A CLI for consumer finance calculations with decimal precision. \
                  Supports amortization schedules, mortgages, APR, TVM, bond pricing, \
                  compound interest, deposits, SIP and goal planning, and ratio \
                  calculators. Inputs come from flags, a JSON/YAML file or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Round decimal values to this many places (table, csv and minimal output)
    #[arg(long, global = true)]
    decimals: Option<u32>,

    /// Print the period-by-period rows instead of the summary
    #[arg(long, global = true)]
    schedule: bool,

    /// Log solver progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Amortization schedule with extra payments and rate changes
    Loan(LoanArgs),
    /// Mortgage payment including tax, insurance, HOA and PMI
    Mortgage(MortgageArgs),
    /// APR implied by upfront fees
    Apr(AprArgs),
    /// Auto lease payment
    Lease(LeaseArgs),
    /// Time value of money: solve for FV, PV, PMT, periods or rate
    Tvm(TvmArgs),
    /// Bond price or yield, duration and convexity
    Bond(BondArgs),
    /// Simple interest P x r x t
    SimpleInterest(SimpleInterestArgs),
    /// Dated simple interest with prepayments and rate resets
    InterestSchedule(InterestScheduleArgs),
    /// Compound interest with optional periodic contributions
    CompoundInterest(CompoundInterestArgs),
    /// Certificate of deposit maturity value and APY
    Cd(CdArgs),
    /// Recurring deposit with quarterly compounding
    RecurringDeposit(RecurringDepositArgs),
    /// One-time investment growth
    Lumpsum(LumpsumArgs),
    /// Systematic investment plan, optionally stepped up yearly
    Sip(SipArgs),
    /// Monthly investment required to reach a goal
    Goal(GoalArgs),
    /// Front-end and back-end debt-to-income ratios
    Dti(DtiArgs),
    /// Rental property cap rate, cash-on-cash, DSCR and IRR
    RentalProperty(RentalArgs),
    /// Compare the current loan against a refinance
    Refinance(RefinanceArgs),
    /// Chit fund dividends and member return
    ChitFund(ChitFundArgs),
    /// Progressive income tax over brackets
    IncomeTax(IncomeTaxArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fincalc_core=debug,fincalc=debug")
    } else {
        EnvFilter::try_from_env("FINCALC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout carries the result
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Loan(args) => commands::loans::run_loan(args),
        Commands::Mortgage(args) => commands::loans::run_mortgage(args),
        Commands::Apr(args) => commands::loans::run_apr(args),
        Commands::Lease(args) => commands::loans::run_lease(args),
        Commands::Tvm(args) => commands::tvm::run_tvm(args),
        Commands::Bond(args) => commands::bonds::run_bond(args),
        Commands::SimpleInterest(args) => commands::interest::run_simple_interest(args),
        Commands::InterestSchedule(args) => commands::interest::run_interest_schedule(args),
        Commands::CompoundInterest(args) => commands::interest::run_compound_interest(args),
        Commands::Cd(args) => commands::interest::run_cd(args),
        Commands::RecurringDeposit(args) => commands::interest::run_recurring_deposit(args),
        Commands::Lumpsum(args) => commands::investments::run_lumpsum(args),
        Commands::Sip(args) => commands::investments::run_sip(args),
        Commands::Goal(args) => commands::investments::run_goal(args),
        Commands::Dti(args) => commands::ratios::run_dti(args),
        Commands::RentalProperty(args) => commands::ratios::run_rental_property(args),
        Commands::Refinance(args) => commands::ratios::run_refinance(args),
        Commands::ChitFund(args) => commands::ratios::run_chit_fund(args),
        Commands::IncomeTax(args) => commands::tax::run_income_tax(args),
        Commands::Version => {
            println!("fincalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    let options = OutputOptions {
        decimals: cli.decimals,
        schedule: cli.schedule,
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value, &options);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
