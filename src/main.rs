use std::{path::PathBuf, process::ExitCode};

use clap::{ArgAction, Parser, ValueEnum};
use statement_recon::Rule;
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RuleArg {
    /// Deduct manual write-offs (1326) from the first liquidation
    WriteOff,
    /// Plain credit/debit sums of groups holding 1318, 1321 and 1322
    ThreeCode,
}

impl From<RuleArg> for Rule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::WriteOff => Rule::WriteOff,
            RuleArg::ThreeCode => Rule::ThreeCode,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "statement-recon",
    version,
    about = "Reconcile a marketplace bank statement by document number"
)]
struct Args {
    /// Semicolon-delimited statement export
    input: PathBuf,

    /// Summary report to create
    #[arg(default_value = "resultado.csv")]
    output: PathBuf,

    /// Reconciliation rule
    #[arg(long, value_enum, default_value_t = RuleArg::WriteOff)]
    rule: RuleArg,

    /// Log progress to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if statement_recon::run(&args.input, &args.output, args.rule.into()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
