pub mod commands;

use clap::{Parser, Subcommand};
use gavel_core::valuation::appraisal::DEFAULT_CONDITION;
use gavel_core::PricingStrategy;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "gavel",
    about = "Gavel valuation CLI",
    long_about = "Price classifier output, apply condition adjustments, and inspect the catalog and effective configuration.",
    after_help = "Examples:\n  gavel appraise --label sports_car --confidence 0.95 --condition Used\n  gavel adjust --base-price 10000 --confidence 0.95 --condition Used\n  gavel catalog --category car\n  gavel config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a classifier label and confidence, then apply adjustments")]
    Appraise {
        #[arg(long, help = "Classifier label, e.g. `sports_car`")]
        label: String,
        #[arg(long, help = "Classifier confidence in [0, 1]")]
        confidence: f64,
        #[arg(long, default_value = DEFAULT_CONDITION, help = "New, Used, or Heavily Used")]
        condition: String,
        #[arg(long, help = "Override the configured pricing strategy (bucketed|linear)")]
        strategy: Option<PricingStrategy>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Apply condition and confidence adjustments to an existing base price")]
    Adjust {
        #[arg(long, help = "Base price; non-numeric values fall back to the sentinel price")]
        base_price: String,
        #[arg(long, help = "Classifier confidence in [0, 1]")]
        confidence: f64,
        #[arg(long, default_value = DEFAULT_CONDITION, help = "New, Used, or Heavily Used")]
        condition: String,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List catalog categories with price ranges, tiers, and labels")]
    Catalog {
        #[arg(long, help = "Show a single category")]
        category: Option<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Appraise { label, confidence, condition, strategy, json } => {
            commands::appraise::run(&label, confidence, &condition, strategy, json)
        }
        Command::Adjust { base_price, confidence, condition, json } => {
            commands::adjust::run(&base_price, confidence, &condition, json)
        }
        Command::Catalog { category } => commands::catalog::run(category.as_deref()),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
