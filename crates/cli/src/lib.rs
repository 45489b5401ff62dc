pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "gearfit",
    about = "Gearfit compatibility engine CLI",
    long_about = "Score gear/case compatibility, rank recommendations, inspect community feedback, and operate the backing store.",
    after_help = "Examples:\n  gearfit migrate\n  gearfit seed\n  gearfit recommend --gear gear-roland-fa06 --limit 5\n  gearfit score --gear gear-roland-fa06 --case case-gator-gkpe61"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Show effective configuration values with source attribution")]
    Config,
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog of gear and cases")]
    Seed,
    #[command(about = "Rank compatible cases for a gear item")]
    Recommend {
        #[arg(long, help = "Gear item id")]
        gear: String,
        #[arg(long, help = "Maximum number of results")]
        limit: Option<usize>,
        #[arg(long = "max-price", help = "Upper price bound, inclusive")]
        max_price: Option<String>,
        #[arg(long, help = "Store the ranked matches as compatibility records")]
        persist: bool,
    },
    #[command(about = "Suggest alternatives to a case already chosen for a gear item")]
    Alternatives {
        #[arg(long, help = "Gear item id")]
        gear: String,
        #[arg(long = "case", help = "Reference case id to find alternatives for")]
        case: String,
        #[arg(long, help = "Maximum number of results")]
        limit: Option<usize>,
    },
    #[command(about = "Score a single gear/case pair with its full breakdown")]
    Score {
        #[arg(long, help = "Gear item id")]
        gear: String,
        #[arg(long = "case", help = "Case id")]
        case: String,
    },
    #[command(about = "Community feedback for a pair, or top-rated cases for a gear item")]
    Feedback {
        #[arg(long, help = "Gear item id")]
        gear: String,
        #[arg(long = "case", help = "Case id; omit to list top-rated cases")]
        case: Option<String>,
    },
    #[command(name = "cache-sweep", about = "Remove expired cache entries")]
    CacheSweep {
        #[arg(long, help = "Also clear every entry in this namespace")]
        namespace: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Recommend { gear, limit, max_price, persist } => {
            commands::recommend::run(commands::recommend::RecommendArgs {
                gear,
                limit,
                max_price,
                persist,
            })
        }
        Command::Alternatives { gear, case, limit } => {
            commands::alternatives::run(&gear, &case, limit)
        }
        Command::Score { gear, case } => commands::score::run(&gear, &case),
        Command::Feedback { gear, case } => commands::feedback::run(&gear, case.as_deref()),
        Command::CacheSweep { namespace } => commands::cache_sweep::run(namespace.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
