use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "habitquest", version, about = "Habit Quest CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management and daily check-ins
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Today's status and time until the day resets
    Today,
    /// Aggregate statistics
    Stats,
    /// Badge catalog and who holds each badge
    Badges,
    /// Upcoming reminders
    Reminders,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Today => commands::stats::today(),
        Commands::Stats => commands::stats::stats(),
        Commands::Badges => commands::stats::badges(),
        Commands::Reminders => commands::stats::reminders(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "habitquest", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
