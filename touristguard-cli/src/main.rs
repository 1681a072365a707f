//! TouristGuard CLI - Command-line host for the tracking core
//!
//! Activates a tourist identity, tracks a simulated or recorded position and
//! delivers it to the safety dashboard.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::activate::ActivateArgs;
use commands::classify::ClassifyArgs;
use commands::common::PositionArgs;
use commands::config::ConfigCommands;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "touristguard")]
#[command(version = touristguard::VERSION)]
#[command(about = "Personal-safety location tracking", long_about = None)]
struct Cli {
    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate an identity and start tracking
    Activate {
        /// Identity token issued by the registration desk
        id: String,

        #[command(flatten)]
        position: PositionArgs,
    },

    /// Resume tracking for the stored identity
    Run {
        #[command(flatten)]
        position: PositionArgs,
    },

    /// Forget the stored identity and disable tracking
    ///
    /// A tracking session started by `activate` or `run` in another process
    /// stops once it sees the identity is gone.
    Reset,

    /// Show which zones contain a coordinate
    Classify {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Activate { id, position } => commands::activate::run(ActivateArgs {
            id,
            position,
            verbose,
        }),
        Commands::Run { position } => commands::run::run(RunArgs { position, verbose }),
        Commands::Reset => commands::reset::run(),
        Commands::Classify { lat, lon, json } => commands::classify::run(ClassifyArgs {
            lat,
            lon,
            json,
            verbose,
        }),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activate_with_fixed_position() {
        let cli = Cli::try_parse_from([
            "touristguard",
            "activate",
            "T-1001",
            "--lat",
            "28.61",
            "--lon",
            "-77.2",
        ])
        .unwrap();

        match cli.command {
            Commands::Activate { id, position } => {
                assert_eq!(id, "T-1001");
                assert_eq!(position.lat, Some(28.61));
                assert_eq!(position.lon, Some(-77.2));
                assert!(!position.deny_background);
            }
            _ => panic!("expected activate"),
        }
    }

    #[test]
    fn test_track_conflicts_with_fixed_position() {
        let result = Cli::try_parse_from([
            "touristguard",
            "run",
            "--track",
            "walk.json",
            "--lat",
            "1.0",
            "--lon",
            "2.0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_lat_requires_lon() {
        assert!(Cli::try_parse_from(["touristguard", "run", "--lat", "1.0"]).is_err());
    }

    #[test]
    fn test_global_verbose_flag() {
        let cli =
            Cli::try_parse_from(["touristguard", "run", "--track", "walk.json", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["touristguard", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigCommands::Init { force: true }
            }
        ));
    }

    #[test]
    fn test_activate_requires_id() {
        assert!(Cli::try_parse_from(["touristguard", "activate"]).is_err());
    }

    #[test]
    fn test_reset_help_mentions_running_sessions() {
        use clap::CommandFactory;

        let mut command = Cli::command();
        let reset = command
            .find_subcommand_mut("reset")
            .expect("reset subcommand");
        let help = reset.render_long_help().to_string();
        assert!(help.contains("another process"));
    }
}
