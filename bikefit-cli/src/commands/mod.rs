mod config_cmd;
mod presets;
mod replay;
mod report;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

pub use replay::ReplayCommand;
pub use report::ReportCommand;

pub(crate) const DISCIPLINES: [&str; 3] = ["road", "gravel", "mtb"];
pub(crate) const GOALS: [&str; 3] = ["comfort", "neutral", "aero"];

#[derive(Parser)]
#[command(name = "bikefit")]
#[command(about = "Pose-based bike fitting: replay pose recordings, save measurements, compare before and after", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "BIKEFIT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the fitting session
    #[command(subcommand)]
    Session(SessionSubcommands),

    /// Run a recorded pose stream through the live pipeline
    Replay(ReplayCommand),

    /// Compare two saved measurements
    Report(ReportCommand),

    /// List target angle ranges
    Presets,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigSubcommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum SessionSubcommands {
    /// Show the current session
    Show,

    /// Update client and body data
    Client {
        #[arg(long)]
        name: Option<String>,

        /// Session date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Height in cm
        #[arg(long)]
        height: Option<String>,

        /// Inseam in cm
        #[arg(long)]
        inseam: Option<String>,

        /// Foot length in cm
        #[arg(long)]
        foot: Option<String>,

        /// Arm length in cm
        #[arg(long)]
        arms: Option<String>,
    },

    /// Choose discipline and goal
    Bike {
        #[arg(long, value_parser = DISCIPLINES)]
        discipline: Option<String>,

        #[arg(long, value_parser = GOALS)]
        goal: Option<String>,
    },

    /// Record the current bike setup
    Setup {
        /// Field assignment, e.g. `saddleHeight=735` (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },

    /// Print the session JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the session with a JSON file
    Import {
        file: PathBuf,
    },

    /// Start a new, empty session
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Initialize configuration with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.verbose {
            tracing::info!("Verbose mode enabled");
        }

        let config_file = Config::resolve_file(self.config.as_deref())?;

        match self.command {
            Commands::Session(subcmd) => {
                let config = Config::load_from(&config_file)?;
                match subcmd {
                    SessionSubcommands::Show => session::show_session(&config),
                    SessionSubcommands::Client {
                        name,
                        date,
                        notes,
                        height,
                        inseam,
                        foot,
                        arms,
                    } => session::update_client(
                        &config,
                        session::ClientUpdate {
                            name,
                            date,
                            notes,
                            height,
                            inseam,
                            foot,
                            arms,
                        },
                    ),
                    SessionSubcommands::Bike { discipline, goal } => {
                        session::update_bike(&config, discipline.as_deref(), goal.as_deref())
                    }
                    SessionSubcommands::Setup { set } => session::update_setup(&config, &set),
                    SessionSubcommands::Export { output } => {
                        session::export_session(&config, output.as_deref())
                    }
                    SessionSubcommands::Import { file } => session::import_session(&config, &file),
                    SessionSubcommands::Clear { force } => session::clear_session(&config, force),
                }
            }
            Commands::Replay(cmd) => cmd.execute(Config::load_from(&config_file)?).await,
            Commands::Report(cmd) => cmd.execute(&Config::load_from(&config_file)?),
            Commands::Presets => {
                presets::list_presets();
                Ok(())
            }
            Commands::Config(subcmd) => match subcmd {
                ConfigSubcommands::Show => config_cmd::show_config(&config_file),
                ConfigSubcommands::Path => {
                    println!("{}", config_file.display());
                    Ok(())
                }
                ConfigSubcommands::Init { force } => config_cmd::init_config(&config_file, force),
            },
            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
