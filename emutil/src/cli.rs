//! Root CLI structure for emutil

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "emutil")]
#[command(about = "Command-line tools for BPS patches and Sega 8-bit ROM images", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// BPS patch operations
    Bps {
        #[command(subcommand)]
        command: crate::commands::bps::BpsCommands,
    },

    /// Master System / Game Gear ROM operations
    Sms {
        #[command(subcommand)]
        command: crate::commands::sms::SmsCommands,
    },

    /// List the available operations and the files they take
    Operations,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
