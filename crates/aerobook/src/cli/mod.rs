//! Command-line interface for aerobook.
//!
//! This module provides the CLI structure for the `aerobook` binary; the
//! handlers live in `main.rs`.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    delete_scope, BookCommand, BookingArgs, ConfigCommand, DayArgs, ExportCommand, FlightTypeArg,
    OutputFormat, RoleArg, UserCommand,
};

use crate::logging::Verbosity;

/// aerobook - Aircraft reservations for a flying club
///
/// Book the club's aircraft, lay out the day's calendar and export
/// bookings as iCalendar.
#[derive(Debug, Parser)]
#[command(name = "aerobook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Account id to act as
    #[arg(short = 'u', long = "as", global = true, value_name = "USER_ID")]
    pub user: Option<String>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database and the guest account
    Init {
        /// Display name of the guest account
        #[arg(long, default_value = "Vieras")]
        guest_name: String,
    },

    /// Manage accounts
    #[command(subcommand)]
    User(UserCommand),

    /// Create, change and delete bookings
    #[command(subcommand)]
    Book(BookCommand),

    /// Show an aircraft's hour grid for a day
    Day(DayArgs),

    /// Show an aircraft's bookings packed into columns for a day
    Layout(DayArgs),

    /// Show an aircraft's free time for a day
    Free(DayArgs),

    /// Export bookings as iCalendar
    Export(ExportCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
