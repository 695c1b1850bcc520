//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::access::Role;
use crate::model::{BookingRequest, FlightType, GuestContact};
use crate::repeat::DeleteScope;

/// Fields shared by every command that creates or edits a booking.
#[derive(Debug, Clone, Args)]
pub struct BookingArgs {
    /// Aircraft registration, e.g. OH-CON
    pub plane: String,

    /// What the flight is for
    #[arg(short = 't', long = "type", value_enum, default_value = "local")]
    pub flight_type: FlightTypeArg,

    /// Start time (RFC 3339, e.g. 2025-06-01T08:00:00+03:00)
    #[arg(short, long)]
    pub start: String,

    /// End time (RFC 3339)
    #[arg(short, long)]
    pub end: String,

    /// Short title shown in the calendar
    #[arg(long)]
    pub title: String,

    /// Free text
    #[arg(short, long, default_value = "")]
    pub description: String,
}

impl BookingArgs {
    /// Convert to the service's request type.
    #[must_use]
    pub fn to_request(&self) -> BookingRequest {
        BookingRequest {
            aircraft: self.plane.clone(),
            flight_type: FlightType::from(self.flight_type).as_str().to_string(),
            start_time: self.start.clone(),
            end_time: self.end.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

/// Booking commands.
#[derive(Debug, Subcommand)]
pub enum BookCommand {
    /// Book an aircraft
    Add(BookingArgs),

    /// Book on behalf of a visitor, under the guest account
    Guest {
        /// Booking details
        #[command(flatten)]
        booking: BookingArgs,

        /// Visitor's name
        #[arg(long)]
        contact_name: String,

        /// Visitor's email
        #[arg(long)]
        contact_email: String,

        /// Visitor's phone
        #[arg(long)]
        contact_phone: String,
    },

    /// Book the same time every day until a date
    Repeat {
        /// Booking details for the first day
        #[command(flatten)]
        booking: BookingArgs,

        /// Last day of the series (YYYY-MM-DD, inclusive)
        #[arg(long)]
        until: String,
    },

    /// Change a booking
    Update {
        /// Booking id
        id: i64,

        /// New booking details
        #[command(flatten)]
        booking: BookingArgs,
    },

    /// Delete a booking
    Remove {
        /// Booking id
        id: i64,

        /// Also delete every later booking of the same series
        #[arg(long)]
        following: bool,
    },

    /// Show one booking
    Show {
        /// Booking id
        id: i64,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List bookings of one account
    List {
        /// Account whose bookings to list (default: the --as user)
        #[arg(long, value_name = "USER_ID")]
        owner: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the visitor contact of a guest booking (admins only)
    Contact {
        /// Booking id
        id: i64,
    },
}

impl BookCommand {
    /// Contact details of a `guest` command.
    #[must_use]
    pub fn contact(&self) -> Option<GuestContact> {
        match self {
            Self::Guest {
                contact_name,
                contact_email,
                contact_phone,
                ..
            } => Some(GuestContact {
                name: contact_name.clone(),
                email: contact_email.clone(),
                phone: contact_phone.clone(),
            }),
            _ => None,
        }
    }
}

/// Arguments for commands that look at one aircraft on one day.
#[derive(Debug, Args)]
pub struct DayArgs {
    /// Aircraft registration
    pub plane: String,

    /// Local date (YYYY-MM-DD)
    pub date: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Export a single booking
    #[arg(long, conflicts_with_all = ["plane", "from", "to"])]
    pub booking: Option<i64>,

    /// Only this aircraft (default: whole fleet)
    #[arg(short, long)]
    pub plane: Option<String>,

    /// First local day (YYYY-MM-DD)
    #[arg(long, required_unless_present = "booking")]
    pub from: Option<String>,

    /// Last local day (YYYY-MM-DD), defaults to --from
    #[arg(long)]
    pub to: Option<String>,

    /// Write to a file instead of stdout; a directory gets a generated file name
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// User commands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Add an account
    Add {
        /// Account id
        #[arg(long)]
        id: String,

        /// Full name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Account role
        #[arg(long, value_enum, default_value = "user")]
        role: RoleArg,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Flight type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlightTypeArg {
    /// Local flight
    Local,
    /// Cross-country trip
    Trip,
    /// Flight training
    Training,
    /// Maintenance
    Maintenance,
    /// Fire patrol
    Fire,
    /// Anything else
    Other,
}

impl From<FlightTypeArg> for FlightType {
    fn from(arg: FlightTypeArg) -> Self {
        match arg {
            FlightTypeArg::Local => Self::Local,
            FlightTypeArg::Trip => Self::Trip,
            FlightTypeArg::Training => Self::Training,
            FlightTypeArg::Maintenance => Self::Maintenance,
            FlightTypeArg::Fire => Self::Fire,
            FlightTypeArg::Other => Self::Other,
        }
    }
}

/// Role argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Administrator
    Admin,
    /// Member
    User,
    /// Guest account
    Guest,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Self::Admin,
            RoleArg::User => Self::User,
            RoleArg::Guest => Self::Guest,
        }
    }
}

/// Scope of `book remove`.
#[must_use]
pub fn delete_scope(following: bool) -> DeleteScope {
    if following {
        DeleteScope::ThisAndFollowing
    } else {
        DeleteScope::Single
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}
