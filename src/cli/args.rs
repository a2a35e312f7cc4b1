use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "waqt", version, author, about = "Monthly prayer calendar and current/next prayer in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set location, calculation method and school
    Setup {
        /// Location name shown in the header
        #[arg(long)]
        name: Option<String>,
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true, requires = "lng")]
        lat: Option<f64>,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lng: Option<f64>,
        /// Calculation method id (see `waqt setup --list-methods`)
        #[arg(long)]
        method: Option<u8>,
        /// School of thought: hanafi or shafi
        #[arg(long)]
        school: Option<String>,
        /// Print the known calculation methods and exit
        #[arg(long)]
        list_methods: bool,
        /// Restore default settings
        #[arg(long)]
        reset: bool,
    },
    /// Show the current and next prayer for today
    Times,
    /// Show the prayer timetable for a whole month
    Month {
        /// Year (defaults to this year)
        #[arg(long, requires = "month")]
        year: Option<i32>,
        /// Month 1-12 (defaults to this month)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Show or change the school of thought (hanafi / shafi)
    School {
        /// New school; omit to show the current one
        school: Option<String>,
    },
    /// Fetch this month again, bypassing the cache
    Refresh,
}
