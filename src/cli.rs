//! Command-line interface
//!
//! One subcommand per dataset; results print as JSON on stdout, and an
//! empty snapshot exits with a distinct status instead of output (the CLI
//! equivalent of a 404).

use clap::{Parser, Subcommand};

/// Cached aggregator for Korean COVID companion data
#[derive(Parser, Debug)]
#[command(name = "covcache")]
#[command(about = "Cached weather, news, infection statistics, and vaccination centers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Current weather for the big-city table
    Weather {
        /// Restrict to these cities (romanized or Korean name); empty = all
        #[arg(long, value_delimiter = ',')]
        cities: Vec<String>,
    },

    /// Pandemic news headlines, paginated over the current snapshot
    News {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Items per page (capped at 100 server-side)
        #[arg(long, default_value_t = 20)]
        page_count: u32,
    },

    /// Nationwide infection statistics
    CoronaState,

    /// Per-region infection statistics
    CoronaCity {
        /// Restrict to these regions (Korean name); empty = all
        #[arg(long, value_delimiter = ',')]
        regions: Vec<String>,
    },

    /// Vaccination centers, optionally filtered by distance from a point
    Vaccine {
        /// Latitude of the search origin
        #[arg(long, requires = "lon")]
        lat: Option<f64>,

        /// Longitude of the search origin
        #[arg(long, requires = "lat")]
        lon: Option<f64>,

        /// Search radius in kilometers (capped at 30 server-side)
        #[arg(long, default_value_t = 10.0)]
        within: f64,
    },

    /// Force-refresh one dataset, or all of them
    Refresh {
        /// weather | news | corona-state | corona-city | vaccine | all
        #[arg(default_value = "all")]
        dataset: String,
    },
}
