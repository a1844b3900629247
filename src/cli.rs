use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Increase verbosity (-v: warnings, -vv: info, -vvv: debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Build(BuildArgs),
    Add(AddArgs),
    Rate(RateArgs),
    NewEvent(NewEventArgs),
    ListByRating(ListArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Store files to build.
    pub input_files: Vec<String>,

    /// Build every store file under the media directory.
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Output directory for generated feeds.
    #[arg(long, short = 'o', default_value = "feeds")]
    pub output_dir: String,

    /// Include talks with any rating (default: exclude averages of 2 or lower).
    #[arg(long)]
    pub all_ratings: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Search query, matched against schedule talk titles.
    pub query: String,

    /// Event key (e.g. 38c3).
    #[arg(long, short = 'e')]
    pub event: Option<String>,

    /// Select the event by year instead of by key.
    #[arg(long, short = 'y')]
    pub year: Option<i32>,

    /// Output store file (default: media/media_<event>.yml).
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// Use the long description from the schedule document.
    #[arg(long, short = 'l')]
    pub long_desc: bool,

    /// Override the category (first entry of a comma-separated list).
    #[arg(long, short = 'c')]
    pub categories: Option<String>,

    /// Skip the interactive rating prompt.
    #[arg(long)]
    pub no_rate: bool,
}

#[derive(Debug, Args)]
pub struct RateArgs {
    /// Store file whose talks should be rated.
    pub event_file: String,
}

#[derive(Debug, Args)]
pub struct NewEventArgs {
    /// Event year (e.g. 2025).
    pub year: i32,

    /// Congress number (auto-calculated from the latest configured event if omitted).
    #[arg(long, short = 'c')]
    pub congress_number: Option<u32>,

    /// Skip URL validation.
    #[arg(long)]
    pub no_validate: bool,

    /// Try all known schedule URL patterns and report which one works.
    #[arg(long)]
    pub try_all_patterns: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Filter by event key (e.g. 38c3) or store file path.
    #[arg(long, short = 'e')]
    pub event: Option<String>,

    /// Minimum average rating.
    #[arg(long, short = 'm')]
    pub min_rating: Option<f64>,

    /// Filter by category (e.g. Technology).
    #[arg(long, short = 'c')]
    pub category: Option<String>,
}
