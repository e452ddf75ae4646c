use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use commands::{auth, browse, config, export};
use std::path::PathBuf;
use traktarr_api::{HistoryKind, ListKind, RatingsKind};
use traktarr_models::{SortField, SortOrder, TypeFilter};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "traktarr")]
#[command(about = "traktarr - Browse and export your Trakt history, ratings and collection")]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Also write logs to this file (rotated daily)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },

    /// Sign in to Trakt, inspect or drop the stored token
    Auth {
        #[command(subcommand)]
        cmd: AuthCommands,
    },

    /// Show watch history
    #[command(long_about = "Show watch history. Prints one page with its pagination details, or every page with --all. Filters apply to the fetched records only.")]
    History {
        /// Restrict to movies, shows or episodes
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<HistoryKind>,

        /// Only history watched at or after this date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_date)]
        start: Option<DateTime<Utc>>,

        /// Only history watched at or before this date
        #[arg(long, value_parser = parse_date)]
        end: Option<DateTime<Utc>>,

        /// Page to fetch (1-based)
        #[arg(long, conflicts_with = "all")]
        page: Option<u32>,

        /// Items per page
        #[arg(long)]
        limit: Option<u32>,

        /// Fetch every page
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show watched movies or shows
    Watched {
        #[arg(long = "type", value_name = "TYPE", default_value = "movies")]
        kind: ListKind,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show your ratings
    Ratings {
        /// movies, shows, seasons, episodes or all
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<RatingsKind>,

        /// Only entries rated exactly this value
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        rating: Option<u8>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show collected movies or shows
    Collection {
        #[arg(long = "type", value_name = "TYPE", default_value = "movies")]
        kind: ListKind,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show account statistics
    Stats,

    /// Export history, watched, ratings, collection and stats to files
    #[command(long_about = "Fetch the selected categories and write them as one JSON document or one CSV file per category. Defaults come from the [export] section of the configuration.")]
    Export {
        /// json or csv
        #[arg(long)]
        format: Option<String>,

        /// Directory to write into (default: <data dir>/exports)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// File name base (default: <prefix>-<YYYY-MM-DD>)
        #[arg(long, value_name = "NAME")]
        filename: Option<String>,

        #[arg(long, action = ArgAction::SetTrue)]
        no_history: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        no_watched: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        no_ratings: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        no_collection: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        no_stats: bool,

        /// Start of the history date range
        #[arg(long, value_parser = parse_date)]
        start: Option<DateTime<Utc>>,

        /// End of the history date range
        #[arg(long, value_parser = parse_date)]
        end: Option<DateTime<Utc>>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Set Trakt API application credentials
    #[command(long_about = "Set the Trakt API application credentials. Create an application at https://trakt.tv/oauth/applications first. Missing values are prompted for.")]
    Trakt {
        #[arg(long)]
        client_id: Option<String>,

        #[arg(long)]
        client_secret: Option<String>,

        #[arg(long)]
        redirect_uri: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in (device code flow by default)
    Login {
        /// Use an authorization code instead of the device flow. Without a
        /// value, prints the authorization URL and prompts for the code.
        #[arg(long, value_name = "CODE", num_args = 0..=1, default_missing_value = "")]
        code: Option<String>,
    },

    /// Show whether a valid token is stored
    Status,

    /// Revoke and forget the stored token
    Logout,

    /// Exchange the refresh token for a new access token
    Refresh,
}

/// Client-side filters shared by the browse commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// movies, shows, episodes or all
    #[arg(long, value_name = "TYPE")]
    pub filter_type: Option<TypeFilter>,

    /// Minimum rating (own rating for ratings, community rating otherwise)
    #[arg(long)]
    pub min_rating: Option<f64>,

    /// Exact genre slug, e.g. "science-fiction"
    #[arg(long)]
    pub genre: Option<String>,

    #[arg(long)]
    pub year: Option<u32>,

    /// Case-insensitive title search
    #[arg(long)]
    pub search: Option<String>,

    /// title, year, rating, watched_at or collected_at
    #[arg(long)]
    pub sort_by: Option<SortField>,

    /// asc or desc (default desc)
    #[arg(long)]
    pub sort_order: Option<SortOrder>,

    /// Keep records watched at or after this date
    #[arg(long, value_parser = parse_date)]
    pub since: Option<DateTime<Utc>>,

    /// Keep records watched at or before this date
    #[arg(long, value_parser = parse_date)]
    pub until: Option<DateTime<Utc>>,
}

fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    traktarr_models::parse_timestamp(s)
        .ok_or_else(|| format!("Invalid date: {}. Use YYYY-MM-DD or RFC 3339", s))
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Config { cmd } => config::run_config(cmd, &output).await,
        Commands::Auth { cmd } => auth::run_auth(cmd, &output).await,
        Commands::History {
            kind,
            start,
            end,
            page,
            limit,
            all,
            filters,
        } => {
            let query = traktarr_api::PageQuery {
                kind,
                start_date: start,
                end_date: end,
                page,
                limit,
            };
            browse::run_history(query, all, &filters, &output).await
        }
        Commands::Watched { kind, filters } => browse::run_watched(kind, &filters, &output).await,
        Commands::Ratings {
            kind,
            rating,
            filters,
        } => browse::run_ratings(kind, rating, &filters, &output).await,
        Commands::Collection { kind, filters } => {
            browse::run_collection(kind, &filters, &output).await
        }
        Commands::Stats => browse::run_stats(&output).await,
        Commands::Export {
            format,
            output_dir,
            filename,
            no_history,
            no_watched,
            no_ratings,
            no_collection,
            no_stats,
            start,
            end,
        } => {
            let args = export::ExportArgs {
                format,
                output_dir,
                filename,
                include_history: !no_history,
                include_watched: !no_watched,
                include_ratings: !no_ratings,
                include_collection: !no_collection,
                include_stats: !no_stats,
                start,
                end,
            };
            export::run_export(args, &output).await
        }
    }
}
