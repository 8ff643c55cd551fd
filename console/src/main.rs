// Desk console - usage-ranked credentials, web links and notes
// Entry point and command dispatch

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use deskconsole::app::{self, StartupOptions};
use deskconsole::commands::{self, render, CopyTarget};
use deskconsole::config::{
    ConfigSource, Environment, DEFAULT_PAGE_SIZE, DEFAULT_RANKING_COUNT, POLL_INTERVAL,
};
use deskconsole::models::{Domain, Facet, ListFilter, SearchField};
use deskconsole::services::classifier::SecretField;
use deskconsole::services::ranking::RankingCount;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "deskconsole", version, about = "Usage-ranked credentials, web links and notes")]
struct Cli {
    /// Deployment environment selecting the bootstrap document
    #[arg(long, env = "DESK_ENV", default_value = "development")]
    env: Environment,

    /// Explicit bootstrap document location (http(s) URL or file path)
    #[arg(long, env = "DESK_CONFIG")]
    config: Option<String>,

    /// Directory for the cached bootstrap document
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Entries per ranking list
    #[arg(long, default_value_t = DEFAULT_RANKING_COUNT)]
    count: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh and print most used, recent and favorites for every domain
    Dashboard,
    /// Keep polling and reprint on every change until Ctrl-C
    Watch {
        /// Seconds between silent refreshes
        #[arg(long, default_value_t = POLL_INTERVAL.as_secs())]
        interval: u64,
    },
    /// List one page of a domain
    List {
        domain: Domain,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
        /// Only active (or inactive) credentials
        #[arg(long)]
        active: Option<bool>,
        /// Only expired (or unexpired) credentials
        #[arg(long)]
        expired: Option<bool>,
    },
    /// Search a domain by name or content
    Search {
        domain: Domain,
        term: String,
        #[arg(long, value_enum, default_value_t = SearchArg::Name)]
        field: SearchArg,
    },
    /// Resources sharing an area, category, subcategory or type
    Browse {
        domain: Domain,
        #[arg(value_enum)]
        facet: FacetArg,
        value: String,
    },
    /// Show one resource (does not count as a use)
    Show { domain: Domain, id: i64 },
    /// Open a web link in the browser
    Open { id: i64 },
    /// Copy a credential field or a note body to the clipboard
    Copy {
        domain: Domain,
        id: i64,
        #[arg(long, value_enum, default_value_t = FieldArg::Password)]
        field: FieldArg,
        /// Print the value instead of using the clipboard
        #[arg(long)]
        stdout: bool,
    },
    /// Toggle the favorite flag
    Favorite { domain: Domain, id: i64 },
    /// Create a copy of a resource
    Duplicate { domain: Domain, id: i64 },
    /// Delete a resource
    Delete { domain: Domain, id: i64 },
    /// Print the resolved configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum FieldArg {
    Username,
    Password,
    Full,
}

impl From<FieldArg> for SecretField {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::Username => SecretField::Username,
            FieldArg::Password => SecretField::Password,
            FieldArg::Full => SecretField::FullRecord,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SearchArg {
    Name,
    Content,
}

#[derive(Clone, Copy, ValueEnum)]
enum FacetArg {
    Area,
    Category,
    Subcategory,
    Type,
}

impl From<FacetArg> for Facet {
    fn from(arg: FacetArg) -> Self {
        match arg {
            FacetArg::Area => Facet::Area,
            FacetArg::Category => Facet::Category,
            FacetArg::Subcategory => Facet::SubCategory,
            FacetArg::Type => Facet::Type,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deskconsole=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting desk console ({})", cli.env.as_str());

    let source = match &cli.config {
        Some(location) => ConfigSource::parse(location),
        None => ConfigSource::for_environment(cli.env),
    };
    let cache_dir = cli
        .cache_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("deskconsole"));
    let count = RankingCount::new(cli.count)?;

    let state = app::setup(StartupOptions {
        source,
        cache_dir,
        count,
    })
    .await
    .context("failed to load bootstrap configuration")?;

    let now = chrono::Utc::now();

    match cli.command {
        Command::Dashboard => {
            let states = commands::dashboard(&state).await;
            println!("{}", render::dashboard(&states, now));
        }
        Command::Watch { interval } => {
            commands::watch(&state, Duration::from_secs(interval.max(1))).await?;
        }
        Command::List {
            domain,
            search,
            page,
            page_size,
            active,
            expired,
        } => {
            let filter = ListFilter {
                active,
                expired,
                ..commands::page_filter(search.as_deref(), page, page_size)
            };
            let page = commands::list(&state, domain, &filter).await?;
            println!("{}", render::page(&page, now));
        }
        Command::Search {
            domain,
            term,
            field,
        } => {
            let field = match field {
                SearchArg::Name => SearchField::Name,
                SearchArg::Content => SearchField::Content,
            };
            let items = commands::search(&state, domain, field, &term).await?;
            println!("{}", render::records(&items, now));
        }
        Command::Browse {
            domain,
            facet,
            value,
        } => {
            let items = commands::by_facet(&state, domain, facet.into(), &value).await?;
            println!("{}", render::records(&items, now));
        }
        Command::Show { domain, id } => {
            let record = commands::show(&state, domain, id).await?;
            println!("{}", render::detail(&record, now));
        }
        Command::Open { id } => {
            let url = commands::open_link(&state, id).await?;
            println!("Opened {}", url);
        }
        Command::Copy {
            domain,
            id,
            field,
            stdout,
        } => {
            let target = if stdout {
                CopyTarget::Stdout
            } else {
                CopyTarget::Clipboard
            };
            let copied = commands::copy_value(&state, domain, id, field.into(), target).await?;
            match target {
                CopyTarget::Stdout => println!("{}", copied.text),
                CopyTarget::Clipboard => println!("Copied {} {} to the clipboard", domain, id),
            }
        }
        Command::Favorite { domain, id } => {
            let is_favorite = commands::favorite(&state, domain, id).await?;
            let verb = if is_favorite { "Added" } else { "Removed" };
            println!("{} {} {} {} favorites", verb, domain, id, if is_favorite { "to" } else { "from" });
        }
        Command::Duplicate { domain, id } => {
            let copy = commands::duplicate(&state, domain, id).await?;
            println!("Created {} #{}", copy.display_name, copy.id);
        }
        Command::Delete { domain, id } => {
            commands::delete(&state, domain, id).await?;
            println!("Deleted {} {}", domain, id);
        }
        Command::Config => {
            print!("{}", commands::config_info(&state)?);
        }
    }

    state.coordinator.shutdown();
    Ok(())
}
