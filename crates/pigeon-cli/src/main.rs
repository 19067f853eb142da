use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use pigeon_core::{
    Article, Category, Config, Dashboard, FeedResult, HttpFeedGateway, HttpImageSearch,
    ProfileState, ProfileStore, RequestState, SearchResult, SearchSettings, AVAILABLE_INTERESTS,
};
use pigeon_store::{KeyValueStore, MemoryStore, SqliteStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pigeon")]
#[command(version, about = "Personalized and trending news from the terminal", long_about = None)]
struct Cli {
    /// Feed service base URL (overrides config and PIGEON_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Profile database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Keep the profile in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show trending news
    Trending {
        /// general, business, entertainment, health, science, sports,
        /// technology, politics or geography
        #[arg(short, long, default_value = "general")]
        category: String,

        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },
    /// Search for recommended articles
    Search {
        /// Search query
        query: String,
    },
    /// Show (or clear) past searches
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Show saved interests, or replace them with the given names
    Interests {
        names: Vec<String>,
    },
    /// Show the personalized feed
    Feed,
    /// Start a local session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the local session
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pigeon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("No command specified. Try --help");
        return Ok(());
    };

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(db) = cli.db {
        config.storage.db_path = Some(db);
    }

    let backend: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqliteStore::open(config.db_path()?)?)
    };

    let gateway = Arc::new(HttpFeedGateway::new(config.api.base_url.clone())?);
    let images = Arc::new(HttpImageSearch::new(
        config.images.endpoint.clone(),
        config.images.access_key.clone(),
        config.images.per_page,
    )?);
    let mut dash = Dashboard::new(
        ProfileStore::new(backend),
        gateway,
        images,
        SearchSettings::from(&config),
    );

    match command {
        Commands::Trending { category, page } => {
            tracing::info!("Trending {} page {}", category, page);
            let trending = dash.trending();
            let category: Category = category.parse()?;
            let state = trending.select(category, page).await;
            print_feed(&state);
        }
        Commands::Search { query } => {
            let state = dash.submit_search(&query).await?;
            print_search(&state);
        }
        Commands::History { clear } => {
            if clear {
                dash.clear_history();
                println!("Search history cleared.");
                return Ok(());
            }

            let entries = dash.history().entries();
            if entries.is_empty() {
                println!("No searches yet.");
            }
            for entry in entries {
                println!(
                    "{}  {:<40} {} results  (id {})",
                    entry
                        .created_at
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M"),
                    entry.query_text,
                    entry.result_count,
                    entry.id
                );
            }
        }
        Commands::Interests { names } => {
            if names.is_empty() {
                match dash.interests().state() {
                    ProfileState::Personalized { interests } => {
                        println!("Your interests: {}", interests.join(", "));
                        println!("Feed category: {}", dash.interests().feed_category());
                    }
                    _ => println!("No interests saved yet."),
                }
                println!("Available: {}", AVAILABLE_INTERESTS.join(", "));
            } else {
                let state = dash.replace_interests(&names).await?;
                print_feed(&state);
            }
        }
        Commands::Feed => match dash.open().await? {
            Some(state) => print_feed(&state),
            None => {
                println!("Pick some interests first, e.g.:");
                println!("  pigeon interests Technology Science");
            }
        },
        Commands::Login { email, password } => {
            let session = dash.session_mut().sign_in(&email, &password)?;
            println!("Welcome, {}", session.greeting_name());
        }
        Commands::Logout => {
            dash.logout();
            println!("Signed out.");
        }
    }

    Ok(())
}

fn print_feed(state: &RequestState<FeedResult>) {
    match state {
        RequestState::Success(result) => {
            println!(
                "== {} (page {}) ==",
                result.query.category.display_name(),
                result.query.page
            );
            if result.articles.is_empty() {
                println!("No articles on this page.");
            }
            for (i, article) in result.articles.iter().enumerate() {
                print_article(i + 1, article);
            }
        }
        RequestState::Failed(reason) => println!("{}", reason),
        RequestState::Idle | RequestState::Loading => println!("No data."),
    }
}

fn print_search(state: &RequestState<SearchResult>) {
    match state {
        RequestState::Success(result) => {
            println!("== Results for \"{}\" ==", result.query_text);
            println!("Image: {}", result.representative_image_url);
            if result.live_recommendations.is_empty() {
                println!("Nothing matched.");
            }
            for (i, article) in result.live_recommendations.iter().enumerate() {
                print_article(i + 1, article);
            }
        }
        RequestState::Failed(reason) => println!("{}", reason),
        RequestState::Idle | RequestState::Loading => println!("No data."),
    }
}

fn print_article(n: usize, article: &Article) {
    let date = article
        .published_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Recent".to_string());
    let source = if article.source.is_empty() {
        "Unknown"
    } else {
        &article.source
    };

    match article.similarity_score {
        Some(score) => println!("{:>2}. {} [{:.2}]", n, article.title, score),
        None => println!("{:>2}. {}", n, article.title),
    }
    println!("    {} | {}", source, date);
    if !article.description.is_empty() {
        println!("    {}", article.description);
    }
    println!("    {}", article.url);
}
