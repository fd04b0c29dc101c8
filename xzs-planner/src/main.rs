//! xzs-planner - terminal front end for the XZstudio topic planner
//!
//! Browses the topic backend's discovery pool and favorites, and runs the
//! five-step production workflow for one topic as an interactive session.
//!
//! Logs go to stderr (and optionally a file); stdout is reserved for the
//! planner's own output.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xzs_common::config::{self, CliOverrides, ConfigResolver, ResolvedConfig};
use xzs_common::topic::SkipReason;
use xzs_planner::address::BrowseTab;
use xzs_planner::browse::BrowsingView;
use xzs_planner::client::HttpTopicClient;
use xzs_planner::recipes::TomlRecipeSource;
use xzs_planner::theme::{FileThemeStorage, ThemeId, ThemeStore};

mod cli;

/// Command-line arguments for xzs-planner
#[derive(Parser, Debug)]
#[command(name = "xzs-planner")]
#[command(about = "Food-video topic planner for XZstudio")]
#[command(version)]
struct Args {
    /// Base URL of the topic backend
    #[arg(long, global = true, env = config::API_URL_ENV)]
    api_url: Option<String>,

    /// Folder for local preferences
    #[arg(long, global = true, env = config::DATA_FOLDER_ENV)]
    data_folder: Option<PathBuf>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List topics in a tab
    Topics {
        /// movie_food, famous_recipe, archaeological or favorites
        #[arg(long, default_value = "movie_food")]
        tab: String,

        /// Number of topics to show
        #[arg(long)]
        count: Option<usize>,
    },
    /// Run discovery and show the new pool
    Collect,
    /// Show the discovery status
    Status,
    /// Toggle favorite on a topic
    Favorite { topic_id: String },
    /// Remove a topic from its pool
    Skip {
        topic_id: String,

        /// not_interested, not_suitable, too_simple or done
        reason: String,

        /// Skip from the favorites pool
        #[arg(long)]
        favorite: bool,
    },
    /// Mark every topic of a work as done
    Done { work_name: String, dish_name: String },
    /// Show or select the theme
    Theme { theme: Option<String> },
    /// Run the production workflow for a topic
    Workflow {
        topic_id: String,

        /// Step to open (capped at the furthest step reached)
        #[arg(long, default_value_t = 0)]
        step: usize,
    },
}

fn init_tracing(resolved: &ResolvedConfig) -> Result<()> {
    let file_layer = match &resolved.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| resolved.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = match &args.config {
        Some(path) => ConfigResolver::new(config::load_or_default(Some(path.as_path()))),
        None => ConfigResolver::from_default_location(),
    };
    let resolved = resolver.resolve(&CliOverrides {
        api_base_url: args.api_url.clone(),
        data_folder: args.data_folder.clone(),
    });

    init_tracing(&resolved)?;

    info!(
        "Starting xzs-planner v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Backend: {}", resolved.api_base_url);
    info!("Data folder: {}", resolved.data_folder.display());

    let client = Arc::new(
        HttpTopicClient::new(&resolved.api_base_url).context("Invalid backend URL")?,
    );

    match args.command {
        Command::Topics { tab, count } => {
            let tab: BrowseTab = tab.parse()?;
            let view = BrowsingView::new(client);
            if let Err(e) = view.refresh_all().await {
                eprintln!("Failed to load topics: {}", e);
            }
            cli::print_page(&view.page(tab, count.unwrap_or(xzs_planner::address::PAGE_SIZE)).await);
        }
        Command::Collect => {
            let view = BrowsingView::new(client);
            view.trigger_discovery()
                .await
                .context("Discovery failed")?;
            cli::print_page(&view.page(BrowseTab::default(), usize::MAX).await);
            cli::print_status(&view.snapshot().await.status);
        }
        Command::Status => {
            let view = BrowsingView::new(client);
            view.refresh_status().await.context("Failed to fetch status")?;
            cli::print_status(&view.snapshot().await.status);
        }
        Command::Favorite { topic_id } => {
            let view = BrowsingView::new(client);
            let _ = view.refresh_all().await;
            let favorited = view.toggle_favorite(&topic_id).await?;
            println!(
                "{} {}",
                topic_id,
                if favorited { "favorited" } else { "removed from favorites" }
            );
        }
        Command::Skip {
            topic_id,
            reason,
            favorite,
        } => {
            let reason: SkipReason = reason.parse()?;
            let view = BrowsingView::new(client);
            let _ = view.refresh_all().await;
            let tab = if favorite {
                BrowseTab::Favorites
            } else {
                BrowseTab::default()
            };
            view.skip_in_tab(tab, &topic_id, reason).await?;
            println!("Skipped {} ({})", topic_id, reason.label());
        }
        Command::Done {
            work_name,
            dish_name,
        } => {
            let view = BrowsingView::new(client);
            view.mark_done(&work_name, &dish_name).await?;
            println!("Marked {} as done", work_name);
        }
        Command::Theme { theme } => {
            let mut store = ThemeStore::new(Box::new(FileThemeStorage::new(&resolved.data_folder)));
            if let Some(theme) = theme {
                let theme: ThemeId = theme.parse()?;
                store.set_theme(theme)?;
            }
            cli::print_themes(&store);
        }
        Command::Workflow { topic_id, step } => {
            let recipes = TomlRecipeSource::load(resolved.recipe_data.as_deref())
                .context("Failed to load recipe data")?;
            cli::run_workflow(client, &recipes, &topic_id, step).await?;
        }
    }

    Ok(())
}
