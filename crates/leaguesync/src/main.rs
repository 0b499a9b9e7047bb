mod cache;
mod config;
mod entities;
mod storage;
mod upstream;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use leaguesync_core::cache::CacheStore;
use leaguesync_core::record::{SecondaryKey, SubjectId};
use leaguesync_core::storage::{Repository, SubjectDirectory};
use leaguesync_core::sync::SyncEngine;

use crate::cache::{MemoryCache, RedisCache};
use crate::config::Config;
use crate::entities::{EntryStanding, EntryStandingMapper, GameweekPoints, GameweekPointsMapper};
use crate::storage::{CachedRepository, SqliteRepository};
use crate::upstream::{HttpUpstream, MemoizedUpstream, UpstreamRoute};

/// LeagueSync - sync fantasy-league scores into a local store
#[derive(Parser, Debug)]
#[command(name = "leaguesync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true)]
    db: Option<String>,

    /// Redis connection URL (in-process cache when unset)
    #[arg(long, global = true)]
    redis_url: Option<String>,

    /// Base URL of the upstream fantasy API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Season identifier, e.g. 2425
    #[arg(long, global = true)]
    season: Option<String>,

    /// Cache TTL in seconds
    #[arg(long, global = true)]
    ttl: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync gameweek points and standings for tracked entries
    Sync {
        /// Restrict the points sync to one gameweek
        #[arg(long)]
        event: Option<u32>,

        /// Sync only these entry ids instead of the tracked population
        #[arg(long = "entry")]
        entries: Vec<i64>,
    },
    /// Clear persisted records and re-sync everything from the upstream
    Refresh {
        /// Restrict the points sync to one gameweek
        #[arg(long)]
        event: Option<u32>,
    },
    /// Start tracking an entry
    AddEntry {
        /// Entry id as known to the upstream API
        id: i64,

        /// Human-readable label for the entry
        #[arg(long)]
        label: Option<String>,
    },
    /// Stop tracking an entry
    RemoveEntry {
        /// Entry id as known to the upstream API
        id: i64,
    },
    /// Show synced gameweek points
    Points {
        /// Show only one entry's points
        #[arg(long)]
        entry: Option<i64>,
    },
    /// Show the latest standings snapshot
    Standings,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leaguesync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    apply_overrides(&mut config, &cli);
    let app = App::new(&config).await?;

    match cli.command {
        Command::Sync { event, entries } => {
            let subjects = to_subjects(entries);
            let scope = event.map(SecondaryKey::from);

            let report = app.points_engine()?.sync(subjects.clone(), scope).await?;
            println!("gameweek points: {report}");

            let report = app.standings_engine()?.sync(subjects, None).await?;
            println!("standings: {report}");
        }
        Command::Refresh { event } => {
            let scope = event.map(SecondaryKey::from);

            let report = app.points_engine()?.full_refresh(None, scope).await?;
            println!("gameweek points: {report}");

            let report = app.standings_engine()?.full_refresh(None, None).await?;
            println!("standings: {report}");
        }
        Command::AddEntry { id, label } => {
            app.directory
                .register_subject(SubjectId(id), label.as_deref())
                .await?;
            println!("tracking entry {id}");
        }
        Command::RemoveEntry { id } => {
            app.directory.deregister_subject(SubjectId(id)).await?;
            println!("stopped tracking entry {id}");
        }
        Command::Points { entry } => {
            let mut records = match entry {
                Some(id) => app.points_repo.find_by_subject(SubjectId(id)).await?,
                None => app.points_repo.find_all().await?,
            };
            records.sort_by_key(|r| (r.entry, r.event));
            for record in records {
                println!(
                    "entry {} gw {}: {} pts (total {})",
                    record.entry, record.event, record.points, record.total_points
                );
            }
        }
        Command::Standings => {
            let mut records = app.standings_repo.find_all().await?;
            records.sort_by_key(|r| r.overall_rank);
            for record in records {
                println!(
                    "#{} entry {}: {} pts through gw {}",
                    record.overall_rank, record.entry, record.total_points, record.last_event
                );
            }
        }
    }

    Ok(())
}

/// Command-line flags win over environment variables.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(db) = &cli.db {
        config.sqlite_path = db.clone();
    }
    if cli.redis_url.is_some() {
        config.redis_url = cli.redis_url.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.upstream_base_url = base_url.clone();
    }
    if let Some(season) = &cli.season {
        config.season = season.clone();
    }
    if let Some(ttl) = cli.ttl {
        config.cache_ttl_seconds = ttl;
    }
}

fn to_subjects(entries: Vec<i64>) -> Option<Vec<SubjectId>> {
    if entries.is_empty() {
        None
    } else {
        Some(entries.into_iter().map(SubjectId).collect())
    }
}

/// Wired application state: one SQLite store shared by both entity kinds,
/// fronted by one cache backend.
struct App {
    directory: Arc<SqliteRepository>,
    points_repo: Arc<CachedRepository<GameweekPoints>>,
    standings_repo: Arc<CachedRepository<EntryStanding>>,
    base_url: Url,
}

impl App {
    async fn new(config: &Config) -> Result<Self> {
        let season = config.season();
        let directory =
            Arc::new(SqliteRepository::new(&config.sqlite_path, season.clone()).await?);

        let cache: Arc<dyn CacheStore> = match &config.redis_url {
            Some(url) => {
                tracing::info!("Using Redis cache");
                Arc::new(RedisCache::new(url).await?)
            }
            None => {
                tracing::info!(
                    max_entries = config.cache_max_entries,
                    "Using in-process cache"
                );
                Arc::new(MemoryCache::new(config.cache_max_entries))
            }
        };

        let points_repo = Arc::new(CachedRepository::new(
            directory.clone() as Arc<dyn Repository<GameweekPoints>>,
            cache.clone(),
            season.clone(),
            config.cache_ttl(),
        ));
        let standings_repo = Arc::new(CachedRepository::new(
            directory.clone() as Arc<dyn Repository<EntryStanding>>,
            cache,
            season,
            config.cache_ttl(),
        ));

        let base_url = Url::parse(&config.upstream_base_url)?;

        Ok(Self {
            directory,
            points_repo,
            standings_repo,
            base_url,
        })
    }

    /// Points fetches go through the memoizing wrapper: one sync run can hit
    /// the same (entry, event) endpoint from several call sites.
    fn points_engine(&self) -> Result<SyncEngine<GameweekPoints>> {
        let http = HttpUpstream::new(self.base_url.clone(), UpstreamRoute::EventPoints)?;
        let upstream = Arc::new(MemoizedUpstream::new(Arc::new(http)));
        Ok(SyncEngine::new(
            upstream,
            Arc::new(GameweekPointsMapper),
            self.points_repo.clone(),
            self.directory.clone(),
        ))
    }

    fn standings_engine(&self) -> Result<SyncEngine<EntryStanding>> {
        let http = HttpUpstream::new(self.base_url.clone(), UpstreamRoute::EntrySummary)?;
        Ok(SyncEngine::new(
            Arc::new(http),
            Arc::new(EntryStandingMapper),
            self.standings_repo.clone(),
            self.directory.clone(),
        ))
    }
}
