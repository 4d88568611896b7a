//! Crawler coordinator - main crawl orchestration logic
//!
//! The crawl runs in breadth-first rounds. Every item of a round is handed to
//! a task on a `JoinSet`, with a `Semaphore` bounding how many run at once.
//! A round is fully drained before the next one is assembled, so a page is
//! never processed before the page that linked to it has completed.
//!
//! Each dispatched item goes through the same checks, in order:
//!
//! 1. Depth bound
//! 2. Visited-set claim (the only admission point)
//! 3. robots.txt
//! 4. Fetch
//! 5. Time filter
//! 6. Record in the sitemap and extract links for the next round

use crate::config::{Config, UndatedPolicy};
use crate::crawler::frontier::{FrontierItem, VisitedSet};
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::crawler::{build_crawl_client, fetch_url, FetchResult};
use crate::output::{CrawlStatistics, PageRecord, SitemapAccumulator, SitemapDocument};
use crate::robots::RobotsPolicy;
use crate::state::{PageState, RejectReason};
use crate::url::normalize_url;
use crate::SitemapError;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// State shared by every worker for the duration of one crawl
///
/// Only the visited set and the sitemap accumulator are mutated after setup;
/// both lock internally.
pub struct CrawlSession {
    config: Config,
    client: Client,
    start_url: Url,
    robots: RobotsPolicy,
    visited: VisitedSet,
    sitemap: SitemapAccumulator,
    extractor: Arc<dyn LinkExtractor>,
}

impl CrawlSession {
    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    pub fn robots(&self) -> &RobotsPolicy {
        &self.robots
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }
}

/// What a worker reports back for one frontier item
#[derive(Debug)]
struct ItemOutcome {
    state: PageState,
    links_found: usize,
    children: Vec<FrontierItem>,
}

impl ItemOutcome {
    fn terminal(state: PageState) -> Self {
        Self {
            state,
            links_found: 0,
            children: Vec::new(),
        }
    }
}

/// Result of a completed crawl
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Every accepted page, ready to serialize
    pub sitemap: SitemapDocument,
    pub statistics: CrawlStatistics,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    session: Arc<CrawlSession>,
}

impl Coordinator {
    /// Prepares a crawl with the default HTML link extractor
    ///
    /// Setup is the only fatal phase: an invalid configuration, an
    /// unparseable start URL or an HTTP client that cannot be built abort
    /// here, before anything is dispatched. robots.txt is loaded once at this
    /// point when enabled.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SitemapError)` - Setup failed
    pub async fn new(config: Config) -> Result<Self, SitemapError> {
        Self::with_extractor(config, Arc::new(HtmlLinkExtractor)).await
    }

    /// Prepares a crawl that uses `extractor` to discover links
    pub async fn with_extractor(
        config: Config,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Result<Self, SitemapError> {
        crate::config::validate(&config)?;

        let start_url = normalize_url(&config.site.start_url)?;

        let client = build_crawl_client(
            &config.user_agent.client_identifier,
            config.crawler.request_timeout(),
            &config.site.domain,
        )?;

        let robots = if config.crawler.respect_robots_txt {
            RobotsPolicy::initialize(&client, &start_url).await
        } else {
            tracing::info!("robots.txt checking disabled");
            RobotsPolicy::Disabled
        };

        Ok(Self {
            session: Arc::new(CrawlSession {
                config,
                client,
                start_url,
                robots,
                visited: VisitedSet::new(),
                sitemap: SitemapAccumulator::new(),
                extractor,
            }),
        })
    }

    pub fn session(&self) -> &CrawlSession {
        &self.session
    }

    /// Runs the crawl to completion
    ///
    /// Rounds continue until the next frontier is empty or the optional crawl
    /// deadline has passed. Individual page failures never fail the run.
    pub async fn run(self) -> Result<CrawlOutcome, SitemapError> {
        let session = self.session;
        let crawler = &session.config.crawler;

        tracing::info!(
            "Starting crawl of {} (max depth {}, {} workers)",
            session.start_url,
            crawler.max_depth,
            crawler.max_workers
        );

        let started = Instant::now();
        let deadline = crawler.max_crawl_duration().map(|budget| started + budget);
        let semaphore = Arc::new(Semaphore::new(crawler.max_workers as usize));
        let mut stats = CrawlStatistics::new();

        let mut frontier = vec![FrontierItem::new(session.start_url.as_str(), 0)];

        while !frontier.is_empty() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                tracing::warn!(
                    "Crawl time budget exhausted, {} URLs left unvisited",
                    frontier.len()
                );
                stats.deadline_reached = true;
                break;
            }

            stats.rounds += 1;
            let depth = frontier.iter().map(|item| item.depth).max().unwrap_or(0);
            stats.max_depth_reached = stats.max_depth_reached.max(depth);
            tracing::info!(
                "Round {}: dispatching {} URLs at depth {}",
                stats.rounds,
                frontier.len(),
                depth
            );

            frontier = run_round(&session, &semaphore, frontier, &mut stats).await?;
        }

        stats.elapsed = started.elapsed();
        stats.log_summary();

        Ok(CrawlOutcome {
            sitemap: session.sitemap.finish(),
            statistics: stats,
        })
    }
}

/// Dispatches one round and assembles the next round's frontier
///
/// Children found by several workers are queued once.
async fn run_round(
    session: &Arc<CrawlSession>,
    semaphore: &Arc<Semaphore>,
    items: Vec<FrontierItem>,
    stats: &mut CrawlStatistics,
) -> Result<Vec<FrontierItem>, SitemapError> {
    let mut tasks = JoinSet::new();

    for item in items {
        let permit = Arc::clone(semaphore)
            .acquire_owned()
            .await
            .map_err(|e| SitemapError::Worker(e.to_string()))?;
        let session = Arc::clone(session);
        tasks.spawn(async move {
            let _permit = permit;
            process_item(&session, item).await
        });
    }

    let mut queued = HashSet::new();
    let mut next = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => {
                stats.record_state(outcome.state);
                stats.links_discovered += outcome.links_found as u64;
                for child in outcome.children {
                    if queued.insert(child.url.clone()) {
                        next.push(child);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Worker task failed: {}", e);
                stats.record_state(PageState::Failed);
            }
        }
    }

    Ok(next)
}

/// Processes a single frontier item through to its terminal state
async fn process_item(session: &CrawlSession, item: FrontierItem) -> ItemOutcome {
    let config = &session.config;

    if item.depth > config.crawler.max_depth {
        tracing::debug!("Skipping {}: depth {} exceeds limit", item.url, item.depth);
        return ItemOutcome::terminal(PageState::Rejected(RejectReason::DepthExceeded));
    }

    if !session.visited.insert(&item.url) {
        tracing::trace!("Skipping {}: already visited", item.url);
        return ItemOutcome::terminal(PageState::Rejected(RejectReason::AlreadyVisited));
    }

    let url = match Url::parse(&item.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Cannot parse frontier URL {}: {}", item.url, e);
            return ItemOutcome::terminal(PageState::Failed);
        }
    };

    if !session
        .robots
        .can_fetch(&url, &config.user_agent.client_identifier)
    {
        tracing::info!("URL {} disallowed by robots.txt", url);
        return ItemOutcome::terminal(PageState::Rejected(RejectReason::RobotsDenied));
    }

    tracing::debug!("Fetching {} (depth {})", url, item.depth);

    let (body, last_modified) = match fetch_url(&session.client, url.as_str()).await {
        FetchResult::Success {
            body,
            last_modified,
        } => (body, last_modified),
        failure => {
            tracing::error!("Failed to fetch {}: {}", url, failure);
            return ItemOutcome::terminal(PageState::Failed);
        }
    };

    let last_modified = match resolve_last_modified(config, last_modified) {
        Ok(timestamp) => timestamp,
        Err(reason) => {
            tracing::debug!("Excluding {}: {}", url, reason.as_str());
            return ItemOutcome::terminal(PageState::Rejected(reason));
        }
    };

    session
        .sitemap
        .record(PageRecord::new(url.as_str(), last_modified));
    tracing::debug!("Accepted {}", url);

    let links = session
        .extractor
        .extract(&body, &url, &config.site.domain);
    let links_found = links.len();

    let children = if item.depth < config.crawler.max_depth {
        links
            .into_iter()
            .filter(|link| !session.visited.contains(link))
            .map(|link| item.child(link))
            .collect()
    } else {
        Vec::new()
    };

    ItemOutcome {
        state: PageState::Accepted,
        links_found,
        children,
    }
}

/// Applies the undated-page policy and the time filter
///
/// Returns the timestamp to record, or the reason the page is excluded. A page
/// passes the filter only if it was modified strictly after the threshold.
fn resolve_last_modified(
    config: &Config,
    last_modified: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>, RejectReason> {
    let filter = &config.filter;

    let timestamp = match last_modified {
        Some(timestamp) => timestamp,
        None if filter.use_time_filter && filter.undated_pages == UndatedPolicy::Exclude => {
            return Err(RejectReason::Undated);
        }
        None => Utc::now(),
    };

    if filter.use_time_filter && timestamp <= filter.threshold {
        return Err(RejectReason::NotModifiedSince);
    }

    Ok(timestamp)
}

/// Runs the main crawl operation
///
/// # Example
///
/// ```no_run
/// use site_sitemap::config::load_config;
/// use site_sitemap::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sitemap.toml"))?;
/// let outcome = run_crawl(config).await?;
/// println!("{} pages accepted", outcome.sitemap.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlOutcome, SitemapError> {
    let coordinator = Coordinator::new(config).await?;
    coordinator.run().await
}
