//! Crawl statistics
//!
//! Counters are tallied by the coordinator as each worker reports its page's
//! terminal state, then logged and printed once the crawl has drained.

use crate::state::{PageState, RejectReason};
use std::collections::HashMap;
use std::time::Duration;

/// Summary of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Frontier items handed to a worker
    pub dispatched: u64,

    /// Pages recorded in the sitemap
    pub accepted: u64,

    /// Rejections broken down by reason
    pub rejected: HashMap<RejectReason, u64>,

    /// Fetches that did not return HTTP 200
    pub failed: u64,

    /// Same-domain links returned by the extractor, before de-duplication
    pub links_discovered: u64,

    /// Breadth-first rounds that were started
    pub rounds: u32,

    /// Deepest level that produced at least one dispatch
    pub max_depth_reached: u32,

    /// Whether the crawl stopped early because its time budget ran out
    pub deadline_reached: bool,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tallies the terminal state of one dispatched item
    pub fn record_state(&mut self, state: PageState) {
        self.dispatched += 1;
        match state {
            PageState::Accepted => self.accepted += 1,
            PageState::Rejected(reason) => *self.rejected.entry(reason).or_insert(0) += 1,
            PageState::Failed => self.failed += 1,
            PageState::Pending | PageState::Dispatched => {
                tracing::debug!("Non-terminal state {} reported by worker", state);
            }
        }
    }

    pub fn rejected_for(&self, reason: RejectReason) -> u64 {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum()
    }

    /// Pages whose body was actually downloaded with HTTP 200
    pub fn pages_fetched(&self) -> u64 {
        self.accepted
            + RejectReason::all()
                .iter()
                .filter(|reason| reason.was_fetched())
                .map(|reason| self.rejected_for(*reason))
                .sum::<u64>()
    }

    /// Emits the summary through `tracing`
    pub fn log_summary(&self) {
        tracing::info!(
            "Crawl finished in {:.2?}: {} dispatched, {} accepted, {} rejected, {} failed over {} rounds",
            self.elapsed,
            self.dispatched,
            self.accepted,
            self.total_rejected(),
            self.failed,
            self.rounds
        );
        if self.deadline_reached {
            tracing::warn!("Crawl time budget exhausted; the sitemap may be incomplete");
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages dispatched: {}", stats.dispatched);
    println!("  Pages fetched: {}", stats.pages_fetched());
    println!("  Links discovered: {}", stats.links_discovered);
    println!("  Rounds: {}", stats.rounds);
    println!("  Deepest level: {}", stats.max_depth_reached);
    println!("  Elapsed: {:.2?}", stats.elapsed);
    println!();

    println!("Outcomes:");
    let percentage = |count: u64| {
        if stats.dispatched > 0 {
            (count as f64 / stats.dispatched as f64) * 100.0
        } else {
            0.0
        }
    };
    println!("  accepted: {} ({:.1}%)", stats.accepted, percentage(stats.accepted));
    for reason in RejectReason::all() {
        let count = stats.rejected_for(reason);
        if count > 0 {
            println!("  rejected ({}): {} ({:.1}%)", reason.as_str(), count, percentage(count));
        }
    }
    println!("  failed: {} ({:.1}%)", stats.failed, percentage(stats.failed));
    println!();

    if stats.deadline_reached {
        println!("Crawl stopped at its time budget; remaining frontier was not visited.");
        println!();
    }

    println!(
        "Sitemap entries: {} / {} pages dispatched",
        stats.accepted, stats.dispatched
    );
}
