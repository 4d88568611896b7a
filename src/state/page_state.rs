/// Page state definitions for tracking frontier items through the crawl
///
/// Every frontier item moves `Pending -> Dispatched` and then ends in exactly
/// one terminal state: `Accepted`, `Rejected` or `Failed`.
use std::fmt;

/// Why a dispatched item was rejected without being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Item depth is beyond the configured maximum
    DepthExceeded,
    /// Another item already claimed this normalized URL
    AlreadyVisited,
    /// robots.txt disallows the URL for our client identifier
    RobotsDenied,
    /// Page was not modified after the time filter threshold
    NotModifiedSince,
    /// Page had no usable Last-Modified header and undated pages are excluded
    Undated,
}

impl RejectReason {
    /// Returns true if the page was fetched before being rejected
    pub fn was_fetched(&self) -> bool {
        matches!(self, Self::NotModifiedSince | Self::Undated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepthExceeded => "depth_exceeded",
            Self::AlreadyVisited => "already_visited",
            Self::RobotsDenied => "robots_denied",
            Self::NotModifiedSince => "not_modified_since",
            Self::Undated => "undated",
        }
    }

    /// Returns all rejection reasons
    pub fn all() -> [Self; 5] {
        [
            Self::DepthExceeded,
            Self::AlreadyVisited,
            Self::RobotsDenied,
            Self::NotModifiedSince,
            Self::Undated,
        ]
    }
}

/// Represents the current state of a frontier item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Item is queued in the frontier for the next round
    Pending,

    /// Item has been handed to a worker
    Dispatched,

    // ===== Terminal States =====
    /// Page was fetched, passed all filters and recorded in the sitemap
    Accepted,

    /// Page was skipped by the depth, dedup, robots or time rules
    Rejected(RejectReason),

    /// Fetch failed (network error, timeout, non-200 status)
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (item may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Dispatched)
    }

    /// Returns true if the page produced a sitemap record
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns true if this represents a fetch failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns true if an HTTP request for the page itself was issued
    pub fn was_fetched(&self) -> bool {
        match self {
            Self::Accepted | Self::Failed => true,
            Self::Rejected(reason) => reason.was_fetched(),
            Self::Pending | Self::Dispatched => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispatched => "dispatched",
            Self::Accepted => "accepted",
            Self::Rejected(reason) => reason.as_str(),
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "rejected ({})", reason.as_str()),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!PageState::Pending.is_terminal());
        assert!(!PageState::Dispatched.is_terminal());

        assert!(PageState::Accepted.is_terminal());
        assert!(PageState::Failed.is_terminal());
        for reason in RejectReason::all() {
            assert!(PageState::Rejected(reason).is_terminal());
        }
    }

    #[test]
    fn test_is_success() {
        assert!(PageState::Accepted.is_success());

        assert!(!PageState::Pending.is_success());
        assert!(!PageState::Failed.is_success());
        assert!(!PageState::Rejected(RejectReason::RobotsDenied).is_success());
    }

    #[test]
    fn test_is_error() {
        assert!(PageState::Failed.is_error());
        assert!(!PageState::Accepted.is_error());
        assert!(!PageState::Rejected(RejectReason::DepthExceeded).is_error());
    }

    #[test]
    fn test_was_fetched() {
        assert!(PageState::Accepted.was_fetched());
        assert!(PageState::Failed.was_fetched());
        assert!(PageState::Rejected(RejectReason::NotModifiedSince).was_fetched());
        assert!(PageState::Rejected(RejectReason::Undated).was_fetched());

        assert!(!PageState::Rejected(RejectReason::DepthExceeded).was_fetched());
        assert!(!PageState::Rejected(RejectReason::AlreadyVisited).was_fetched());
        assert!(!PageState::Rejected(RejectReason::RobotsDenied).was_fetched());
        assert!(!PageState::Dispatched.was_fetched());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PageState::Pending), "pending");
        assert_eq!(format!("{}", PageState::Accepted), "accepted");
        assert_eq!(
            format!("{}", PageState::Rejected(RejectReason::RobotsDenied)),
            "rejected (robots_denied)"
        );
    }

    #[test]
    fn test_reject_reason_strings_unique() {
        let all = RejectReason::all();
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert_ne!(all[i].as_str(), all[j].as_str());
            }
        }
    }
}
