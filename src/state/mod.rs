//! State module for tracking crawl progress
//!
//! - `PageState`: the lifecycle of a single frontier item
//! - `RejectReason`: which admission rule turned a dispatched item away

mod page_state;

// Re-export main types
pub use page_state::{PageState, RejectReason};
