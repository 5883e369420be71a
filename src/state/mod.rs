//! State module for tracking extraction progress
//!
//! # Components
//!
//! - `PageState`: the lifecycle of one page (pending, fetched, rendered, accepted, rejected)
//! - `PageSlot`: a page URL paired with its state, enforcing legal transitions

mod page_state;

pub use page_state::{PageSlot, PageState};
