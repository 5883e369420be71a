//! URL handling module for Site-Digest
//!
//! Canonical URL normalization and same-site checks shared by discovery
//! and extraction.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_same_site, strip_www};
pub use normalize::{canonical_url, normalize_url};
