//! Package discovery and versioning
//!
//! This module turns a `node_modules` style directory into a frozen
//! [`Registry`]: the catalog finds packages and their ES module entry
//! files, the version resolver pins each one to a version.

mod catalog;
mod manifest;
mod registry;
mod version;

pub use catalog::{PackageCandidate, scan};
pub use manifest::{MANIFEST_FILE, Manifest};
pub use registry::{PackageInfo, Registry};
pub use version::{content_version, encode_base62, resolve, resolve_all};
