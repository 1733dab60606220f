//! vcsgraph - read-only query engine over a sharded git history archive
//!
//! a client library over a large, pre-sharded, read-only dataset of git
//! version-control history: commits, trees, blobs and tags, plus derived
//! relations between them and the files, authors and projects that
//! produced them. the dataset is assembled elsewhere; this crate only
//! reads it.
//!
//! # Core concepts
//!
//! - **Blob / Tree / Commit / Tag**: the four canonical git object kinds,
//!   addressed by SHA-1 and stored both as a packed sequential log and a
//!   random-access sharded hash file.
//! - **File / Author / Project**: derived entities with no wire format of
//!   their own, addressed by path, identity string, or URI respectively.
//! - **Relation**: a many-to-many edge between entity kinds (e.g. which
//!   commits touched a file), stored as a semicolon- or SHA-packed value
//!   in a sharded hash file.
//!
//! # Example usage
//!
//! ```no_run
//! use vcsgraph::{Config, Store};
//! use vcsgraph::entity::{Commit, Project};
//! use vcsgraph::Sha;
//!
//! let store = Store::open("/path/to/archive");
//!
//! let sha = Sha::from_hex("f2a7fcdc51450ab03cb364415f14e634fa69b62c").unwrap();
//! let commit = Commit::new(&store, sha);
//! let message = commit.short_message().unwrap();
//!
//! let project = Project::new(&store, "user2589_minicms".as_bytes().to_vec());
//! if let Some(head) = project.head().unwrap() {
//!     println!("{} -> {}", project.url(), head.sha());
//! }
//! ```

mod ber;
mod blob_segment;
mod config;
mod error;
mod handlepool;
mod hashfile;
mod lzf;
mod relation;
mod scan;
mod sha;
mod shard;
mod store;
mod wire;

pub mod diff;
pub mod entity;
pub mod url;

pub use config::{Config, DataKind};
pub use diff::{diff_commits, Change};
pub use error::{Error, Result};
pub use scan::{scan_all, scan_shard};
pub use sha::Sha;
pub use store::Store;
pub use url::project_url;
