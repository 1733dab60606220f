use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};
use crate::shard::{KeyKind, ShardSpec};

/// identifies one on-disk data family: a git object kind, or a named
/// relation between two entity kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataKind {
    CommitSequential,
    TreeSequential,
    CommitRandom,
    TreeRandom,
    BlobOffset,
    BlobData,
    CommitProjects,
    CommitChildren,
    CommitFiles,
    CommitTimeAuthor,
    ProjectCommits,
    ProjectAuthors,
    AuthorCommits,
    AuthorProjects,
    BlobCommits,
    BlobFiles,
    BlobAuthors,
    FileCommits,
}

/// the fixed table of on-disk path templates, bound to a configurable root.
///
/// mirrors the producing pipeline's layout (see the external-interfaces
/// path table); the root override lets a deployment relocate the `.tch`
/// random-access family onto faster storage than the sequential `.bin`
/// family, the same `/fast` vs `/data` split the pipeline itself uses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// filesystem root the path templates are resolved under
    pub root: PathBuf,
    /// per-family root overrides (e.g. moving `.tch` files to `/fast`)
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub root_overrides: std::collections::BTreeMap<String, PathBuf>,
}

impl Config {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            root_overrides: std::collections::BTreeMap::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }

    /// effective root for a given family, honouring `root_overrides`
    pub fn root_for(&self, family: &str) -> &Path {
        self.root_overrides
            .get(family)
            .map(PathBuf::as_path)
            .unwrap_or(&self.root)
    }

    pub fn spec(&self, kind: DataKind) -> ShardSpec {
        use DataKind::*;
        match kind {
            CommitSequential => {
                ShardSpec::new("/data/All.blobs/commit_{key}", 7, KeyKind::GitObject)
            }
            TreeSequential => ShardSpec::new("/data/All.blobs/tree_{key}", 7, KeyKind::GitObject),
            CommitRandom => ShardSpec::new("/fast/All.sha1c/commit_{key}.tch", 7, KeyKind::GitObject),
            TreeRandom => ShardSpec::new("/fast/All.sha1c/tree_{key}.tch", 7, KeyKind::GitObject),
            BlobOffset => {
                ShardSpec::new("/fast/All.sha1o/sha1.blob_{key}.tch", 7, KeyKind::GitObject)
            }
            BlobData => ShardSpec::new("/data/All.blobs/blob_{key}.bin", 7, KeyKind::GitObject),
            CommitProjects => ShardSpec::new("/fast/c2pFullP.{key}.tch", 5, KeyKind::GitObject),
            CommitChildren => ShardSpec::new("/fast/c2ccFullP.{key}.tch", 5, KeyKind::GitObject),
            CommitFiles => ShardSpec::new("/fast/c2fFullP.{key}.tch", 5, KeyKind::GitObject),
            CommitTimeAuthor => ShardSpec::new("/fast/c2taFullP.{key}.tch", 5, KeyKind::GitObject),
            ProjectCommits => ShardSpec::new("/fast/p2cFullP.{key}.tch", 5, KeyKind::Derived),
            ProjectAuthors => ShardSpec::new("/fast/p2aFullP.{key}.tch", 5, KeyKind::Derived),
            AuthorCommits => ShardSpec::new("/fast/a2cFullP.{key}.tch", 5, KeyKind::Derived),
            AuthorProjects => ShardSpec::new("/fast/a2pFullP.{key}.tch", 5, KeyKind::Derived),
            BlobCommits => ShardSpec::new("/fast/b2cFullP.{key}.tch", 5, KeyKind::GitObject),
            BlobFiles => ShardSpec::new("/fast/b2fFullP.{key}.tch", 5, KeyKind::GitObject),
            BlobAuthors => ShardSpec::new("/fast/b2aFullP.{key}.tch", 5, KeyKind::GitObject),
            FileCommits => ShardSpec::new("/fast/f2cFullP.{key}.tch", 5, KeyKind::Derived),
        }
    }

    /// family name used as the `root_overrides` key for a given data kind;
    /// groups kinds by the path prefix the pipeline actually separates
    /// storage tiers on (`/data` sequential vs `/fast` random-access)
    pub fn family(&self, kind: DataKind) -> &'static str {
        use DataKind::*;
        match kind {
            CommitSequential | TreeSequential | BlobData => "data",
            _ => "fast",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}
