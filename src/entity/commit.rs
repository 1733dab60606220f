use std::sync::OnceLock;

use crate::config::DataKind;
use crate::entity::{Entity, Kind, Tree};
use crate::error::Result;
use crate::relation;
use crate::sha::Sha;
use crate::store::Store;
use crate::wire::commit as wire;

/// a git commit: a tree snapshot plus metadata. identity is the SHA-1 of
/// `"commit " <len> NUL <header+message>"`.
pub struct Commit<'s> {
    store: &'s Store,
    sha: Sha,
    data: OnceLock<Vec<u8>>,
    parsed: OnceLock<wire::Commit>,
}

impl<'s> Commit<'s> {
    pub fn new(store: &'s Store, sha: Sha) -> Self {
        Self {
            store,
            sha,
            data: OnceLock::new(),
            parsed: OnceLock::new(),
        }
    }

    pub fn sha(&self) -> Sha {
        self.sha
    }

    pub fn data(&self) -> Result<&[u8]> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }
        let raw = self
            .store
            .lookup_by_sha(DataKind::CommitRandom, &self.sha)?
            .ok_or_else(|| crate::error::Error::NotFound(format!("commit {}", self.sha)))?;
        let decoded = crate::lzf::decode(&raw)?;
        Ok(self.data.get_or_init(|| decoded))
    }

    fn header(&self) -> Result<&wire::Commit> {
        if let Some(parsed) = self.parsed.get() {
            return Ok(parsed);
        }
        let parsed = wire::parse(&self.sha, self.data()?)?;
        Ok(self.parsed.get_or_init(|| parsed))
    }

    pub fn tree(&self) -> Result<Tree<'s>> {
        Ok(Tree::new(self.store, self.header()?.tree))
    }

    pub fn parent_shas(&self) -> Result<Vec<Sha>> {
        Ok(self.header()?.parents.clone())
    }

    pub fn parents(&self) -> Result<Vec<Commit<'s>>> {
        Ok(self
            .parent_shas()?
            .into_iter()
            .map(|sha| Commit::new(self.store, sha))
            .collect())
    }

    pub fn author(&self) -> Result<&[u8]> {
        Ok(&self.header()?.author.raw)
    }

    pub fn committer(&self) -> Result<&[u8]> {
        Ok(&self.header()?.committer.raw)
    }

    pub fn authored_at(&self) -> Result<wire::Timestamp> {
        Ok(self.header()?.author.timestamp)
    }

    pub fn committed_at(&self) -> Result<wire::Timestamp> {
        Ok(self.header()?.committer.timestamp)
    }

    pub fn signature(&self) -> Result<Option<&[u8]>> {
        Ok(self.header()?.signature.as_deref())
    }

    pub fn message(&self) -> Result<&[u8]> {
        Ok(&self.header()?.message)
    }

    pub fn short_message(&self) -> Result<&[u8]> {
        Ok(self.header()?.short_message())
    }

    /// the blobs reachable from this commit's tree — always derived from
    /// the flattened tree, never from the dataset's deprecated direct
    /// `commit_blobs` relation (known to miss every first file in every
    /// tree; not exposed by this crate at all)
    pub fn blob_shas(&self) -> Result<Vec<Sha>> {
        self.tree()?.blob_shas()
    }

    pub fn project_names(&self) -> Result<Vec<Vec<u8>>> {
        match self
            .store
            .lookup_by_sha(DataKind::CommitProjects, &self.sha)?
        {
            Some(raw) => relation::decode_byte_list(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// the `(time, author)` pair recorded for this commit in the
    /// `commit_time_author` relation, as two raw byte-string fields —
    /// distinct from `authored_at`/`author`, which come from parsing the
    /// commit header itself rather than this derived relation.
    pub fn time_author(&self) -> Result<Vec<Vec<u8>>> {
        match self
            .store
            .lookup_by_sha(DataKind::CommitTimeAuthor, &self.sha)?
        {
            Some(raw) => relation::decode_byte_list(&raw),
            None => Ok(Vec::new()),
        }
    }

    pub fn child_shas(&self) -> Result<Vec<Sha>> {
        match self
            .store
            .lookup_by_sha(DataKind::CommitChildren, &self.sha)?
        {
            Some(raw) => Ok(relation::decode_sha_list(&raw)),
            None => Ok(Vec::new()),
        }
    }

    pub fn changed_file_names(&self) -> Result<Vec<Vec<u8>>> {
        match self.store.lookup_by_sha(DataKind::CommitFiles, &self.sha)? {
            Some(raw) => relation::decode_byte_list(&raw),
            None => Ok(Vec::new()),
        }
    }
}

impl<'s> Entity for Commit<'s> {
    fn kind(&self) -> Kind {
        Kind::Commit
    }

    fn key_bytes(&self) -> &[u8] {
        self.sha.as_bytes()
    }
}

impl<'s> PartialEq for Commit<'s> {
    fn eq(&self, other: &Self) -> bool {
        self.sha == other.sha
    }
}
