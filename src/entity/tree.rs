use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::config::DataKind;
use crate::entity::{Entity, Kind};
use crate::error::Result;
use crate::sha::Sha;
use crate::store::Store;
use crate::wire::tree as wire;

/// a directory listing: `(mode, name, child-sha)` triples, possibly
/// recursing into subtrees (mode `"40000"`).
pub struct Tree<'s> {
    store: &'s Store,
    sha: Sha,
    data: OnceLock<Vec<u8>>,
    flattened: OnceLock<BTreeMap<Vec<u8>, Sha>>,
}

impl<'s> Tree<'s> {
    pub fn new(store: &'s Store, sha: Sha) -> Self {
        Self {
            store,
            sha,
            data: OnceLock::new(),
            flattened: OnceLock::new(),
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
            .lookup_by_sha(DataKind::TreeRandom, &self.sha)?
            .ok_or_else(|| crate::error::Error::NotFound(format!("tree {}", self.sha)))?;
        let decoded = crate::lzf::decode(&raw)?;
        Ok(self.data.get_or_init(|| decoded))
    }

    /// the tree's immediate entries (not recursed)
    pub fn entries(&self) -> Result<Vec<wire::Entry>> {
        wire::parse_entries(self.data()?)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn contains_blob(&self, sha: &Sha) -> Result<bool> {
        Ok(self.blob_shas()?.contains(sha))
    }

    /// recursively expand the tree, fetching subtrees through the store
    pub fn traverse(&self) -> Result<Vec<wire::TraversedEntry>> {
        let store = self.store;
        let mut fetch = |sha: &Sha| -> Result<Vec<u8>> {
            let raw = store
                .lookup_by_sha(DataKind::TreeRandom, sha)?
                .ok_or_else(|| crate::error::Error::NotFound(format!("tree {sha}")))?;
            crate::lzf::decode(&raw)
        };
        wire::traverse(&self.sha, self.data()?, &mut fetch)
    }

    /// every path reachable in this tree, excluding subtrees themselves,
    /// mapped to the blob it names
    pub fn files(&self) -> Result<&BTreeMap<Vec<u8>, Sha>> {
        if let Some(map) = self.flattened.get() {
            return Ok(map);
        }
        let mut map = BTreeMap::new();
        for traversed in self.traverse()? {
            if !traversed.entry.is_subtree() {
                map.insert(traversed.path, traversed.entry.sha);
            }
        }
        Ok(self.flattened.get_or_init(|| map))
    }

    pub fn blob_shas(&self) -> Result<Vec<Sha>> {
        Ok(self.files()?.values().copied().collect())
    }
}

impl<'s> Entity for Tree<'s> {
    fn kind(&self) -> Kind {
        Kind::Tree
    }

    fn key_bytes(&self) -> &[u8] {
        self.sha.as_bytes()
    }
}

impl<'s> PartialEq for Tree<'s> {
    fn eq(&self, other: &Self) -> bool {
        self.sha == other.sha
    }
}
