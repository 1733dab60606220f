use crate::config::DataKind;
use crate::entity::{Commit, Entity, Kind};
use crate::error::Result;
use crate::relation;
use crate::sha::Sha;
use crate::store::Store;

/// the exact `Name <email>` byte string as it appears in commit headers
pub struct Author<'s> {
    store: &'s Store,
    name: Vec<u8>,
}

impl<'s> Author<'s> {
    pub fn new(store: &'s Store, name: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn commit_shas(&self) -> Result<Vec<Sha>> {
        match self
            .store
            .lookup_by_key(DataKind::AuthorCommits, &self.name)?
        {
            Some(raw) => Ok(relation::decode_sha_list(&raw)),
            None => Ok(Vec::new()),
        }
    }

    pub fn commits(&self) -> Result<Vec<Commit<'s>>> {
        Ok(self
            .commit_shas()?
            .into_iter()
            .map(|sha| Commit::new(self.store, sha))
            .collect())
    }

    pub fn project_names(&self) -> Result<Vec<Vec<u8>>> {
        match self
            .store
            .lookup_by_key(DataKind::AuthorProjects, &self.name)?
        {
            Some(raw) => relation::decode_byte_list(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// every author known to the `author_commits` relation, discovered by
    /// an empty-prefix scan across all shards of that family
    pub fn all(store: &'s Store) -> Result<Vec<Author<'s>>> {
        Ok(store
            .scan_all_keys(DataKind::AuthorCommits)?
            .into_iter()
            .map(|(name, _)| Author::new(store, name))
            .collect())
    }
}

impl<'s> Entity for Author<'s> {
    fn kind(&self) -> Kind {
        Kind::Author
    }

    fn key_bytes(&self) -> &[u8] {
        &self.name
    }
}

impl<'s> PartialEq for Author<'s> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
