use crate::config::DataKind;
use crate::entity::{Commit, Entity, Kind};
use crate::error::Result;
use crate::relation;
use crate::sha::Sha;
use crate::store::Store;

/// an arbitrary byte path from a tree root (no leading slash,
/// forward-slash separated). identity is the exact path bytes.
pub struct File<'s> {
    store: &'s Store,
    path: Vec<u8>,
}

impl<'s> File<'s> {
    pub fn new(store: &'s Store, path: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &[u8] {
        &self.path
    }

    /// commits that changed this path. this relation considers only diffs
    /// against the first parent, which substantially limits its coverage
    /// of merge commits — carried over from the upstream archive's own
    /// documented caveat on this relation.
    pub fn commit_shas(&self) -> Result<Vec<Sha>> {
        match self.store.lookup_by_key(DataKind::FileCommits, &self.path)? {
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

    /// every path known to the `file_commits` relation, discovered by an
    /// empty-prefix scan across all shards of that family
    pub fn all(store: &'s Store) -> Result<Vec<File<'s>>> {
        Ok(store
            .scan_all_keys(DataKind::FileCommits)?
            .into_iter()
            .map(|(path, _)| File::new(store, path))
            .collect())
    }
}

impl<'s> Entity for File<'s> {
    fn kind(&self) -> Kind {
        Kind::File
    }

    fn key_bytes(&self) -> &[u8] {
        &self.path
    }
}

impl<'s> PartialEq for File<'s> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hashfile::HashFileBuilder;
    use crate::shard;

    #[test]
    fn missing_relation_yields_empty_commits() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(Config::new(dir.path()));
        let file = File::new(&store, b"src/lib.rs".to_vec());
        assert!(file.commit_shas().unwrap().is_empty());
    }

    #[test]
    fn all_scans_every_shard_of_file_commits() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(Config::new(dir.path()));

        let key = b"src/lib.rs";
        let bits = store.config().spec(DataKind::FileCommits).bits;
        let shard_index = shard::shard_index_for_key(key, bits);
        let shard_path = store.shard_path(DataKind::FileCommits, shard_index);
        std::fs::create_dir_all(shard_path.parent().unwrap()).unwrap();
        let mut builder = HashFileBuilder::new(4);
        builder.insert(key.to_vec(), Vec::new());
        builder.write(&shard_path).unwrap();

        let all = File::all(&store).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].path(), key);
    }
}
