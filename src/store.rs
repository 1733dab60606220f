use std::path::PathBuf;

use crate::config::{Config, DataKind};
use crate::error::Result;
use crate::handlepool::HandlePool;
use crate::hashfile;
use crate::shard::{self, ShardSpec};

/// the entry point every entity reads through: binds a `Config` to a
/// process-lifetime handle pool. construct one per archive root, share it
/// by reference across every query.
pub struct Store {
    config: Config,
    pool: HandlePool,
}

impl Store {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            pool: HandlePool::new(),
        }
    }

    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(Config::new(root))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &HandlePool {
        &self.pool
    }

    fn spec_and_path(&self, kind: DataKind, shard_index: u32) -> (ShardSpec, PathBuf) {
        let spec = self.config.spec(kind);
        let family = self.config.family(kind);
        let root = self.config.root_for(family);
        let path = shard::resolve_path(root, &spec, shard_index);
        (spec, path)
    }

    /// point lookup into a `.tch`-style hash file family, keyed on a
    /// git-object SHA
    pub fn lookup_by_sha(&self, kind: DataKind, sha: &crate::sha::Sha) -> Result<Option<Vec<u8>>> {
        let bits = self.config.spec(kind).bits;
        let shard_index = shard::shard_index_for_sha(sha, bits);
        self.lookup_raw(kind, shard_index, sha.as_bytes())
    }

    /// point lookup into a `.tch`-style hash file family, keyed on an
    /// arbitrary derived key (file path, author string, project URI)
    pub fn lookup_by_key(&self, kind: DataKind, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let spec = self.config.spec(kind);
        let shard_index = shard::shard_index_for_key(key, spec.bits);
        self.lookup_raw(kind, shard_index, key)
    }

    fn lookup_raw(&self, kind: DataKind, shard_index: u32, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let (_, path) = self.spec_and_path(kind, shard_index);
        if !path.exists() {
            return Ok(None);
        }
        let handle = self.pool.get(&path)?;
        hashfile::lookup(&handle, key)
    }

    /// prefix scan across a single shard of a derived-key family
    pub fn scan_prefix(
        &self,
        kind: DataKind,
        shard_index: u32,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let (_, path) = self.spec_and_path(kind, shard_index);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let handle = self.pool.get(&path)?;
        hashfile::scan_prefix(&handle, prefix)
    }

    /// resolve the on-disk path for a data family and shard index, for
    /// callers that need to open it directly (blob segment reads, sequential
    /// scans)
    pub fn shard_path(&self, kind: DataKind, shard_index: u32) -> PathBuf {
        self.spec_and_path(kind, shard_index).1
    }

    pub fn shard_count(&self, kind: DataKind) -> u32 {
        self.config.spec(kind).shard_count()
    }

    /// enumerate every key in a derived-key family by prefix-scanning
    /// (with an empty prefix) across all `2^B` shards in turn
    pub fn scan_all_keys(&self, kind: DataKind) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        for shard_index in 0..self.shard_count(kind) {
            out.extend(self.scan_prefix(kind, shard_index, b"")?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashfile::HashFileBuilder;
    use crate::sha::Sha;

    #[test]
    fn lookup_by_sha_reads_through_resolved_shard() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path());

        let sha = Sha::from_bytes({
            let mut b = [0u8; 20];
            b[0] = 0x02; // shard index 2 at 7 bits
            b
        });
        let shard_path = store.shard_path(DataKind::CommitRandom, 2);
        std::fs::create_dir_all(shard_path.parent().unwrap()).unwrap();
        let mut builder = HashFileBuilder::new(4);
        builder.insert(sha.as_bytes().to_vec(), b"commit-bytes".to_vec());
        builder.write(&shard_path).unwrap();

        let value = store.lookup_by_sha(DataKind::CommitRandom, &sha).unwrap();
        assert_eq!(value, Some(b"commit-bytes".to_vec()));
    }

    #[test]
    fn lookup_missing_shard_file_is_not_found_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path());
        let sha = Sha::ZERO;
        let value = store.lookup_by_sha(DataKind::CommitRandom, &sha).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn lookup_by_key_uses_fnv_sharding() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path());

        let key = b"user2589_minicms";
        let shard_index = shard::shard_index_for_key(key, store.config.spec(DataKind::ProjectCommits).bits);
        let shard_path = store.shard_path(DataKind::ProjectCommits, shard_index);
        std::fs::create_dir_all(shard_path.parent().unwrap()).unwrap();
        let mut builder = HashFileBuilder::new(4);
        builder.insert(key.to_vec(), b"some-commits".to_vec());
        builder.write(&shard_path).unwrap();

        let value = store
            .lookup_by_key(DataKind::ProjectCommits, key)
            .unwrap();
        assert_eq!(value, Some(b"some-commits".to_vec()));
    }

    #[test]
    fn scan_all_keys_aggregates_across_shards() {
        use std::collections::HashMap;

        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path());
        let bits = store.config.spec(DataKind::AuthorCommits).bits;

        let entries: [(&[u8], &[u8]); 2] = [(b"alice", b"a-commits"), (b"bob", b"b-commits")];
        let mut by_shard: HashMap<u32, Vec<(&[u8], &[u8])>> = HashMap::new();
        for (key, value) in entries {
            by_shard
                .entry(shard::shard_index_for_key(key, bits))
                .or_default()
                .push((key, value));
        }
        for (shard_index, shard_entries) in by_shard {
            let shard_path = store.shard_path(DataKind::AuthorCommits, shard_index);
            std::fs::create_dir_all(shard_path.parent().unwrap()).unwrap();
            let mut builder = HashFileBuilder::new(4);
            for (key, value) in shard_entries {
                builder.insert(key.to_vec(), value.to_vec());
            }
            builder.write(&shard_path).unwrap();
        }

        let mut all = store.scan_all_keys(DataKind::AuthorCommits).unwrap();
        all.sort();
        assert_eq!(
            all,
            vec![
                (b"alice".to_vec(), b"a-commits".to_vec()),
                (b"bob".to_vec(), b"b-commits".to_vec()),
            ]
        );
    }
}
