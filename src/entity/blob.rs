use std::sync::OnceLock;

use crate::blob_segment;
use crate::config::DataKind;
use crate::entity::{Entity, Kind};
use crate::error::Result;
use crate::relation;
use crate::sha::Sha;
use crate::store::Store;

/// immutable file content, identified by the SHA-1 of `"blob " <len> NUL
/// <bytes>"`. content is fetched through the offset-index + packed-data
/// protocol (see `blob_segment`), not the random-access hash files.
pub struct Blob<'s> {
    store: &'s Store,
    sha: Sha,
    data: OnceLock<Vec<u8>>,
}

impl<'s> Blob<'s> {
    pub fn new(store: &'s Store, sha: Sha) -> Self {
        Self {
            store,
            sha,
            data: OnceLock::new(),
        }
    }

    pub fn sha(&self) -> Sha {
        self.sha
    }

    /// the blob's content; fetched and cached on first access
    pub fn data(&self) -> Result<&[u8]> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }
        let data = blob_segment::content(self.store, &self.sha)?;
        Ok(self.data.get_or_init(|| data))
    }

    /// the blob's length as recorded in the offset index — this is the
    /// on-disk (compressed/framed) length, not the decoded content length;
    /// matches the reference archive's `len()` definition, which reads the
    /// position record rather than materialising the content.
    pub fn len(&self) -> Result<usize> {
        Ok(blob_segment::position(self.store, &self.sha)?.length as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// commits that added, modified, or removed this blob (inclusive
    /// semantics — see the design notes on this relation's documented
    /// ambiguity upstream)
    pub fn commit_shas(&self) -> Result<Vec<Sha>> {
        match self.store.lookup_by_sha(DataKind::BlobCommits, &self.sha)? {
            Some(raw) => Ok(relation::decode_sha_list(&raw)),
            None => Ok(Vec::new()),
        }
    }

    pub fn commits(&self) -> Result<Vec<crate::entity::Commit<'s>>> {
        Ok(self
            .commit_shas()?
            .into_iter()
            .map(|sha| crate::entity::Commit::new(self.store, sha))
            .collect())
    }

    pub fn author_names(&self) -> Result<Vec<Vec<u8>>> {
        match self.store.lookup_by_sha(DataKind::BlobAuthors, &self.sha)? {
            Some(raw) => relation::decode_byte_list(&raw),
            None => Ok(Vec::new()),
        }
    }

    pub fn file_names(&self) -> Result<Vec<Vec<u8>>> {
        match self.store.lookup_by_sha(DataKind::BlobFiles, &self.sha)? {
            Some(raw) => relation::decode_byte_list(&raw),
            None => Ok(Vec::new()),
        }
    }
}

impl<'s> Entity for Blob<'s> {
    fn kind(&self) -> Kind {
        Kind::Blob
    }

    fn key_bytes(&self) -> &[u8] {
        self.sha.as_bytes()
    }
}

impl<'s> PartialEq for Blob<'s> {
    fn eq(&self, other: &Self) -> bool {
        self.sha == other.sha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hashfile::HashFileBuilder;
    use crate::shard;

    #[test]
    fn missing_relation_shard_yields_empty_relation() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(Config::new(dir.path()));
        let blob = Blob::new(&store, Sha::ZERO);
        assert!(blob.commit_shas().unwrap().is_empty());
        assert!(blob.author_names().unwrap().is_empty());
    }

    #[test]
    fn blob_len_matches_fixture_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(Config::new(dir.path()));
        let sha = Sha::from_hex("83d22195edc1473673f1bf35307aea6edf3c37e3").unwrap();

        let payload = b"*.egg-info/\ndist/\nbuild/\n*.pyc\n*.mo\n*.gz\n";
        let mut framed = vec![0x00u8];
        framed.extend_from_slice(payload);

        let bits = store.config().spec(DataKind::BlobData).bits;
        let shard_index = shard::shard_index_for_sha(&sha, bits);
        let data_path = store.shard_path(DataKind::BlobData, shard_index);
        std::fs::create_dir_all(data_path.parent().unwrap()).unwrap();
        std::fs::write(&data_path, &framed).unwrap();

        let index_path = store.shard_path(DataKind::BlobOffset, shard_index);
        std::fs::create_dir_all(index_path.parent().unwrap()).unwrap();
        let mut builder = HashFileBuilder::new(4);
        let mut ber_value = vec![0u8]; // offset 0
        ber_value.push((framed.len() & 0x7f) as u8); // length fits in one BER byte for this fixture
        builder.insert(sha.as_bytes().to_vec(), ber_value);
        builder.write(&index_path).unwrap();

        let blob = Blob::new(&store, sha);
        assert_eq!(blob.len().unwrap(), 42);
        assert!(blob.data().unwrap().starts_with(b"*.egg-info/"));
    }
}
