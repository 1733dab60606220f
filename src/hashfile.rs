//! reader for the sharded on-disk hash-file format each data family is
//! stored in.
//!
//! no real binding for the producing pipeline's original hash-table format
//! is reachable from this crate, so this module defines its own: a fixed
//! header, a bucket table of hash-chained record offsets, and a flat record
//! area of length-prefixed `(key, value)` pairs. point lookup is O(1)
//! average case; prefix scan is a linear walk of every chain in the shard.
//! there is no ordering guarantee within or across shards (see the
//! concurrency and resource model).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Error, IoResultExt, Result};
use crate::shard::fnv1a_32;

const MAGIC: &[u8; 4] = b"VCHS";
const VERSION: u32 = 1;
const HEADER_LEN: u64 = 12; // magic(4) + version(4) + bucket_count(4)

struct Header {
    bucket_count: u32,
}

fn read_header(file: &mut File) -> Result<Header> {
    file.seek(SeekFrom::Start(0)).with_path("<hashfile>")?;
    let mut buf = [0u8; HEADER_LEN as usize];
    file.read_exact(&mut buf).with_path("<hashfile>")?;
    if &buf[0..4] != MAGIC {
        return Err(Error::CorruptHashFile {
            path: Path::new("<hashfile>").to_path_buf(),
            message: "bad magic".to_string(),
        });
    }
    let version = u32::from_le_bytes(buf[4..8].try_into().unwrap());
    if version != VERSION {
        return Err(Error::CorruptHashFile {
            path: Path::new("<hashfile>").to_path_buf(),
            message: format!("unsupported version {version}"),
        });
    }
    let bucket_count = u32::from_le_bytes(buf[8..12].try_into().unwrap());
    Ok(Header { bucket_count })
}

fn bucket_table_offset(bucket: u32) -> u64 {
    HEADER_LEN + u64::from(bucket) * 8
}

fn read_u64_at(file: &mut File, offset: u64) -> Result<u64> {
    file.seek(SeekFrom::Start(offset)).with_path("<hashfile>")?;
    let mut buf = [0u8; 8];
    file.read_exact(&mut buf).with_path("<hashfile>")?;
    Ok(u64::from_le_bytes(buf))
}

struct Record {
    key: Vec<u8>,
    value: Vec<u8>,
    next: u64,
}

fn read_record_at(file: &mut File, offset: u64) -> Result<Record> {
    file.seek(SeekFrom::Start(offset)).with_path("<hashfile>")?;
    let mut len_buf = [0u8; 4];
    file.read_exact(&mut len_buf).with_path("<hashfile>")?;
    let key_len = u32::from_le_bytes(len_buf) as usize;
    let mut key = vec![0u8; key_len];
    file.read_exact(&mut key).with_path("<hashfile>")?;

    file.read_exact(&mut len_buf).with_path("<hashfile>")?;
    let value_len = u32::from_le_bytes(len_buf) as usize;
    let mut value = vec![0u8; value_len];
    file.read_exact(&mut value).with_path("<hashfile>")?;

    let mut next_buf = [0u8; 8];
    file.read_exact(&mut next_buf).with_path("<hashfile>")?;
    let next = u64::from_le_bytes(next_buf);

    Ok(Record { key, value, next })
}

/// point lookup: returns `None` if `key` is absent from this shard
pub fn lookup(handle: &Mutex<File>, key: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut file = handle.lock().expect("hash file mutex poisoned");
    let header = read_header(&mut file)?;
    if header.bucket_count == 0 {
        return Ok(None);
    }
    let bucket = fnv1a_32(key) % header.bucket_count;
    let mut offset = read_u64_at(&mut file, bucket_table_offset(bucket))?;
    while offset != 0 {
        let record = read_record_at(&mut file, offset)?;
        if record.key == key {
            return Ok(Some(record.value));
        }
        offset = record.next;
    }
    Ok(None)
}

/// prefix scan: every `(key, value)` pair in this shard whose key starts
/// with `prefix`. collected eagerly since a shard's record count is bounded
/// by the producing pipeline's shard sizing; callers that need to stream
/// across many shards do so one shard at a time (see the sequential scan
/// and entity `all()` enumerations).
pub fn scan_prefix(handle: &Mutex<File>, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut file = handle.lock().expect("hash file mutex poisoned");
    let header = read_header(&mut file)?;
    let mut out = Vec::new();
    for bucket in 0..header.bucket_count {
        let mut offset = read_u64_at(&mut file, bucket_table_offset(bucket))?;
        while offset != 0 {
            let record = read_record_at(&mut file, offset)?;
            if record.key.starts_with(prefix) {
                out.push((record.key.clone(), record.value.clone()));
            }
            offset = record.next;
        }
    }
    Ok(out)
}

/// every `(key, value)` pair in this shard, in on-disk (unordered) order
pub fn scan_all(handle: &Mutex<File>) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    scan_prefix(handle, &[])
}

/// builds a shard file in this module's format. test-only: the crate never
/// writes to the archive in production use, since the data is produced by
/// an external pipeline (see non-goals).
#[cfg(any(test, feature = "fixtures"))]
pub struct HashFileBuilder {
    bucket_count: u32,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

#[cfg(any(test, feature = "fixtures"))]
impl HashFileBuilder {
    pub fn new(bucket_count: u32) -> Self {
        Self {
            bucket_count,
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let bucket_count = self.bucket_count.max(1);
        let mut buckets = vec![0u64; bucket_count as usize];
        let mut record_area = Vec::new();
        let record_start = HEADER_LEN + u64::from(bucket_count) * 8;

        // group entries by bucket, preserving insertion order within a chain
        let mut by_bucket: Vec<Vec<&(Vec<u8>, Vec<u8>)>> = vec![Vec::new(); bucket_count as usize];
        for entry in &self.entries {
            let bucket = fnv1a_32(&entry.0) % bucket_count;
            by_bucket[bucket as usize].push(entry);
        }

        for (bucket, entries) in by_bucket.into_iter().enumerate() {
            let mut next_offset = 0u64;
            // build the chain tail-first so each record's `next` points at
            // the previously-written record for this bucket
            let mut chain_start = 0u64;
            let mut records_for_bucket = Vec::new();
            for (key, value) in entries {
                records_for_bucket.push((key, value));
            }
            for (key, value) in records_for_bucket.into_iter().rev() {
                let offset = record_start + record_area.len() as u64;
                record_area.extend_from_slice(&(key.len() as u32).to_le_bytes());
                record_area.extend_from_slice(key);
                record_area.extend_from_slice(&(value.len() as u32).to_le_bytes());
                record_area.extend_from_slice(value);
                record_area.extend_from_slice(&next_offset.to_le_bytes());
                next_offset = offset;
                chain_start = offset;
            }
            buckets[bucket] = chain_start;
        }

        let mut file = File::create(path).with_path(path)?;
        file.write_all(MAGIC).with_path(path)?;
        file.write_all(&VERSION.to_le_bytes()).with_path(path)?;
        file.write_all(&bucket_count.to_le_bytes()).with_path(path)?;
        for offset in &buckets {
            file.write_all(&offset.to_le_bytes()).with_path(path)?;
        }
        file.write_all(&record_area).with_path(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn open(path: &Path) -> Mutex<File> {
        Mutex::new(File::open(path).unwrap())
    }

    #[test]
    fn lookup_finds_inserted_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shard0.tch");
        let mut builder = HashFileBuilder::new(4);
        builder.insert("hello", "world");
        builder.insert("foo", "bar");
        builder.write(&path).unwrap();

        let handle = open(&path);
        assert_eq!(lookup(&handle, b"hello").unwrap(), Some(b"world".to_vec()));
        assert_eq!(lookup(&handle, b"foo").unwrap(), Some(b"bar".to_vec()));
    }

    #[test]
    fn lookup_missing_key_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shard0.tch");
        HashFileBuilder::new(4).write(&path).unwrap();

        let handle = open(&path);
        assert_eq!(lookup(&handle, b"nope").unwrap(), None);
    }

    #[test]
    fn chained_bucket_collisions_are_resolved_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shard0.tch");
        let mut builder = HashFileBuilder::new(1); // force every key into bucket 0
        builder.insert("a", "1");
        builder.insert("b", "2");
        builder.insert("c", "3");
        builder.write(&path).unwrap();

        let handle = open(&path);
        assert_eq!(lookup(&handle, b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(lookup(&handle, b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(lookup(&handle, b"c").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn prefix_scan_matches_only_prefixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shard0.tch");
        let mut builder = HashFileBuilder::new(4);
        builder.insert("file:a.rs", "1");
        builder.insert("file:b.rs", "2");
        builder.insert("other", "3");
        builder.write(&path).unwrap();

        let handle = open(&path);
        let mut results = scan_prefix(&handle, b"file:").unwrap();
        results.sort();
        assert_eq!(
            results,
            vec![
                (b"file:a.rs".to_vec(), b"1".to_vec()),
                (b"file:b.rs".to_vec(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn scan_all_returns_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shard0.tch");
        let mut builder = HashFileBuilder::new(2);
        builder.insert("x", "1");
        builder.insert("y", "2");
        builder.write(&path).unwrap();

        let handle = open(&path);
        let results = scan_all(&handle).unwrap();
        assert_eq!(results.len(), 2);
    }
}
