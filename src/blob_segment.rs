//! materialises blob content: look up the `(offset, length)` pair in the
//! offset index, then seek into the matching packed data file and decode.
//!
//! each fetch opens its own file handle to the packed `.bin` file rather
//! than sharing one through the handle pool — a `seek` followed by `read`
//! is not atomic on a shared descriptor, and blob fetches are expected to
//! be numerous and scattered, so a private handle per fetch keeps the read
//! path lock-free.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::ber;
use crate::config::DataKind;
use crate::error::{Error, IoResultExt, Result};
use crate::lzf;
use crate::sha::Sha;
use crate::shard;
use crate::store::Store;

/// the `(offset, length)` pair recorded in the blob offset index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub offset: u64,
    pub length: u64,
}

/// look up where a blob's compressed bytes live in its packed data file
pub fn position(store: &Store, sha: &Sha) -> Result<Position> {
    let raw = store
        .lookup_by_sha(DataKind::BlobOffset, sha)?
        .ok_or_else(|| Error::NotFound(format!("blob {sha}")))?;
    let (values, _) = ber::decode_n(&raw, 2)?;
    Ok(Position {
        offset: values[0],
        length: values[1],
    })
}

/// fetch and decode a blob's content
pub fn content(store: &Store, sha: &Sha) -> Result<Vec<u8>> {
    let pos = position(store, sha)?;
    let bits = store.config().spec(DataKind::BlobData).bits;
    let shard_index = shard::shard_index_for_sha(sha, bits);
    let path = store.shard_path(DataKind::BlobData, shard_index);

    let mut file = File::open(&path).with_path(&path)?;
    file.seek(SeekFrom::Start(pos.offset)).with_path(&path)?;
    let mut buf = vec![0u8; pos.length as usize];
    file.read_exact(&mut buf).with_path(&path)?;
    lzf::decode(&buf)
}
