//! sequential scan over a `.idx` / `.bin` shard pair: the only way to
//! enumerate every stored commit or tree, since the random-access hash
//! files are keyed, not iterable.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use crate::config::DataKind;
use crate::error::{Error, IoResultExt, Result};
use crate::lzf;
use crate::sha::Sha;
use crate::store::Store;

/// one parsed index line: an offset and compressed length into the
/// matching `.bin` file, plus the object's SHA. `full_length` is present
/// only for index grammars with more than four semicolon-delimited fields;
/// it is not needed to read the record (the compressed length is what's
/// actually read from the `.bin` file) and is kept only for completeness.
struct IndexLine {
    sha: Sha,
    compressed_length: u64,
}

fn parse_index_line(line: &str) -> Result<IndexLine> {
    let chunks: Vec<&str> = line.trim().split(';').collect();
    if chunks.len() < 4 {
        return Err(Error::MalformedCommit {
            sha: Sha::ZERO,
            message: format!("malformed index line: {line}"),
        });
    }
    // grammar: `_;offset;compressed_length;sha` normally, or
    // `_;offset;compressed_length;full_length;sha` when more than four
    // fields are present (the offset field itself is not needed here —
    // the `.bin` file is consumed strictly sequentially, never seeked).
    let (compressed_length, sha) = if chunks.len() > 4 {
        (chunks[2], chunks[4])
    } else {
        (chunks[2], chunks[3])
    };
    let compressed_length: u64 = compressed_length.parse().map_err(|_| Error::MalformedCommit {
        sha: Sha::ZERO,
        message: format!("malformed compressed length in index line: {line}"),
    })?;
    let sha = Sha::from_hex(sha)?;
    Ok(IndexLine {
        sha,
        compressed_length,
    })
}

/// walk one shard's `.idx`/`.bin` pair sequentially, yielding every stored
/// object's SHA and decoded content in index-line order. reads of the
/// `.bin` file never reseek: each record is read immediately after the
/// previous one ends.
pub fn scan_shard(store: &Store, kind: DataKind, shard_index: u32) -> Result<Vec<(Sha, Vec<u8>)>> {
    let base = store.shard_path(kind, shard_index);
    let idx_path = base.with_extension("idx");
    let bin_path = base.with_extension("bin");

    if !idx_path.exists() {
        return Ok(Vec::new());
    }

    let idx_file = File::open(&idx_path).with_path(&idx_path)?;
    let mut bin_file = File::open(&bin_path).with_path(&bin_path)?;

    let mut results = Vec::new();
    for line in BufReader::new(idx_file).lines() {
        let line = line.with_path(&idx_path)?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed = parse_index_line(&line)?;
        let mut compressed = vec![0u8; parsed.compressed_length as usize];
        bin_file.read_exact(&mut compressed).with_path(&bin_path)?;
        let content = lzf::decode(&compressed)?;
        results.push((parsed.sha, content));
    }
    Ok(results)
}

/// walk every shard of a git-object kind in shard-index order
pub fn scan_all(store: &Store, kind: DataKind) -> Result<Vec<(Sha, Vec<u8>)>> {
    let mut out = Vec::new();
    for shard_index in 0..store.shard_count(kind) {
        out.extend(scan_shard(store, kind, shard_index)?);
    }
    Ok(out)
}
