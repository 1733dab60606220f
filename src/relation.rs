//! decoding helpers shared by every relation-valued entity accessor:
//! semicolon-delimited byte-string lists (LZF-framed) and 20-byte SHA lists.

use crate::error::Result;
use crate::lzf;
use crate::sha::{self, Sha};

/// the sentinel the producing pipeline writes in place of "no value" for a
/// semicolon-delimited field; real entries never equal this literally.
const EMPTY_SENTINEL: &[u8] = b"EMPTY";

/// decode an LZF-framed, semicolon-delimited list of byte strings, dropping
/// empty and sentinel entries. entries are returned as raw bytes, not
/// `String` — author names, file paths and project URIs are arbitrary byte
/// sequences (git allows non-UTF-8 names) and are never lossily re-encoded
/// or trimmed here; callers that need text convert at their own boundary.
pub fn decode_byte_list(raw: &[u8]) -> Result<Vec<Vec<u8>>> {
    let decoded = lzf::decode(raw)?;
    Ok(decoded
        .split(|&b| b == b';')
        .filter(|entry| !entry.is_empty() && *entry != EMPTY_SENTINEL)
        .map(|entry| entry.to_vec())
        .collect())
}

/// decode a raw concatenated-20-byte-SHA relation value
pub fn decode_sha_list(raw: &[u8]) -> Vec<Sha> {
    sha::unpack_sha_list(raw)
}
