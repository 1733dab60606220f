//! parser for the git tree wire format: a sequence of
//! `mode SP name NUL 20-byte-sha` triples.

use crate::error::{Error, Result};
use crate::sha::Sha;

/// one parsed tree entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub mode: String,
    pub name: Vec<u8>,
    pub sha: Sha,
}

/// the literal mode string git uses for a subtree entry
pub const SUBTREE_MODE: &str = "40000";

impl Entry {
    pub fn is_subtree(&self) -> bool {
        self.mode == SUBTREE_MODE
    }
}

/// parse the full byte-exact sequence of entries out of a tree's raw
/// content. a well-formed tree leaves no trailing bytes.
pub fn parse_entries(data: &[u8]) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut pos = 0usize;
    while pos < data.len() {
        let space = data[pos..]
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| Error::MalformedTree {
                sha: Sha::ZERO,
                message: "missing space after mode".to_string(),
            })?;
        let mode = std::str::from_utf8(&data[pos..pos + space])
            .map_err(|_| Error::MalformedTree {
                sha: Sha::ZERO,
                message: "non-utf8 mode".to_string(),
            })?
            .to_string();
        pos += space + 1;

        let nul = data[pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::MalformedTree {
                sha: Sha::ZERO,
                message: "missing NUL after name".to_string(),
            })?;
        let name = data[pos..pos + nul].to_vec();
        pos += nul + 1;

        if pos + 20 > data.len() {
            return Err(Error::MalformedTree {
                sha: Sha::ZERO,
                message: "truncated sha".to_string(),
            });
        }
        let sha = Sha::from_bin_slice(&data[pos..pos + 20])?;
        pos += 20;

        entries.push(Entry { mode, name, sha });
    }
    Ok(entries)
}

/// one entry from a recursive traversal: its path joined by `/` from the
/// traversal root, and the entry itself
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraversedEntry {
    pub path: Vec<u8>,
    pub entry: Entry,
}

/// recursively expand a tree's entries, joining paths with `/` as
/// subtrees are descended into. `fetch` resolves a subtree SHA to its raw
/// content (normally `Store`-backed; injected here so the parser has no
/// storage dependency). guards against a tree that (incorrectly)
/// references itself transitively.
pub fn traverse(
    root_sha: &Sha,
    root_data: &[u8],
    fetch: &mut dyn FnMut(&Sha) -> Result<Vec<u8>>,
) -> Result<Vec<TraversedEntry>> {
    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();
    traverse_inner(root_sha, root_data, Vec::new(), fetch, &mut seen, &mut out)?;
    Ok(out)
}

fn traverse_inner(
    sha: &Sha,
    data: &[u8],
    prefix: Vec<u8>,
    fetch: &mut dyn FnMut(&Sha) -> Result<Vec<u8>>,
    seen: &mut std::collections::HashSet<Sha>,
    out: &mut Vec<TraversedEntry>,
) -> Result<()> {
    if !seen.insert(*sha) {
        return Err(Error::CycleDetected(*sha));
    }
    for entry in parse_entries(data)? {
        let mut path = prefix.clone();
        if !path.is_empty() {
            path.push(b'/');
        }
        path.extend_from_slice(&entry.name);

        if entry.is_subtree() {
            let child_data = fetch(&entry.sha)?;
            traverse_inner(&entry.sha, &child_data, path.clone(), fetch, seen, out)?;
        }
        out.push(TraversedEntry { path, entry });
    }
    seen.remove(sha);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_bytes(mode: &str, name: &str, sha: &Sha) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(mode.as_bytes());
        out.push(b' ');
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(sha.as_bytes());
        out
    }

    #[test]
    fn parses_flat_tree() {
        let blob_sha = Sha::from_bytes([1u8; 20]);
        let data = entry_bytes("100644", ".gitignore", &blob_sha);
        let entries = parse_entries(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mode, "100644");
        assert_eq!(entries[0].name, b".gitignore");
        assert_eq!(entries[0].sha, blob_sha);
        assert!(!entries[0].is_subtree());
    }

    #[test]
    fn recognises_subtree_mode() {
        let sha = Sha::from_bytes([2u8; 20]);
        let data = entry_bytes("40000", "minicms", &sha);
        let entries = parse_entries(&data).unwrap();
        assert!(entries[0].is_subtree());
    }

    #[test]
    fn truncated_sha_is_malformed() {
        let mut data = b"100644 a.txt\0".to_vec();
        data.extend_from_slice(&[1, 2, 3]); // too short
        assert!(parse_entries(&data).is_err());
    }

    #[test]
    fn traversal_joins_paths_and_recurses() {
        let blob_sha = Sha::from_bytes([1u8; 20]);
        let sub_sha = Sha::from_bytes([2u8; 20]);

        let sub_tree_data = entry_bytes("100644", "inner.txt", &blob_sha);
        let root_data = {
            let mut d = entry_bytes("100644", "top.txt", &blob_sha);
            d.extend(entry_bytes("40000", "sub", &sub_sha));
            d
        };

        let sub_tree_data_clone = sub_tree_data.clone();
        let mut fetch = move |sha: &Sha| -> Result<Vec<u8>> {
            if *sha == sub_sha {
                Ok(sub_tree_data_clone.clone())
            } else {
                panic!("unexpected fetch")
            }
        };

        let root_sha = Sha::from_bytes([3u8; 20]);
        let entries = traverse(&root_sha, &root_data, &mut fetch).unwrap();
        let paths: Vec<Vec<u8>> = entries.iter().map(|e| e.path.clone()).collect();
        assert!(paths.contains(&b"top.txt".to_vec()));
        assert!(paths.contains(&b"sub".to_vec()));
        assert!(paths.contains(&b"sub/inner.txt".to_vec()));
    }

    #[test]
    fn self_referencing_tree_is_a_cycle() {
        let root_sha = Sha::from_bytes([9u8; 20]);
        let root_data = entry_bytes("40000", "loop", &root_sha);
        let mut fetch = |_: &Sha| -> Result<Vec<u8>> { Ok(root_data.clone()) };
        let err = traverse(&root_sha, &root_data, &mut fetch).unwrap_err();
        assert!(matches!(err, Error::CycleDetected(_)));
    }
}
