//! parser for the git commit wire format: newline-delimited header fields,
//! a blank line, then the free-form message.

use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::sha::Sha;

const SIGNATURE_END: &str = "-----END PGP SIGNATURE-----";

/// a commit's authored/committed timestamp. the dataset's dates are
/// sometimes wrong or unparseable; rather than fail the whole commit parse,
/// such timestamps become `Unknown` and sort as the epoch for ordering
/// purposes (see `Timestamp::sort_key`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timestamp {
    Known { unix_seconds: i64, offset_minutes: i32 },
    Unknown,
}

impl Timestamp {
    /// epoch-zero sentinel used when sorting commits by date: unknown dates
    /// never win a "latest" comparison, matching the reference archive's
    /// `DAY_Z` epoch-zero sentinel
    pub fn sort_key(&self) -> i64 {
        match self {
            Timestamp::Known { unix_seconds, .. } => *unix_seconds,
            Timestamp::Unknown => 0,
        }
    }

    pub fn as_offset_datetime(&self) -> Option<OffsetDateTime> {
        match self {
            Timestamp::Known {
                unix_seconds,
                offset_minutes,
            } => {
                let utc = OffsetDateTime::from_unix_timestamp(*unix_seconds).ok()?;
                let offset = time::UtcOffset::from_whole_seconds(offset_minutes * 60).ok()?;
                Some(utc.to_offset(offset))
            }
            Timestamp::Unknown => None,
        }
    }
}

/// `name <email> epoch ±HHMM` as it appears verbatim in `author`/`committer`
/// header lines, split into the identity portion and the parsed timestamp
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub raw: Vec<u8>,
    pub timestamp: Timestamp,
}

/// a fully parsed commit header + message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: Sha,
    pub parents: Vec<Sha>,
    pub author: Identity,
    pub committer: Identity,
    pub signature: Option<Vec<u8>>,
    pub message: Vec<u8>,
}

impl Commit {
    pub fn short_message(&self) -> &[u8] {
        self.message
            .split(|&b| b == b'\n')
            .next()
            .unwrap_or(&self.message)
    }
}

fn parse_timestamp(epoch: &str, tz: &str) -> Timestamp {
    let unix_seconds: i64 = match epoch.parse() {
        Ok(v) => v,
        Err(_) => return Timestamp::Unknown,
    };
    if tz.len() < 4 {
        return Timestamp::Unknown;
    }
    let sign: i64 = if tz.starts_with('-') { -1 } else { 1 };
    let len = tz.len();
    let hh = &tz[len - 4..len - 2];
    let mm = &tz[len - 2..];
    // require plain two-digit fields: a stray single-digit zone (e.g.
    // `+900`) slices a sign character into `hh` here, which this crate
    // treats as an unparseable offset rather than silently misreading it.
    if !hh.bytes().all(|b| b.is_ascii_digit()) || !mm.bytes().all(|b| b.is_ascii_digit()) {
        return Timestamp::Unknown;
    }
    let (hours, minutes) = match (hh.parse::<i64>(), mm.parse::<i64>()) {
        (Ok(h), Ok(m)) => (h, m),
        _ => return Timestamp::Unknown,
    };
    let offset_minutes = (sign * (hours * 60 + minutes)) as i32;

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(i64::MAX);
    if unix_seconds > now {
        return Timestamp::Unknown;
    }

    Timestamp::Known {
        unix_seconds,
        offset_minutes,
    }
}

/// split `value` from the right on ASCII spaces into at most 3 parts,
/// mirroring Python's `value.rsplit(" ", 2)`. operates on raw bytes so
/// non-UTF-8 author names are preserved verbatim; only the trailing
/// epoch/timezone fields (always plain ASCII) are interpreted as text.
fn rsplit_bytes(value: &[u8], max_splits: usize) -> Vec<&[u8]> {
    let mut parts = Vec::with_capacity(max_splits + 1);
    let mut rest = value;
    while parts.len() < max_splits {
        match rest.iter().rposition(|&b| b == b' ') {
            Some(pos) => {
                parts.push(&rest[pos + 1..]);
                rest = &rest[..pos];
            }
            None => break,
        }
    }
    parts.push(rest);
    parts.reverse();
    parts
}

/// strip leading/trailing ASCII whitespace, mirroring Python's `str.strip()`
/// closely enough for the signature terminator comparison (mergetag/gpgsig
/// continuation lines carry a single leading space, not arbitrary bytes).
fn trim_ascii_whitespace(line: &[u8]) -> &[u8] {
    let is_space = |b: &u8| b.is_ascii_whitespace();
    let start = line.iter().position(|b| !is_space(b)).unwrap_or(line.len());
    let end = line.iter().rposition(|b| !is_space(b)).map_or(start, |p| p + 1);
    &line[start..end]
}

fn parse_identity(value: &[u8]) -> Result<Identity> {
    let parts = rsplit_bytes(value, 2);
    if parts.len() == 3 {
        let tz = std::str::from_utf8(parts[2]).ok();
        let epoch = std::str::from_utf8(parts[1]).ok();
        if let (Some(epoch), Some(tz)) = (epoch, tz) {
            return Ok(Identity {
                raw: parts[0].to_vec(),
                timestamp: parse_timestamp(epoch, tz),
            });
        }
    }
    Ok(Identity {
        raw: value.to_vec(),
        timestamp: Timestamp::Unknown,
    })
}

/// parse a commit's raw decoded content into its header and message
pub fn parse(sha: &Sha, data: &[u8]) -> Result<Commit> {
    let separator = find_subslice(data, b"\n\n");
    let (header, message) = match separator {
        Some(pos) => (&data[..pos], &data[pos + 2..]),
        None => (data, &data[data.len()..]),
    };

    let mut tree: Option<Sha> = None;
    let mut parents = Vec::new();
    let mut author: Option<Identity> = None;
    let mut committer: Option<Identity> = None;
    let mut signature: Option<Vec<u8>> = None;

    let mut in_signature = false;
    let mut signature_lines: Vec<&[u8]> = Vec::new();

    for line in header.split(|&b| b == b'\n') {
        if in_signature {
            signature_lines.push(line);
            if trim_ascii_whitespace(line) == SIGNATURE_END.as_bytes() {
                in_signature = false;
                signature = Some(signature_lines.join(&[b'\n'][..]));
                signature_lines = Vec::new();
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if line.starts_with(b" ") {
            // mergetag continuation line; not modeled further
            continue;
        }
        let space = line
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| Error::MalformedCommit {
                sha: *sha,
                message: format!("header line with no key/value separator: {:?}", String::from_utf8_lossy(line)),
            })?;
        let key = &line[..space];
        let value = &line[space + 1..];
        match key {
            b"tree" => {
                tree = Some(Sha::parse(value)?);
            }
            b"parent" => {
                parents.push(Sha::parse(value)?);
            }
            b"author" => {
                author = Some(parse_identity(value)?);
            }
            b"committer" => {
                committer = Some(parse_identity(value)?);
            }
            b"gpgsig" => {
                in_signature = true;
                signature_lines.push(value);
            }
            _ => {
                // unrecognised header key; tolerated, matches the dataset's
                // occasional extra trailers
            }
        }
    }

    let tree = tree.ok_or_else(|| Error::MalformedCommit {
        sha: *sha,
        message: "missing tree header".to_string(),
    })?;
    let author = author.ok_or_else(|| Error::MalformedCommit {
        sha: *sha,
        message: "missing author header".to_string(),
    })?;
    let committer = committer.ok_or_else(|| Error::MalformedCommit {
        sha: *sha,
        message: "missing committer header".to_string(),
    })?;

    Ok(Commit {
        tree,
        parents,
        author,
        committer,
        signature,
        message: message.to_vec(),
    })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_sha() -> Sha {
        Sha::from_hex("f2a7fcdc51450ab03cb364415f14e634fa69b62c").unwrap()
    }

    #[test]
    fn parses_basic_commit() {
        let data = b"tree d4ddbae978c9ec2dc3b7b3497c2086ecf7be7d9d\n\
parent 66acf0a046a02b48e0b32052a17f1e240c2d7356\n\
author Pavel Puchkin <neoascetic@gmail.com> 1374620000 +0400\n\
committer Pavel Puchkin <neoascetic@gmail.com> 1374620000 +0400\n\
\n\
License changed :P\n";
        let commit = parse(&fixture_sha(), data).unwrap();
        assert_eq!(
            commit.tree.to_hex(),
            "d4ddbae978c9ec2dc3b7b3497c2086ecf7be7d9d"
        );
        assert_eq!(commit.parents.len(), 1);
        assert_eq!(
            commit.parents[0].to_hex(),
            "66acf0a046a02b48e0b32052a17f1e240c2d7356"
        );
        assert_eq!(commit.author.raw, b"Pavel Puchkin <neoascetic@gmail.com>");
        assert_eq!(commit.short_message(), b"License changed :P");
        assert!(matches!(commit.author.timestamp, Timestamp::Known { .. }));
    }

    #[test]
    fn tolerates_gpgsig_block_and_mergetag_continuation() {
        let data = b"tree d4ddbae978c9ec2dc3b7b3497c2086ecf7be7d9d\n\
author A <a@example.com> 1374620000 +0000\n\
committer A <a@example.com> 1374620000 +0000\n\
gpgsig -----BEGIN PGP SIGNATURE-----\n\
 some signature bytes\n\
 -----END PGP SIGNATURE-----\n\
\n\
message body\n";
        // note: the continuation line for gpgsig starts with a space and is
        // accumulated verbatim until the END marker is seen on its own.
        let commit = parse(&fixture_sha(), data).unwrap();
        let signature = commit.signature.unwrap();
        assert!(signature.starts_with(b"-----BEGIN PGP SIGNATURE-----"));
        assert!(signature.ends_with(b"-----END PGP SIGNATURE-----"));
    }

    #[test]
    fn missing_tree_is_malformed() {
        let data = b"author A <a@example.com> 1 +0000\ncommitter A <a@example.com> 1 +0000\n\nmsg\n";
        let err = parse(&fixture_sha(), data).unwrap_err();
        assert!(matches!(err, Error::MalformedCommit { .. }));
    }

    #[test]
    fn future_dated_timestamp_is_unknown() {
        let data = format!(
            "tree d4ddbae978c9ec2dc3b7b3497c2086ecf7be7d9d\nauthor A <a@example.com> {} +0000\ncommitter A <a@example.com> {} +0000\n\nmsg\n",
            9999999999i64, 9999999999i64
        );
        let commit = parse(&fixture_sha(), data.as_bytes()).unwrap();
        assert_eq!(commit.author.timestamp, Timestamp::Unknown);
    }

    #[test]
    fn single_digit_zone_offset_falls_back_to_unknown() {
        let data = b"tree d4ddbae978c9ec2dc3b7b3497c2086ecf7be7d9d\nauthor A <a@example.com> 1374620000 +900\ncommitter A <a@example.com> 1374620000 +900\n\nmsg\n";
        let commit = parse(&fixture_sha(), data).unwrap();
        assert_eq!(commit.author.timestamp, Timestamp::Unknown);
    }

    #[test]
    fn no_parents_is_valid() {
        let data = b"tree d4ddbae978c9ec2dc3b7b3497c2086ecf7be7d9d\nauthor A <a@example.com> 1 +0000\ncommitter A <a@example.com> 1 +0000\n\nroot commit\n";
        let commit = parse(&fixture_sha(), data).unwrap();
        assert!(commit.parents.is_empty());
    }
}
