use std::fmt;

use crate::error::{Error, Result};

/// a git object identity: the 20-byte SHA-1 digest used for blobs, trees,
/// commits and tags
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha([u8; 20]);

impl Sha {
    pub const ZERO: Sha = Sha([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// accept either a 40-hex string or a raw 20-byte binary slice, matching
    /// the two forms the on-disk relations use interchangeably
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidShaHex(s.to_string()))?;
        Self::from_bin_slice(&bytes)
    }

    pub fn from_bin_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 20 {
            return Err(Error::InvalidShaHex(hex::encode(bytes)));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// accept whichever of the two forms is handed in: 40 hex chars or 20
    /// raw bytes
    pub fn parse(s: &[u8]) -> Result<Self> {
        if s.len() == 20 {
            Self::from_bin_slice(s)
        } else if s.len() == 40 {
            let s = std::str::from_utf8(s).map_err(|_| Error::InvalidShaHex(hex::encode(s)))?;
            Self::from_hex(s)
        } else {
            Err(Error::InvalidShaHex(hex::encode(s)))
        }
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha({})", &self.to_hex()[..12])
    }
}

impl serde::Serialize for Sha {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Sha {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// compute the git object identity of `content` for the given object kind:
/// SHA-1 over `"{kind} {len}\0{content}"`
pub fn object_sha(kind: &str, content: &[u8]) -> Sha {
    use sha1::{Digest, Sha1};
    let mut hasher = Sha1::new();
    hasher.update(kind.as_bytes());
    hasher.update(b" ");
    hasher.update(content.len().to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(content);
    Sha(hasher.finalize().into())
}

/// split a raw relation value into its constituent 20-byte SHAs (C8).
///
/// `data.len()` is not required to be checked by the caller; a trailing
/// partial chunk is dropped, matching the invariant that well-formed values
/// always have a length that's a multiple of 20.
pub fn unpack_sha_list(data: &[u8]) -> Vec<Sha> {
    data.chunks_exact(20)
        .map(|c| Sha::from_bin_slice(c).expect("chunks_exact(20) always yields 20 bytes"))
        .collect()
}

/// concatenate a list of SHAs back into a raw relation value
pub fn pack_sha_list(shas: &[Sha]) -> Vec<u8> {
    let mut out = Vec::with_capacity(shas.len() * 20);
    for sha in shas {
        out.extend_from_slice(sha.as_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let original = Sha::from_hex("83d22195edc1473673f1bf35307aea6edf3c37e3").unwrap();
        let hex = original.to_hex();
        let parsed = Sha::from_hex(&hex).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn binary_and_hex_are_equal_identities() {
        let hex_sha = Sha::from_hex("f2a7fcdc51450ab03cb364415f14e634fa69b62c").unwrap();
        let bin = *hex_sha.as_bytes();
        let bin_sha = Sha::from_bytes(bin);
        assert_eq!(hex_sha, bin_sha);
    }

    #[test]
    fn invalid_hex_rejected() {
        assert!(Sha::from_hex("not valid hex").is_err());
        assert!(Sha::from_hex("abcd").is_err());
    }

    #[test]
    fn parse_accepts_both_forms() {
        let h = Sha::from_hex("f2a7fcdc51450ab03cb364415f14e634fa69b62c").unwrap();
        let from_hex = Sha::parse(b"f2a7fcdc51450ab03cb364415f14e634fa69b62c").unwrap();
        let from_bin = Sha::parse(h.as_bytes()).unwrap();
        assert_eq!(h, from_hex);
        assert_eq!(h, from_bin);
    }

    #[test]
    fn blob_sha_matches_fixture() {
        let sha = object_sha("blob", b"Hello world!");
        assert_eq!(sha.to_hex(), "6769dd60bdf536a83c9353272157893043e9f7d0");
    }

    #[test]
    fn sha_list_roundtrip() {
        let shas = vec![Sha::ZERO, Sha::from_bytes([1u8; 20])];
        let packed = pack_sha_list(&shas);
        assert_eq!(packed.len(), 40);
        let unpacked = unpack_sha_list(&packed);
        assert_eq!(unpacked, shas);
    }

    #[test]
    fn empty_sha_list() {
        assert!(unpack_sha_list(&[]).is_empty());
    }
}
