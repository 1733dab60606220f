use crate::entity::{Entity, Kind};
use crate::sha::Sha;
use crate::store::Store;

/// a git tag object. opaque in this engine — no relation or content
/// accessors are exposed beyond identity, since nothing downstream needs
/// more than "a tag with this SHA exists".
pub struct Tag<'s> {
    #[allow(dead_code)]
    store: &'s Store,
    sha: Sha,
}

impl<'s> Tag<'s> {
    pub fn new(store: &'s Store, sha: Sha) -> Self {
        Self { store, sha }
    }

    pub fn sha(&self) -> Sha {
        self.sha
    }
}

impl<'s> Entity for Tag<'s> {
    fn kind(&self) -> Kind {
        Kind::Tag
    }

    fn key_bytes(&self) -> &[u8] {
        self.sha.as_bytes()
    }
}

impl<'s> PartialEq for Tag<'s> {
    fn eq(&self, other: &Self) -> bool {
        self.sha == other.sha
    }
}
