use std::collections::HashSet;

use crate::config::DataKind;
use crate::entity::{Commit, Entity, Kind};
use crate::error::Result;
use crate::relation;
use crate::sha::Sha;
use crate::store::Store;
use crate::url;
use crate::wire::commit::Timestamp;

/// a project identified by its URI (e.g. `user2589_minicms`,
/// `bb_someuser_somerepo`); see `crate::url` for the forge mapping.
pub struct Project<'s> {
    store: &'s Store,
    uri: Vec<u8>,
}

impl<'s> Project<'s> {
    pub fn new(store: &'s Store, uri: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            uri: uri.into(),
        }
    }

    pub fn uri(&self) -> &[u8] {
        &self.uri
    }

    /// browser URL for this project, per the forge mapping table
    pub fn url(&self) -> String {
        url::project_url(&String::from_utf8_lossy(&self.uri))
    }

    pub fn commit_shas(&self) -> Result<Vec<Sha>> {
        match self
            .store
            .lookup_by_key(DataKind::ProjectCommits, &self.uri)?
        {
            Some(raw) => Ok(relation::decode_sha_list(&raw)),
            None => Ok(Vec::new()),
        }
    }

    /// every commit in the project, with `authored_at` cleared on commits
    /// dated earlier than the earliest first-parent-less commit's date —
    /// the dataset occasionally carries bogus (pre-repository) author
    /// dates, and downstream HEAD/TAIL logic should not trust them.
    pub fn commits(&self) -> Result<Vec<(Commit<'s>, Option<Timestamp>)>> {
        let shas = self.commit_shas()?;
        let mut commits = Vec::with_capacity(shas.len());
        for sha in shas {
            commits.push(Commit::new(self.store, sha));
        }

        let mut min_date: Option<i64> = None;
        for commit in &commits {
            if commit.parent_shas()?.is_empty() {
                let authored_at = commit.authored_at()?;
                if matches!(authored_at, Timestamp::Known { .. }) {
                    let key = authored_at.sort_key();
                    min_date = Some(min_date.map_or(key, |m| m.min(key)));
                }
            }
        }
        let min_date = min_date.unwrap_or(0);

        let mut out = Vec::with_capacity(commits.len());
        for commit in commits {
            let authored_at = commit.authored_at()?;
            let sanitized = if authored_at.sort_key() > 0 && authored_at.sort_key() < min_date {
                None
            } else {
                Some(authored_at)
            };
            out.push((commit, sanitized));
        }
        Ok(out)
    }

    pub fn author_names(&self) -> Result<Vec<Vec<u8>>> {
        match self
            .store
            .lookup_by_key(DataKind::ProjectAuthors, &self.uri)?
        {
            Some(raw) => relation::decode_byte_list(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// every project URI known to the `project_commits` relation,
    /// discovered by an empty-prefix scan across all shards of that family
    pub fn all(store: &'s Store) -> Result<Vec<Project<'s>>> {
        Ok(store
            .scan_all_keys(DataKind::ProjectCommits)?
            .into_iter()
            .map(|(uri, _)| Project::new(store, uri))
            .collect())
    }

    /// the latest-dated commit with no recorded children. when more than
    /// one candidate exists (disconnected chains), the one with the
    /// latest `authored_at` wins; unknown dates sort to epoch zero.
    pub fn head(&self) -> Result<Option<Commit<'s>>> {
        let commits = self.commits()?;
        if commits.is_empty() {
            return Ok(None);
        }

        let mut parents: HashSet<Sha> = HashSet::new();
        for (commit, _) in &commits {
            for parent in commit.parent_shas()? {
                parents.insert(parent);
            }
        }

        let mut best: Option<(&Commit<'s>, i64)> = None;
        for (commit, authored_at) in &commits {
            if parents.contains(&commit.sha()) {
                continue;
            }
            let key = authored_at.as_ref().map_or(0, Timestamp::sort_key);
            if best.as_ref().map_or(true, |(_, best_key)| key > *best_key) {
                best = Some((commit, key));
            }
        }

        Ok(best.map(|(commit, _)| Commit::new(self.store, commit.sha())))
    }

    /// the root of the first-parent chain: a commit with no parents that
    /// is itself referenced as some other commit's first parent.
    pub fn tail(&self) -> Result<Option<Sha>> {
        let commits = self.commits()?;

        let mut first_parents: HashSet<Sha> = HashSet::new();
        for (commit, _) in &commits {
            if let Some(first) = commit.parent_shas()?.first() {
                first_parents.insert(*first);
            }
        }

        for (commit, _) in &commits {
            if commit.parent_shas()?.is_empty() && first_parents.contains(&commit.sha()) {
                return Ok(Some(commit.sha()));
            }
        }
        Ok(None)
    }

    /// walk from the latest-authored commit following only first parents,
    /// mirroring `git log --first-parent`. stops at a commit with no
    /// parents, or when the next SHA cannot be resolved in this store.
    pub fn commits_fp(&self) -> Result<Vec<Commit<'s>>> {
        let commits = self.commits()?;
        if commits.is_empty() {
            return Ok(Vec::new());
        }

        let start_sha = commits
            .iter()
            .max_by_key(|(_, authored_at)| authored_at.as_ref().map_or(0, Timestamp::sort_key))
            .map(|(commit, _)| commit.sha())
            .expect("commits is non-empty");

        let mut out = Vec::new();
        let mut current = Some(start_sha);
        while let Some(sha) = current {
            let commit = Commit::new(self.store, sha);
            let first_parent = match commit.parent_shas() {
                Ok(parents) => parents.first().copied(),
                Err(_) => break,
            };
            out.push(commit);
            current = first_parent;
        }
        Ok(out)
    }
}

impl<'s> Entity for Project<'s> {
    fn kind(&self) -> Kind {
        Kind::Project
    }

    fn key_bytes(&self) -> &[u8] {
        &self.uri
    }
}

impl<'s> PartialEq for Project<'s> {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hashfile::HashFileBuilder;
    use crate::shard;

    #[test]
    fn all_scans_every_shard_of_project_commits() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(Config::new(dir.path()));

        let key = b"user2589_minicms";
        let bits = store.config().spec(DataKind::ProjectCommits).bits;
        let shard_index = shard::shard_index_for_key(key, bits);
        let shard_path = store.shard_path(DataKind::ProjectCommits, shard_index);
        std::fs::create_dir_all(shard_path.parent().unwrap()).unwrap();
        let mut builder = HashFileBuilder::new(4);
        builder.insert(key.to_vec(), Vec::new());
        builder.write(&shard_path).unwrap();

        let all = Project::all(&store).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].uri(), key);
    }

    #[test]
    fn missing_relation_yields_empty_commits_and_no_head() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(Config::new(dir.path()));
        let project = Project::new(&store, b"user2589_minicms".to_vec());
        assert!(project.commit_shas().unwrap().is_empty());
        assert!(project.head().unwrap().is_none());
        assert!(project.tail().unwrap().is_none());
        assert!(project.commits_fp().unwrap().is_empty());
    }

    #[test]
    fn url_delegates_to_url_module() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(Config::new(dir.path()));
        let project = Project::new(&store, b"testuser_test_proj".to_vec());
        assert_eq!(project.url(), "https://github.com/testuser/test_proj");
    }
}
