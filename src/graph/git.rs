//! Git repository backend on gitoxide

use super::{CommitGraph, GraphCommit, RefUpdateStatus, RefUpdater};
use crate::error::{Error, Result};
use crate::types::CommitId;
use gix::bstr::ByteSlice;
use gix::refs::Target;
use gix::refs::transaction::PreviousValue;
use gix::{ObjectId, ThreadSafeRepository};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A git repository on disk
pub struct GitRepository {
    repo: ThreadSafeRepository,
    git_dir: PathBuf,
}

impl fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepository")
            .field("git_dir", &self.git_dir)
            .finish_non_exhaustive()
    }
}

fn object_id(id: &CommitId) -> Result<ObjectId> {
    ObjectId::from_hex(id.as_str().as_bytes())
        .map_err(|e| Error::Graph(format!("invalid object id {id}: {e}")))
}

fn commit_id(oid: ObjectId) -> CommitId {
    CommitId::new(oid.to_string())
}

impl GitRepository {
    /// Open the repository at `path` (work tree or bare)
    pub fn open(path: &Path) -> Result<Self> {
        let repo = gix::open(path).map_err(|e| {
            Error::Git(format!("{} is not a git repository: {e}", path.display()))
        })?;
        let git_dir = std::path::absolute(repo.git_dir())?;
        debug!(git_dir = %git_dir.display(), "opened repository");
        Ok(Self {
            repo: repo.into_sync(),
            git_dir,
        })
    }

    /// Resolve a revision expression to a commit id
    pub fn resolve(&self, rev: &str) -> Result<CommitId> {
        let repo = self.repo.to_thread_local();
        let revspec = format!("{rev}^{{commit}}");
        let id = repo
            .rev_parse_single(revspec.as_str())
            .map_err(|e| Error::Git(format!("cannot resolve {rev}: {e}")))?;
        Ok(commit_id(id.detach()))
    }
}

impl CommitGraph for GitRepository {
    fn parse_commit(&self, id: &CommitId) -> Result<GraphCommit> {
        let repo = self.repo.to_thread_local();
        let object = repo
            .try_find_object(object_id(id)?)
            .map_err(|e| Error::Graph(format!("cannot read {id}: {e}")))?
            .ok_or_else(|| Error::MissingObject(id.clone()))?;
        let commit = object
            .try_into_commit()
            .map_err(|e| Error::Graph(format!("{id} is not a commit: {e}")))?;

        let parents = commit.parent_ids().map(|p| commit_id(p.detach())).collect();
        let message = commit
            .message_raw()
            .map_err(|e| Error::Graph(format!("malformed commit {id}: {e}")))?
            .to_str_lossy()
            .into_owned();

        Ok(GraphCommit {
            id: id.clone(),
            parents,
            message,
        })
    }

    fn path(&self) -> &Path {
        &self.git_dir
    }

    fn is_ancestor(&self, ancestor: &CommitId, descendant: &CommitId) -> Result<bool> {
        if ancestor == descendant {
            return Ok(true);
        }
        let repo = self.repo.to_thread_local();
        let target = object_id(ancestor)?;
        let walk = repo
            .rev_walk([object_id(descendant)?])
            .all()
            .map_err(|e| Error::Graph(format!("cannot walk from {descendant}: {e}")))?;

        for info in walk {
            let info =
                info.map_err(|e| Error::Graph(format!("walk from {descendant} failed: {e}")))?;
            if info.id == target {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl RefUpdater for GitRepository {
    fn read_ref(&self, name: &str) -> Result<Option<CommitId>> {
        let repo = self.repo.to_thread_local();
        let Some(mut reference) = repo
            .try_find_reference(name)
            .map_err(|e| Error::Git(format!("cannot read {name}: {e}")))?
        else {
            return Ok(None);
        };
        let id = reference
            .peel_to_id_in_place()
            .map_err(|e| Error::Git(format!("cannot peel {name}: {e}")))?;
        Ok(Some(commit_id(id.detach())))
    }

    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<&CommitId>,
        new: &CommitId,
    ) -> Result<RefUpdateStatus> {
        let repo = self.repo.to_thread_local();
        let constraint = match expected {
            Some(old) => PreviousValue::MustExistAndMatch(Target::Object(object_id(old)?)),
            None => PreviousValue::MustNotExist,
        };

        match repo.reference(
            name,
            object_id(new)?,
            constraint,
            format!("ff-submit: fast-forward to {new}"),
        ) {
            Ok(_) => Ok(RefUpdateStatus::Updated),
            Err(e) => {
                let actual = self.read_ref(name)?;
                if actual.as_ref() == expected {
                    Err(Error::Git(format!("cannot update {name}: {e}")))
                } else {
                    debug!(%name, error = %e, "ref moved underneath us");
                    Ok(RefUpdateStatus::LockFailure { actual })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) -> String {
        let out = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .output()
            .unwrap();
        assert!(out.status.success(), "git {args:?} failed");
        String::from_utf8(out.stdout).unwrap().trim().to_string()
    }

    /// base <- fix on `main`, returning (dir, repo, base, fix)
    fn repo() -> (TempDir, GitRepository, CommitId, CommitId) {
        let dir = TempDir::new().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["commit", "-q", "--allow-empty", "-m", "base"]);
        git(dir.path(), &["branch", "-M", "main"]);
        let base = CommitId::new(git(dir.path(), &["rev-parse", "HEAD"]));
        git(
            dir.path(),
            &["commit", "-q", "--allow-empty", "-m", "Fix bug\n\nTICKET: 4521"],
        );
        let fix = CommitId::new(git(dir.path(), &["rev-parse", "HEAD"]));
        let repo = GitRepository::open(dir.path()).unwrap();
        (dir, repo, base, fix)
    }

    #[test]
    fn test_parse_commit() {
        let (_dir, repo, base, fix) = repo();
        let commit = repo.parse_commit(&fix).unwrap();
        assert_eq!(commit.parents, vec![base.clone()]);
        assert_eq!(commit.message.trim_end(), "Fix bug\n\nTICKET: 4521");
        assert!(repo.parse_commit(&base).unwrap().parents.is_empty());
    }

    #[test]
    fn test_missing_commit() {
        let (_dir, repo, _, _) = repo();
        let id = CommitId::new("1".repeat(40));
        assert!(matches!(repo.parse_commit(&id), Err(Error::MissingObject(_))));
    }

    #[test]
    fn test_is_ancestor() {
        let (_dir, repo, base, fix) = repo();
        assert!(repo.is_ancestor(&base, &fix).unwrap());
        assert!(repo.is_ancestor(&fix, &fix).unwrap());
        assert!(!repo.is_ancestor(&fix, &base).unwrap());
    }

    #[test]
    fn test_resolve() {
        let (_dir, repo, base, fix) = repo();
        assert_eq!(repo.resolve("HEAD").unwrap(), fix);
        assert_eq!(repo.resolve("main~1").unwrap(), base);
        assert!(repo.resolve("no-such-branch").is_err());
    }

    #[test]
    fn test_compare_and_swap() {
        let (dir, repo, base, fix) = repo();
        git(dir.path(), &["branch", "release", base.as_str()]);

        let status = repo
            .compare_and_swap("refs/heads/release", Some(&base), &fix)
            .unwrap();
        assert_eq!(status, RefUpdateStatus::Updated);
        assert_eq!(repo.read_ref("refs/heads/release").unwrap(), Some(fix.clone()));

        let status = repo
            .compare_and_swap("refs/heads/release", Some(&base), &base)
            .unwrap();
        assert_eq!(status, RefUpdateStatus::LockFailure { actual: Some(fix) });
        assert_eq!(repo.read_ref("refs/heads/missing").unwrap(), None);
    }
}
