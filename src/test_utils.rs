//! Git repository fixtures for tests.

use crate::git::{GitGateway, RefGateway};
use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

/// A repository in a temporary directory, with a single commit on `master`.
pub(crate) struct Fixture {
    pub(crate) gateway: GitGateway,
    /// The initial commit on `master`.
    pub(crate) master: Oid,
    dir: TempDir,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::init(true)
    }

    /// Like [Fixture::new], but with a working directory, as a developer's clone has.
    pub(crate) fn working() -> Self {
        Self::init(false)
    }

    fn init(bare: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repository = if bare {
            Repository::init_bare(dir.path()).unwrap()
        } else {
            Repository::init(dir.path()).unwrap()
        };

        let master = {
            let signature = Signature::now("root", "root@example.com").unwrap();
            let blob = repository.blob(b"readme").unwrap();
            let mut builder = repository.treebuilder(None).unwrap();
            builder.insert("README", blob, 0o100644).unwrap();
            let tree = repository.find_tree(builder.write().unwrap()).unwrap();
            repository
                .commit(
                    Some("refs/heads/master"),
                    &signature,
                    &signature,
                    "initial commit",
                    &tree,
                    &[],
                )
                .unwrap()
        };

        Self {
            gateway: GitGateway::new(repository, None),
            master,
            dir,
        }
    }

    pub(crate) fn repository(&self) -> &Repository {
        self.gateway.repository()
    }

    /// Opens a second handle on the fixture's repository.
    pub(crate) fn reopen(&self) -> Repository {
        Repository::open(self.dir.path()).unwrap()
    }

    /// Commits a file named `file` (containing its own name) on top of `branch`, creating
    /// the branch from `master` if it does not exist yet.
    pub(crate) fn commit_on(&self, branch: &str, file: &str, author: &str) -> Oid {
        self.write_on(branch, file, file, author)
    }

    /// Commits `file` with `contents` on top of `branch`, creating the branch from
    /// `master` if it does not exist yet.
    pub(crate) fn write_on(&self, branch: &str, file: &str, contents: &str, author: &str) -> Oid {
        let repository = self.repository();
        let parent_id = self
            .gateway
            .resolve(branch)
            .unwrap()
            .unwrap_or(self.master);
        let parent = repository.find_commit(parent_id).unwrap();

        let blob = repository.blob(contents.as_bytes()).unwrap();
        let mut builder = repository
            .treebuilder(Some(&parent.tree().unwrap()))
            .unwrap();
        builder.insert(file, blob, 0o100644).unwrap();
        let tree = repository.find_tree(builder.write().unwrap()).unwrap();

        let signature = Signature::now(author, &format!("{}@example.com", author)).unwrap();
        let oid = repository
            .commit(
                None,
                &signature,
                &signature,
                &format!("add {}", file),
                &tree,
                &[&parent],
            )
            .unwrap();
        self.point(branch, oid);
        oid
    }

    /// Points `branch` at `target`, creating it if needed.
    pub(crate) fn point(&self, branch: &str, target: Oid) {
        self.repository()
            .reference(&format!("refs/heads/{}", branch), target, true, "test")
            .unwrap();
    }

    /// Removes `branch` behind the gateway's back.
    pub(crate) fn remove(&self, branch: &str) {
        self.repository()
            .find_reference(&format!("refs/heads/{}", branch))
            .unwrap()
            .delete()
            .unwrap();
    }
}
