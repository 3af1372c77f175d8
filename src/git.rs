//! Access to git refs and history for the `rt` application.
//!
//! Everything the branch pair needs from git goes through the [RefGateway] trait. The
//! gateway is an explicit handle rather than ambient state, so several repositories can
//! be driven side by side. [GitGateway] implements it on top of `git2`.

use crate::{
    constants::REFLOG_PREFIX,
    errors::{GatewayError, GatewayResult},
};
use git2::{
    BranchType, ErrorCode, FetchOptions, FetchPrune, Oid, PushOptions, RemoteCallbacks,
    Repository, Signature, Sort,
};
use std::{env, path::Path};
use tracing::{debug, info, warn};

/// Returns the repository for the current working directory, and [None] if
/// the current working directory is not within a git repository or an error
/// occurs.
pub fn active_repository() -> Option<Repository> {
    Repository::discover(env::current_dir().ok()?).ok()
}

/// Returns the repository containing `path`, and [None] if there is none.
pub fn repository_at(path: &Path) -> Option<Repository> {
    Repository::discover(path).ok()
}

/// The author of a commit.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Returns a [Signature] for this identity, stamped with the current time.
    pub fn signature(&self) -> GatewayResult<Signature<'static>> {
        Signature::now(&self.name, &self.email).map_err(Into::into)
    }
}

/// Metadata of a single commit.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommitInfo {
    pub id: Oid,
    pub author: Identity,
    /// The first line of the commit message.
    pub summary: String,
}

/// The value a ref must hold for a [RefEdit] to go through.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Expect {
    /// No expectation.
    Any,
    /// The ref must not exist.
    Absent,
    /// The ref must point at the given object.
    Target(Oid),
}

/// A single compare-and-swap edit of a branch ref.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RefEdit<'a> {
    /// The branch name, without `refs/heads/`.
    pub name: &'a str,
    pub expect: Expect,
    /// The new target of the ref; [None] removes it.
    pub target: Option<Oid>,
}

impl<'a> RefEdit<'a> {
    /// An edit pointing `name` at `target`.
    pub fn write(name: &'a str, target: Oid, expect: Expect) -> Self {
        Self {
            name,
            expect,
            target: Some(target),
        }
    }

    /// An edit removing `name`.
    pub fn remove(name: &'a str, expect: Expect) -> Self {
        Self {
            name,
            expect,
            target: None,
        }
    }
}

/// The result of [RefGateway::squash_merge].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MergeOutcome {
    /// A new commit on top of the base, holding the merged tree.
    Merged(Oid),
    /// The tip does not merge cleanly onto the base.
    Conflicted,
    /// Merging would not change the base's tree.
    Empty,
}

/// A lazy, single-pass sequence of commits.
pub type Commits<'a> = Box<dyn Iterator<Item = GatewayResult<CommitInfo>> + 'a>;

/// The git capabilities consumed by a [ReviewTrackingBranchPair].
///
/// Names passed to and returned from a gateway are branch names, without `refs/heads/`.
///
/// [ReviewTrackingBranchPair]: crate::branch::ReviewTrackingBranchPair
pub trait RefGateway {
    /// Returns the object a branch points at, or [None] if it does not exist.
    fn resolve(&self, name: &str) -> GatewayResult<Option<Oid>>;

    /// Returns the names of all branches, sorted.
    fn list_branches(&self) -> GatewayResult<Vec<String>>;

    /// Applies all `edits` atomically.
    ///
    /// ## Returns
    /// - `Err(GatewayError::RefWriteConflict)` - If any edit's [Expect] does not hold; no
    ///   edit is applied in that case.
    fn apply(&self, edits: &[RefEdit<'_>]) -> GatewayResult<()>;

    /// Points `name` at `target`, provided it currently satisfies `expect`.
    fn create_or_replace_ref(&self, name: &str, target: Oid, expect: Expect) -> GatewayResult<()> {
        self.apply(&[RefEdit::write(name, target, expect)])
    }

    /// Removes `name`. Removing a branch that does not exist is not an error.
    fn delete_ref(&self, name: &str) -> GatewayResult<()> {
        self.apply(&[RefEdit::remove(name, Expect::Any)])
    }

    /// Returns the commits reachable from `tip` but not from `base`, newest first.
    fn commits_between(&self, base: Oid, tip: Oid) -> GatewayResult<Commits<'_>>;

    /// Returns the metadata of a single commit.
    fn commit_info(&self, id: Oid) -> GatewayResult<CommitInfo>;

    /// Creates a single commit on top of `base` holding the merge of `tip` into it.
    ///
    /// No ref is moved; the caller publishes the commit with [RefGateway::apply].
    fn squash_merge(
        &self,
        base: Oid,
        tip: Oid,
        author: &Identity,
        message: &str,
    ) -> GatewayResult<MergeOutcome>;

    /// Brings every branch up to date with the remote.
    ///
    /// ## Returns
    /// - `Err(GatewayError::NotBare)` - If the branches belong to a working clone, whose
    ///   local branches a mirroring fetch would overwrite.
    fn fetch(&self) -> GatewayResult<()>;

    /// Publishes the current state of `names` to the remote, deleting the ones that no
    /// longer exist locally.
    fn push(&self, names: &[&str]) -> GatewayResult<()>;
}

/// A [RefGateway] over the branches of a git repository.
///
/// The repository is expected to mirror the remote (typically a bare clone), so its
/// `refs/heads/*` are the remote's branches as of the last [RefGateway::fetch].
pub struct GitGateway {
    repository: Repository,
    remote: Option<String>,
}

impl GitGateway {
    /// Creates a new [GitGateway].
    ///
    /// ## Takes
    /// - `repository` - The repository holding the branches.
    /// - `remote` - The remote to fetch from and push to. [None] makes [RefGateway::fetch]
    ///   and [RefGateway::push] no-ops.
    pub fn new(repository: Repository, remote: Option<String>) -> Self {
        Self { repository, remote }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// The signature used for reflog entries and landed commits.
    fn signature(&self) -> GatewayResult<Signature<'static>> {
        match self.repository.signature() {
            Ok(signature) => Ok(signature),
            Err(_) => Identity::new(REFLOG_PREFIX, "rt@localhost").signature(),
        }
    }
}

fn full_name(name: &str) -> String {
    format!("refs/heads/{}", name)
}

impl RefGateway for GitGateway {
    fn resolve(&self, name: &str) -> GatewayResult<Option<Oid>> {
        match self.repository.refname_to_id(&full_name(name)) {
            Ok(oid) => Ok(Some(oid)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_branches(&self) -> GatewayResult<Vec<String>> {
        let mut names = Vec::new();
        for branch in self.repository.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            match branch.name()? {
                Some(name) => names.push(name.to_string()),
                None => warn!("Skipping branch with a non-utf8 name"),
            }
        }
        names.sort();
        Ok(names)
    }

    fn apply(&self, edits: &[RefEdit<'_>]) -> GatewayResult<()> {
        let signature = self.signature()?;
        let mut transaction = self.repository.transaction()?;

        for edit in edits {
            transaction
                .lock_ref(&full_name(edit.name))
                .map_err(|e| match e.code() {
                    ErrorCode::Locked => GatewayError::RefWriteConflict(edit.name.to_string()),
                    _ => e.into(),
                })?;
        }

        for edit in edits {
            let current = self.resolve(edit.name)?;
            let holds = match edit.expect {
                Expect::Any => true,
                Expect::Absent => current.is_none(),
                Expect::Target(oid) => current == Some(oid),
            };
            if !holds {
                warn!(
                    "Ref `{}` is at {:?}, expected {:?}",
                    edit.name, current, edit.expect
                );
                return Err(GatewayError::RefWriteConflict(edit.name.to_string()));
            }

            let full = full_name(edit.name);
            match (edit.target, current) {
                (Some(target), _) => transaction.set_target(
                    &full,
                    target,
                    Some(&signature),
                    &format!("{}: update {}", REFLOG_PREFIX, edit.name),
                )?,
                (None, Some(_)) => transaction.remove(&full)?,
                (None, None) => {}
            }
        }

        transaction.commit()?;
        debug!("Applied {} ref edit(s)", edits.len());
        Ok(())
    }

    fn commits_between(&self, base: Oid, tip: Oid) -> GatewayResult<Commits<'_>> {
        let mut walk = self.repository.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        walk.push(tip)?;
        walk.hide(base)?;

        Ok(Box::new(walk.map(move |id| self.commit_info(id?))))
    }

    fn commit_info(&self, id: Oid) -> GatewayResult<CommitInfo> {
        let commit = self.repository.find_commit(id)?;
        let author = commit.author();

        Ok(CommitInfo {
            id,
            author: Identity::new(
                String::from_utf8_lossy(author.name_bytes()),
                String::from_utf8_lossy(author.email_bytes()),
            ),
            summary: String::from_utf8_lossy(commit.summary_bytes().unwrap_or_default())
                .into_owned(),
        })
    }

    fn squash_merge(
        &self,
        base: Oid,
        tip: Oid,
        author: &Identity,
        message: &str,
    ) -> GatewayResult<MergeOutcome> {
        let base_commit = self.repository.find_commit(base)?;
        let tip_commit = self.repository.find_commit(tip)?;

        let mut index = self
            .repository
            .merge_commits(&base_commit, &tip_commit, None)?;
        if index.has_conflicts() {
            return Ok(MergeOutcome::Conflicted);
        }

        let tree_id = index.write_tree_to(&self.repository)?;
        if tree_id == base_commit.tree_id() {
            return Ok(MergeOutcome::Empty);
        }

        let tree = self.repository.find_tree(tree_id)?;
        let oid = self.repository.commit(
            None,
            &author.signature()?,
            &self.signature()?,
            message,
            &tree,
            &[&base_commit],
        )?;
        Ok(MergeOutcome::Merged(oid))
    }

    fn fetch(&self) -> GatewayResult<()> {
        let Some(remote_name) = self.remote.as_deref() else {
            return Ok(());
        };

        // Fetching mirrors the remote's branches over the local ones, pruning the rest.
        if !self.repository.is_bare() {
            return Err(GatewayError::NotBare(
                self.repository.path().display().to_string(),
            ));
        }

        let mut remote = self.repository.find_remote(remote_name)?;
        let mut opts = FetchOptions::new();
        opts.prune(FetchPrune::On);
        remote.fetch(&["+refs/heads/*:refs/heads/*"], Some(&mut opts), None)?;

        info!("Fetched branches from `{}`", remote_name);
        Ok(())
    }

    fn push(&self, names: &[&str]) -> GatewayResult<()> {
        let Some(remote_name) = self.remote.as_deref() else {
            return Ok(());
        };
        if names.is_empty() {
            return Ok(());
        }

        let refspecs = names
            .iter()
            .map(|name| {
                let full = full_name(name);
                Ok(match self.resolve(name)? {
                    Some(_) => format!("{}:{}", full, full),
                    None => format!(":{}", full),
                })
            })
            .collect::<GatewayResult<Vec<_>>>()?;

        let mut remote = self.repository.find_remote(remote_name)?;
        let mut rejected = Vec::new();
        {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    warn!("`{}` rejected `{}`: {}", remote_name, refname, status);
                    rejected.push(refname.trim_start_matches("refs/heads/").to_string());
                }
                Ok(())
            });
            let mut opts = PushOptions::new();
            opts.remote_callbacks(callbacks);
            remote.push(&refspecs, Some(&mut opts))?;
        }

        match rejected.into_iter().next() {
            Some(name) => Err(GatewayError::RefWriteConflict(name)),
            None => {
                info!("Pushed {} branch(es) to `{}`", names.len(), remote_name);
                Ok(())
            }
        }
    }
}
