//! Authorship and history of the commits under review.

use super::ReviewTrackingBranchPair;
use crate::{
    errors::{BranchError, BranchResult},
    git::{CommitInfo, Commits, RefGateway},
};
use itertools::{process_results, Itertools};

impl<'g, G: RefGateway> ReviewTrackingBranchPair<'g, G> {
    /// Returns the distinct author emails of the commits on the review branch that are
    /// not on its base, in the order they are first seen (newest first).
    ///
    /// ## Returns
    /// - `Err(BranchError::NoHistory)` - If the review branch does not resolve.
    /// - `Err(BranchError::InvalidBase)` - If the base does not resolve.
    /// - `Err(BranchError::NoCommits)` - If the review adds no commits to its base.
    pub fn get_author_emails(&self) -> BranchResult<Vec<String>> {
        let emails = process_results(self.commits_since_base()?, |commits| {
            commits.map(|c| c.author.email).unique().collect_vec()
        })?;
        self.non_empty(emails)
    }

    /// Returns the distinct `(name, email)` pairs of the commits on the review branch
    /// that are not on its base. Fails like [Self::get_author_emails].
    pub fn get_author_names_emails(&self) -> BranchResult<Vec<(String, String)>> {
        let authors = process_results(self.commits_since_base()?, |commits| {
            commits
                .map(|c| (c.author.name, c.author.email))
                .unique()
                .collect_vec()
        })?;
        self.non_empty(authors)
    }

    /// Like [Self::get_author_emails], but falls back to the author of the review tip
    /// when the review adds no commits to its base.
    ///
    /// ## Returns
    /// - `Err(BranchError::NoHistory)` - Only if the review branch has no commits at all.
    pub fn get_any_author_emails(&self) -> BranchResult<Vec<String>> {
        match self.get_author_emails() {
            Err(BranchError::NoCommits(_)) => {}
            other => return other,
        }

        let tip = self.review_tip.ok_or_else(|| self.no_history())?;
        let commit = self.gateway.commit_info(tip)?;
        Ok(vec![commit.author.email])
    }

    /// Returns the commits added to the review branch since the tracking branch was last
    /// written, newest first. An untracked review describes every commit since its base.
    pub fn describe_new_commits(&self) -> BranchResult<Vec<CommitInfo>> {
        let tip = self.review_tip.ok_or_else(|| self.no_history())?;
        let since = match self.tracking_target {
            Some(target) => target,
            None => {
                let base = self.base_branch_name()?;
                self.gateway
                    .resolve(base)?
                    .ok_or_else(|| BranchError::InvalidBase(base.to_string()))?
            }
        };

        Ok(self
            .gateway
            .commits_between(since, tip)?
            .collect::<Result<Vec<_>, _>>()?)
    }

    fn commits_since_base(&self) -> BranchResult<Commits<'g>> {
        let gateway: &'g G = self.gateway;
        let tip = self.review_tip.ok_or_else(|| self.no_history())?;
        let base = self.base_branch_name()?;
        let base_tip = gateway
            .resolve(base)?
            .ok_or_else(|| BranchError::InvalidBase(base.to_string()))?;

        Ok(gateway.commits_between(base_tip, tip)?)
    }

    fn non_empty<T>(&self, items: Vec<T>) -> BranchResult<Vec<T>> {
        if items.is_empty() {
            return Err(BranchError::NoCommits(self.review_branch_name()));
        }
        Ok(items)
    }

    fn no_history(&self) -> BranchError {
        BranchError::NoHistory(self.review_branch_name())
    }
}

#[cfg(test)]
mod test {
    use crate::{
        branch::ReviewTrackingBranchPair,
        errors::BranchError,
        git::GitGateway,
        naming::{parse_review, ReviewBranchDescription},
        test_utils::Fixture,
    };

    const BRANCH: &str = "r/master/authors";

    fn review_pair<'a>(
        fixture: &'a Fixture,
        name: &str,
    ) -> ReviewTrackingBranchPair<'a, GitGateway> {
        ReviewTrackingBranchPair::new(&fixture.gateway, parse_review(name).unwrap(), None).unwrap()
    }

    #[test]
    fn distinct_emails_in_range() {
        let fixture = Fixture::new();
        fixture.commit_on(BRANCH, "one.txt", "alice");
        fixture.commit_on(BRANCH, "two.txt", "bob");
        fixture.commit_on(BRANCH, "three.txt", "alice");

        let pair = review_pair(&fixture, BRANCH);
        assert_eq!(
            pair.get_author_emails().unwrap(),
            vec!["alice@example.com".to_string(), "bob@example.com".to_string()]
        );
        assert_eq!(
            pair.get_author_names_emails().unwrap(),
            vec![
                ("alice".to_string(), "alice@example.com".to_string()),
                ("bob".to_string(), "bob@example.com".to_string()),
            ]
        );
    }

    #[test]
    fn no_commits_when_tip_is_base() {
        let fixture = Fixture::new();
        fixture.point(BRANCH, fixture.master);

        let pair = review_pair(&fixture, BRANCH);
        assert!(matches!(
            pair.get_author_emails(),
            Err(BranchError::NoCommits(ref name)) if name == BRANCH
        ));
        assert_eq!(
            pair.get_any_author_emails().unwrap(),
            vec!["root@example.com".to_string()]
        );
    }

    #[test]
    fn invalid_base() {
        let fixture = Fixture::new();
        let branch = "r/develop/authors";
        fixture.commit_on(branch, "one.txt", "alice");

        let pair = review_pair(&fixture, branch);
        assert!(matches!(
            pair.get_author_emails(),
            Err(BranchError::InvalidBase(ref base)) if base == "develop"
        ));
        assert!(matches!(
            pair.get_any_author_emails(),
            Err(BranchError::InvalidBase(_))
        ));
    }

    #[test]
    fn no_history_without_review_branch() {
        let fixture = Fixture::new();
        let review = ReviewBranchDescription::new("missing", "master").unwrap();
        let pair = ReviewTrackingBranchPair::new(&fixture.gateway, review, None).unwrap();

        assert!(matches!(
            pair.get_any_author_emails(),
            Err(BranchError::NoHistory(_))
        ));
        assert!(matches!(
            pair.describe_new_commits(),
            Err(BranchError::NoHistory(_))
        ));
    }

    #[test]
    fn unicode_author_names() {
        let fixture = Fixture::new();
        let repository = fixture.repository();
        let parent = repository.find_commit(fixture.master).unwrap();
        let tree = parent.tree().unwrap();
        let signature = git2::Signature::now("caf\u{e9}", "cafe@example.com").unwrap();
        let oid = repository
            .commit(None, &signature, &signature, "bytes \u{fffd}", &tree, &[&parent])
            .unwrap();
        fixture.point(BRANCH, oid);

        let pair = review_pair(&fixture, BRANCH);
        assert_eq!(
            pair.get_author_names_emails().unwrap(),
            vec![("caf\u{e9}".to_string(), "cafe@example.com".to_string())]
        );
    }

    #[test]
    fn new_commits_since_tracking() {
        let fixture = Fixture::new();
        fixture.commit_on(BRANCH, "one.txt", "alice");

        let mut tracked = review_pair(&fixture, BRANCH);
        assert_eq!(tracked.describe_new_commits().unwrap().len(), 1);
        tracked.mark_ok_new_review(1).unwrap();

        let latest = fixture.commit_on(BRANCH, "two.txt", "bob");
        let tracking = tracked.tracking().cloned();
        let rebuilt = ReviewTrackingBranchPair::new(
            &fixture.gateway,
            parse_review(BRANCH).unwrap(),
            tracking,
        )
        .unwrap();

        let commits = rebuilt.describe_new_commits().unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].id, latest);
        assert_eq!(commits[0].summary, "add two.txt");
    }
}
