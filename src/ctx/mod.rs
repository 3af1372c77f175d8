//! The in-memory context of the `rt` application.

use crate::{
    branch::ReviewTrackingBranchPair,
    config::{config_path, RtConfig},
    discover::{discover, Discovery},
    git::{GitGateway, RefGateway},
    naming::parse_review,
};
use anyhow::{anyhow, Result};
use git2::Repository;
use std::path::PathBuf;
use tracing::{debug, warn};

mod fmt;

/// The in-memory context of the `rt` application.
pub struct RtContext {
    /// The gateway over the repository `rt` runs against.
    pub gateway: GitGateway,
    /// The configuration loaded for the repository.
    pub config: RtConfig,
    /// Where [RtContext::config] was loaded from.
    pub config_path: PathBuf,
}

impl RtContext {
    /// Loads the [RtConfig] for the given [Repository], and assembles an [RtContext] around it.
    pub fn load(repository: Repository) -> Result<Self> {
        let config_path = config_path(&repository);
        let config = RtConfig::load(&config_path)?;
        let remote = match config.sync_remote() {
            Some(_) if !repository.is_bare() => {
                warn!(
                    "Not syncing with `{}`: {} is a working clone, run `rt` in a bare mirror",
                    config.remote,
                    repository.path().display()
                );
                None
            }
            remote => remote.map(ToOwned::to_owned),
        };

        Ok(Self {
            gateway: GitGateway::new(repository, remote),
            config,
            config_path,
        })
    }

    /// Fetches the remote's branches, if synchronization is enabled.
    pub fn sync_in(&self) -> Result<()> {
        self.gateway.fetch()?;
        Ok(())
    }

    /// Pushes the given branches to the remote, if synchronization is enabled.
    pub fn publish(&self, names: &[&str]) -> Result<()> {
        debug!("Publishing {:?}", names);
        self.gateway.push(names)?;
        Ok(())
    }

    /// Groups the repository's branches into reviews.
    pub fn discover(&self) -> Result<Discovery> {
        Ok(discover(&self.gateway)?)
    }

    /// Builds the pair for the review branch named `name`, including its tracking branch
    /// if one exists.
    pub fn pair(&self, name: &str) -> Result<ReviewTrackingBranchPair<'_, GitGateway>> {
        let review = parse_review(name)?;
        let discovery = self.discover()?;
        let pair = match discovery.find(name) {
            Some(found) => found.clone().into_pair(&self.gateway)?,
            None => ReviewTrackingBranchPair::new(&self.gateway, review, None)?,
        };

        if pair.is_null() {
            return Err(anyhow!("Review branch `{}` does not exist.", name));
        }
        Ok(pair)
    }
}

#[cfg(test)]
mod test {
    use super::RtContext;
    use crate::{git::RefGateway, test_utils::Fixture};

    #[test]
    fn working_clone_stays_local() {
        let upstream = Fixture::new();
        let local = Fixture::working();
        let url = upstream.repository().path().to_str().unwrap().to_string();
        local.repository().remote("origin", &url).unwrap();
        let wip = local.commit_on("wip", "wip.txt", "alice");

        let ctx = RtContext::load(local.reopen()).unwrap();
        assert_eq!(ctx.config.sync_remote(), Some("origin"));
        ctx.sync_in().unwrap();
        ctx.publish(&["wip"]).unwrap();

        assert_eq!(ctx.gateway.resolve("wip").unwrap(), Some(wip));
        assert_eq!(upstream.gateway.resolve("wip").unwrap(), None);
    }
}
