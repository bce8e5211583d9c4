use tracing::debug;

use skiff_refs::{validate_remote_name, Direction, RefSpec};

use crate::error::{PushError, PushResult};
use crate::transport::Transport;
use crate::types::RemoteHead;

/// A named remote: where it is, how its refs map onto local tracking refs,
/// and the transport used to reach it.
pub struct Remote {
    name: String,
    url: String,
    fetch: Vec<RefSpec>,
    transport: Box<dyn Transport>,
    heads: Vec<RemoteHead>,
}

impl Remote {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        transport: Box<dyn Transport>,
    ) -> PushResult<Self> {
        let name = name.into();
        validate_remote_name(&name)?;
        Ok(Self {
            name,
            url: url.into(),
            fetch: Vec::new(),
            transport,
            heads: Vec::new(),
        })
    }

    /// Track every branch under `refs/remotes/<name>/`.
    pub fn with_default_fetch(mut self) -> PushResult<Self> {
        let spec = format!("+refs/heads/*:refs/remotes/{}/*", self.name);
        self.add_fetch(&spec)?;
        Ok(self)
    }

    pub fn add_fetch(&mut self, text: &str) -> PushResult<()> {
        let spec = RefSpec::parse(text, Direction::Fetch).map_err(|e| {
            PushError::InvalidReference {
                name: text.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.fetch.push(spec);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn fetch_refspecs(&self) -> &[RefSpec] {
        &self.fetch
    }

    /// The first fetch refspec whose source side matches `name` and that
    /// has somewhere to map it to.
    pub fn matching_fetch_refspec(&self, name: &str) -> Option<&RefSpec> {
        self.fetch
            .iter()
            .find(|spec| !spec.dst.is_empty() && spec.src_matches(name))
    }

    pub fn supports_push(&self) -> bool {
        self.transport.supports_push()
    }

    pub fn connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub async fn connect(&mut self, direction: Direction) -> PushResult<()> {
        self.transport.connect(direction).await?;
        debug!(remote = %self.name, url = %self.url, ?direction, "connected");
        Ok(())
    }

    /// Refresh the advertised heads from the remote.
    pub async fn ls(&mut self) -> PushResult<&[RemoteHead]> {
        self.heads = self.transport.list_heads().await?;
        debug!(remote = %self.name, heads = self.heads.len(), "listed remote heads");
        Ok(&self.heads)
    }

    /// Heads from the last [`Remote::ls`].
    pub fn heads(&self) -> &[RemoteHead] {
        &self.heads
    }

    pub fn transport_mut(&mut self) -> &mut dyn Transport {
        self.transport.as_mut()
    }

    pub async fn disconnect(&mut self) -> PushResult<()> {
        self.transport.close().await?;
        Ok(())
    }
}

impl std::fmt::Debug for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remote")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("fetch", &self.fetch)
            .field("heads", &self.heads.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalTransport;
    use crate::repository::Repository;

    fn remote() -> Remote {
        Remote::new(
            "origin",
            "memory://origin",
            Box::new(LocalTransport::new(Repository::in_memory())),
        )
        .unwrap()
        .with_default_fetch()
        .unwrap()
    }

    #[test]
    fn rejects_bad_remote_names() {
        let transport = Box::new(LocalTransport::new(Repository::in_memory()));
        assert!(Remote::new("a/b", "x", transport).is_err());
    }

    #[test]
    fn default_fetch_maps_branches() {
        let remote = remote();
        let spec = remote.matching_fetch_refspec("refs/heads/main").unwrap();
        assert_eq!(
            spec.transform("refs/heads/main").as_deref(),
            Some("refs/remotes/origin/main")
        );
        assert!(remote.matching_fetch_refspec("refs/tags/v1").is_none());
    }

    #[test]
    fn fetch_without_destination_never_matches() {
        let mut remote = remote();
        remote.add_fetch("refs/tags/v1").unwrap();
        assert!(remote.matching_fetch_refspec("refs/tags/v1").is_none());
    }

    #[tokio::test]
    async fn connect_and_list() {
        let mut remote = remote();
        assert!(!remote.connected());
        remote.connect(Direction::Push).await.unwrap();
        assert!(remote.connected());
        assert!(remote.ls().await.unwrap().is_empty());
        remote.disconnect().await.unwrap();
        assert!(!remote.connected());
    }
}
