//! An in-process remote.
//!
//! [`LocalTransport`] plays both sides of a push against another
//! [`Repository`] in the same process: it encodes the pack, indexes and
//! unpacks it into the remote's object store, then applies each ref update
//! the way a receiving server would.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use skiff_pack::PackReader;
use skiff_refs::{Direction, Target};
use skiff_store::ObjectKind;
use skiff_types::ObjectId;

use crate::error::{TransportError, TransportResult};
use crate::repository::Repository;
use crate::transport::{PushReport, PushRequest, Transport};
use crate::types::{PushStatus, RemoteHead, UpdateSpec};

/// Receive-side policies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReceiveConfig {
    /// Refuse ref deletions.
    pub deny_deletes: bool,
    /// Refuse updates that are not fast-forwards, even forced ones.
    pub deny_non_fast_forwards: bool,
}

pub struct LocalTransport {
    remote: Repository,
    config: ReceiveConfig,
    connected: Option<Direction>,
}

impl LocalTransport {
    pub fn new(remote: Repository) -> Self {
        Self::with_config(remote, ReceiveConfig::default())
    }

    pub fn with_config(remote: Repository, config: ReceiveConfig) -> Self {
        Self {
            remote,
            config,
            connected: None,
        }
    }

    /// The repository being pushed into.
    pub fn repository(&self) -> &Repository {
        &self.remote
    }

    fn unpack(&self, bytes: Vec<u8>) -> Result<usize, String> {
        let reader = PackReader::index_pack(bytes).map_err(|e| e.to_string())?;
        let mut written = 0;
        for entry in reader.objects() {
            let (id, obj) = entry.map_err(|e| e.to_string())?;
            let stored = self.remote.objects.write(&obj).map_err(|e| e.to_string())?;
            if stored != id {
                return Err(format!("object {id} stored as {stored}"));
            }
            written += 1;
        }
        Ok(written)
    }

    /// Apply one update command; `None` means accepted.
    fn receive(&self, spec: &UpdateSpec) -> Option<String> {
        let current = match self.remote.refs.find(&spec.dst) {
            Ok(Some(reference)) => match reference.target {
                Target::Direct(id) => id,
                Target::Symbolic(_) => return Some("cannot update a symbolic ref".into()),
            },
            Ok(None) => ObjectId::NULL,
            Err(e) => return Some(e.to_string()),
        };
        if current != spec.remote_id {
            return Some("fetch first".into());
        }

        if spec.is_delete() {
            if self.config.deny_deletes {
                return Some("deletion prohibited".into());
            }
            return match self.remote.refs.delete(&spec.dst) {
                Ok(_) => None,
                Err(e) => Some(e.to_string()),
            };
        }

        match self.remote.objects.exists(&spec.local_id) {
            Ok(true) => {}
            Ok(false) => return Some("missing necessary objects".into()),
            Err(e) => return Some(e.to_string()),
        }
        if self.config.deny_non_fast_forwards
            && !current.is_null()
            && !self.is_fast_forward(&current, &spec.local_id)
        {
            return Some("non-fast-forward".into());
        }

        match self
            .remote
            .refs
            .create(&spec.dst, spec.local_id, true, "push")
        {
            Ok(_) => None,
            Err(e) => Some(format!("failed to update ref: {e}")),
        }
    }

    fn is_fast_forward(&self, old: &ObjectId, new: &ObjectId) -> bool {
        let objects = self.remote.objects();
        if !matches!(objects.read_header(old), Ok(Some((ObjectKind::Commit, _)))) {
            return false;
        }
        let Ok(new) = skiff_revwalk::peel_to_commit(objects, new) else {
            return false;
        };
        skiff_revwalk::is_ancestor(objects, old, &new).unwrap_or(false)
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn supports_push(&self) -> bool {
        true
    }

    async fn connect(&mut self, direction: Direction) -> TransportResult<()> {
        self.connected = Some(direction);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.is_some()
    }

    async fn list_heads(&mut self) -> TransportResult<Vec<RemoteHead>> {
        if self.connected.is_none() {
            return Err(TransportError::NotConnected);
        }
        let refs = self
            .remote
            .refs
            .list("")
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        let mut heads = Vec::with_capacity(refs.len());
        for reference in refs {
            match self.remote.refs.name_to_id(&reference.name) {
                Ok(id) => heads.push(RemoteHead::new(reference.name, id)),
                Err(e) => debug!(name = %reference.name, error = %e, "not advertising ref"),
            }
        }
        Ok(heads)
    }

    async fn push(&mut self, request: PushRequest<'_, '_>) -> TransportResult<PushReport> {
        match self.connected {
            Some(Direction::Push) => {}
            Some(Direction::Fetch) => {
                return Err(TransportError::Protocol("connected for fetch".into()))
            }
            None => return Err(TransportError::NotConnected),
        }

        let (bytes, _) = request.pack.write_to_vec()?;
        let pack_len = bytes.len();

        let mut statuses: Vec<PushStatus> = match self.unpack(bytes) {
            Ok(written) => {
                debug!(objects = written, bytes = pack_len, "unpacked received pack");
                request
                    .specs
                    .iter()
                    .map(|spec| match self.receive(spec) {
                        None => PushStatus::accepted(&spec.dst),
                        Some(reason) => {
                            debug!(reference = %spec.dst, %reason, "update refused");
                            PushStatus::rejected(&spec.dst, reason)
                        }
                    })
                    .collect()
            }
            Err(reason) => {
                warn!(%reason, "unpack failed");
                let statuses: Vec<PushStatus> = request
                    .specs
                    .iter()
                    .map(|spec| PushStatus::rejected(&spec.dst, "unpacker error"))
                    .collect();
                let statuses = if request.report_status { statuses } else { Vec::new() };
                return Ok(PushReport {
                    unpack_ok: false,
                    statuses,
                });
            }
        };

        if !request.report_status {
            statuses.clear();
        }
        statuses.sort_by(|a, b| a.ref_name.cmp(&b.ref_name));
        Ok(PushReport {
            unpack_ok: true,
            statuses,
        })
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.connected = None;
        Ok(())
    }
}
