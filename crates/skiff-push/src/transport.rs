use async_trait::async_trait;

use skiff_pack::PackBuilder;
use skiff_refs::Direction;

use crate::error::{TransportError, TransportResult};
use crate::types::{PushStatus, RemoteHead, UpdateSpec};

/// Everything a transport needs to perform a push.
pub struct PushRequest<'r, 'p> {
    /// The outgoing object set; the transport encodes it as it sees fit.
    pub pack: &'r mut PackBuilder<'p>,
    /// Ref update commands, ordered by destination.
    pub specs: &'r [UpdateSpec],
    /// Ask the remote for one status per ref.
    pub report_status: bool,
}

/// What the remote said about a push.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PushReport {
    /// The remote materialized the transmitted objects.
    pub unpack_ok: bool,
    /// Per-ref outcomes; empty when status reporting was not requested.
    pub statuses: Vec<PushStatus>,
}

/// Connection to a remote repository.
///
/// Transports own framing, authentication, timeouts and retries; the push
/// engine only sequences calls.
#[async_trait]
pub trait Transport: Send {
    /// Whether [`Transport::push`] is implemented.
    fn supports_push(&self) -> bool {
        false
    }

    async fn connect(&mut self, direction: Direction) -> TransportResult<()>;

    fn is_connected(&self) -> bool;

    /// The refs the remote currently advertises.
    async fn list_heads(&mut self) -> TransportResult<Vec<RemoteHead>>;

    /// Send the pack and ref update commands and collect the remote's report.
    async fn push(&mut self, request: PushRequest<'_, '_>) -> TransportResult<PushReport> {
        let _ = request;
        Err(TransportError::Unsupported("push"))
    }

    async fn close(&mut self) -> TransportResult<()>;
}
