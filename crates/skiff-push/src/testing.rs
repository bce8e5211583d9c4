//! Fixtures shared by the tests in this crate.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use skiff_refs::{Direction, InMemoryRefStore, RefStore};
use skiff_store::{
    Blob, Commit, EntryMode, InMemoryObjectStore, ObjectStore, Tag, Tree, TreeEntry,
};
use skiff_types::{ObjectId, Signature};

use crate::error::{TransportError, TransportResult};
use crate::local::{LocalTransport, ReceiveConfig};
use crate::remote::Remote;
use crate::repository::Repository;
use crate::transport::{PushReport, PushRequest, Transport};
use crate::types::{PushStatus, RemoteHead};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// An in-memory repository with helpers for building history.
pub struct TestRepo {
    pub objects: Arc<InMemoryObjectStore>,
    pub refs: Arc<InMemoryRefStore>,
    pub repo: Repository,
    clock: i64,
}

impl TestRepo {
    pub fn new() -> Self {
        let objects = Arc::new(InMemoryObjectStore::new());
        let refs = Arc::new(InMemoryRefStore::new());
        let repo = Repository::new(objects.clone(), refs.clone());
        Self {
            objects,
            refs,
            repo,
            clock: 1_000,
        }
    }

    pub fn blob(&self, data: &str) -> ObjectId {
        self.objects
            .write(&Blob::new(data.as_bytes().to_vec()).to_stored_object())
            .unwrap()
    }

    /// A commit whose tree holds one file named after `message`.
    pub fn commit(&mut self, message: &str, parents: &[ObjectId]) -> ObjectId {
        self.clock += 60;
        let blob = self.blob(message);
        let tree = Tree::new(vec![TreeEntry::new(EntryMode::Regular, message, blob)]);
        let tree = self.objects.write(&tree.to_stored_object().unwrap()).unwrap();
        let sig = Signature::new("Tester", "tester@example.com", self.clock);
        let commit = Commit {
            tree,
            parents: parents.to_vec(),
            author: sig.clone(),
            committer: sig,
            message: message.to_string(),
        };
        self.objects.write(&commit.to_stored_object().unwrap()).unwrap()
    }

    /// An annotated tag on `target`.
    pub fn tag(&self, name: &str, target: ObjectId) -> ObjectId {
        let (target_kind, _) = self.objects.read_header(&target).unwrap().unwrap();
        let tag = Tag {
            target,
            target_kind,
            name: name.to_string(),
            tagger: Some(Signature::new("Tester", "tester@example.com", 0)),
            message: format!("tag {name}"),
        };
        self.objects.write(&tag.to_stored_object().unwrap()).unwrap()
    }

    pub fn set_ref(&self, name: &str, id: ObjectId) {
        self.refs.create(name, id, true, "test").unwrap();
    }

    pub fn ref_id(&self, name: &str) -> Option<ObjectId> {
        self.refs.find(name).unwrap().and_then(|r| r.id())
    }

    /// Copy every object this repository holds into `other`.
    pub fn copy_objects_to(&self, other: &TestRepo) {
        for id in self.objects.all_ids().unwrap() {
            let obj = self.objects.find(&id).unwrap();
            other.objects.write(&obj).unwrap();
        }
    }
}

/// A local repository, a server repository, and `origin` pointing at the
/// server through a [`LocalTransport`].
pub struct Setup {
    pub local: TestRepo,
    pub server: TestRepo,
    pub remote: Remote,
}

pub fn setup() -> Setup {
    setup_with(ReceiveConfig::default())
}

pub fn setup_with(config: ReceiveConfig) -> Setup {
    init_tracing();
    let local = TestRepo::new();
    let server = TestRepo::new();
    let transport = LocalTransport::with_config(server.repo.clone(), config);
    let remote = Remote::new("origin", "memory://server", Box::new(transport))
        .unwrap()
        .with_default_fetch()
        .unwrap();
    Setup {
        local,
        server,
        remote,
    }
}

/// What a [`MockTransport`] does when asked to push.
#[derive(Clone, Debug)]
pub enum MockPush {
    /// Accept every ref.
    AcceptAll,
    /// Return this report as is.
    Report(PushReport),
    /// Fail with a connection error.
    Fail(String),
}

/// A scripted transport that records what it was asked to send.
pub struct MockTransport {
    pub heads: Vec<RemoteHead>,
    pub push_support: bool,
    pub behavior: MockPush,
    pub sent: Arc<Mutex<Vec<ObjectId>>>,
    pub connects: Arc<Mutex<usize>>,
    connected: bool,
}

impl MockTransport {
    pub fn new(heads: Vec<RemoteHead>) -> Self {
        Self {
            heads,
            push_support: true,
            behavior: MockPush::AcceptAll,
            sent: Arc::default(),
            connects: Arc::default(),
            connected: false,
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn supports_push(&self) -> bool {
        self.push_support
    }

    async fn connect(&mut self, _direction: Direction) -> TransportResult<()> {
        *self.connects.lock().unwrap() += 1;
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn list_heads(&mut self) -> TransportResult<Vec<RemoteHead>> {
        Ok(self.heads.clone())
    }

    async fn push(&mut self, request: PushRequest<'_, '_>) -> TransportResult<PushReport> {
        if !self.push_support {
            return Err(TransportError::Unsupported("push"));
        }
        request.pack.write_to_vec()?;
        self.sent
            .lock()
            .unwrap()
            .extend_from_slice(request.pack.object_ids());
        match &self.behavior {
            MockPush::AcceptAll => Ok(PushReport {
                unpack_ok: true,
                statuses: request
                    .specs
                    .iter()
                    .map(|spec| PushStatus::accepted(&spec.dst))
                    .collect(),
            }),
            MockPush::Report(report) => Ok(report.clone()),
            MockPush::Fail(reason) => Err(TransportError::Connection(reason.clone())),
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.connected = false;
        Ok(())
    }
}
