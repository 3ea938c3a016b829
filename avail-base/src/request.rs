use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Resource, SiteId, TxnId};

// Requests flow from the command stream into the transaction manager, and from
// the transaction manager into sites. Most kinds travel both ways (a Read is
// forwarded to the site that grants it); three kinds exist only on the
// manager-to-site leg: ReadOnlyRead, Commit and Snapshot. The manager never
// accepts those as input.

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Read,
    Write,
    ReadOnlyRead,
    Fail,
    Recover,
    Dump,
    Commit,
    Abort,
    Begin,
    BeginReadOnly,
    End,
    Snapshot,
}

impl RequestKind {
    pub fn is_site_directed(&self) -> bool {
        matches!(
            self,
            RequestKind::ReadOnlyRead | RequestKind::Commit | RequestKind::Snapshot
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum DumpTarget {
    All,
    Site(SiteId),
    Resource(Resource),
}

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Request {
    Begin { txn: TxnId },
    BeginReadOnly { txn: TxnId },
    Read { txn: TxnId, resource: Resource },
    Write { txn: TxnId, resource: Resource, value: i64 },
    ReadOnlyRead { txn: TxnId, resource: Resource },
    End { txn: TxnId },
    Abort { txn: TxnId },
    Commit { txn: TxnId },
    Snapshot { txn: TxnId },
    Dump(DumpTarget),
    Fail { site: SiteId },
    Recover { site: SiteId },
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Begin { .. } => RequestKind::Begin,
            Request::BeginReadOnly { .. } => RequestKind::BeginReadOnly,
            Request::Read { .. } => RequestKind::Read,
            Request::Write { .. } => RequestKind::Write,
            Request::ReadOnlyRead { .. } => RequestKind::ReadOnlyRead,
            Request::End { .. } => RequestKind::End,
            Request::Abort { .. } => RequestKind::Abort,
            Request::Commit { .. } => RequestKind::Commit,
            Request::Snapshot { .. } => RequestKind::Snapshot,
            Request::Dump(_) => RequestKind::Dump,
            Request::Fail { .. } => RequestKind::Fail,
            Request::Recover { .. } => RequestKind::Recover,
        }
    }

    pub fn txn(&self) -> Option<&TxnId> {
        match self {
            Request::Begin { txn }
            | Request::BeginReadOnly { txn }
            | Request::Read { txn, .. }
            | Request::Write { txn, .. }
            | Request::ReadOnlyRead { txn, .. }
            | Request::End { txn }
            | Request::Abort { txn }
            | Request::Commit { txn }
            | Request::Snapshot { txn } => Some(txn),
            Request::Dump(_) | Request::Fail { .. } | Request::Recover { .. } => None,
        }
    }

    pub fn resource(&self) -> Option<&Resource> {
        match self {
            Request::Read { resource, .. }
            | Request::Write { resource, .. }
            | Request::ReadOnlyRead { resource, .. } => Some(resource),
            Request::Dump(DumpTarget::Resource(resource)) => Some(resource),
            _ => None,
        }
    }

    pub fn site(&self) -> Option<SiteId> {
        match self {
            Request::Fail { site } | Request::Recover { site } => Some(*site),
            Request::Dump(DumpTarget::Site(site)) => Some(*site),
            _ => None,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Request::Write { .. })
    }

    // Shorthand constructors, mostly for tests and for the manager's own
    // manager-to-site requests.
    pub fn begin(txn: &str) -> Self {
        Request::Begin { txn: TxnId::new(txn) }
    }
    pub fn begin_ro(txn: &str) -> Self {
        Request::BeginReadOnly { txn: TxnId::new(txn) }
    }
    pub fn read(txn: &str, resource: &str) -> Self {
        Request::Read {
            txn: TxnId::new(txn),
            resource: Resource::new(resource),
        }
    }
    pub fn write(txn: &str, resource: &str, value: i64) -> Self {
        Request::Write {
            txn: TxnId::new(txn),
            resource: Resource::new(resource),
            value,
        }
    }
    pub fn end(txn: &str) -> Self {
        Request::End { txn: TxnId::new(txn) }
    }
    pub fn abort(txn: &str) -> Self {
        Request::Abort { txn: TxnId::new(txn) }
    }
    pub fn fail(site: u8) -> Self {
        Request::Fail { site: SiteId(site) }
    }
    pub fn recover(site: u8) -> Self {
        Request::Recover { site: SiteId(site) }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Begin { txn } => write!(f, "begin({})", txn),
            Request::BeginReadOnly { txn } => write!(f, "beginRO({})", txn),
            Request::Read { txn, resource } => write!(f, "R({},{})", txn, resource),
            Request::Write {
                txn,
                resource,
                value,
            } => write!(f, "W({},{},{})", txn, resource, value),
            Request::ReadOnlyRead { txn, resource } => write!(f, "RO({},{})", txn, resource),
            Request::End { txn } => write!(f, "end({})", txn),
            Request::Abort { txn } => write!(f, "abort({})", txn),
            Request::Commit { txn } => write!(f, "commit({})", txn),
            Request::Snapshot { txn } => write!(f, "snapshot({})", txn),
            Request::Dump(DumpTarget::All) => write!(f, "dump()"),
            Request::Dump(DumpTarget::Site(site)) => write!(f, "dump({})", site),
            Request::Dump(DumpTarget::Resource(resource)) => write!(f, "dump({})", resource),
            Request::Fail { site } => write!(f, "fail({})", site),
            Request::Recover { site } => write!(f, "recover({})", site),
        }
    }
}
