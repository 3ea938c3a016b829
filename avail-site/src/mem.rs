use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use avail_base::{err, DumpTarget, Request, Resource, Result, SiteId, TxnId};

use crate::Site;

/// One resource a site is configured to hold, with its initial committed
/// value. A replicated resource has copies on other sites too, which is what
/// makes it untrustworthy after this site recovers.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub resource: Resource,
    pub initial: i64,
    pub replicated: bool,
}

// Committed versions are stamped with the site-local commit sequence number.
// The initial value is sequence 0.
#[derive(Clone, Debug, Eq, PartialEq)]
struct Version {
    seq: u64,
    value: i64,
}

#[derive(Clone, Debug)]
struct Replica {
    versions: Vec<Version>,
    replicated: bool,
    recovering: bool,
}

impl Replica {
    fn latest(&self) -> i64 {
        self.versions.last().map_or(0, |v| v.value)
    }
    fn as_of(&self, seq: u64) -> Option<i64> {
        self.versions
            .iter()
            .rev()
            .find(|v| v.seq <= seq)
            .map(|v| v.value)
    }
}

// Normally at most one writer. A second one only shows up when the manager
// had nothing to check against: every running replica was recovering, so
// nobody was asked. Both are kept so neither lock is lost.
#[derive(Clone, Debug, Default)]
struct LockEntry {
    readers: BTreeSet<TxnId>,
    writers: BTreeSet<TxnId>,
}

impl LockEntry {
    fn is_free(&self) -> bool {
        self.readers.is_empty() && self.writers.is_empty()
    }
}

// A snapshot pins the commit sequence at begin. Copies that were recovering
// then had no trustworthy value to pin, so they stay out of the snapshot for
// good, even once a later write makes them current.
#[derive(Clone, Debug)]
struct Snapshot {
    seq: u64,
    excluded: BTreeSet<Resource>,
}

/// An in-memory site: a lock table, buffered (uncommitted) writes, and a
/// multiversion history of committed values per resource.
#[derive(Clone, Debug)]
pub struct MemSite {
    id: SiteId,
    running: bool,
    commit_seq: u64,
    order: Vec<Resource>,
    copies: BTreeMap<Resource, Replica>,
    locks: BTreeMap<Resource, LockEntry>,
    buffered: BTreeMap<TxnId, BTreeMap<Resource, i64>>,
    // Snapshots point into the committed history, which survives failure,
    // so they are not dropped when the site goes down.
    snapshots: BTreeMap<TxnId, Snapshot>,
}

impl MemSite {
    pub fn new(id: SiteId, resources: impl IntoIterator<Item = ResourceSpec>) -> Self {
        let mut order = Vec::new();
        let mut copies = BTreeMap::new();
        for spec in resources {
            if copies.contains_key(&spec.resource) {
                continue;
            }
            order.push(spec.resource.clone());
            copies.insert(
                spec.resource,
                Replica {
                    versions: vec![Version {
                        seq: 0,
                        value: spec.initial,
                    }],
                    replicated: spec.replicated,
                    recovering: false,
                },
            );
        }
        MemSite {
            id,
            running: true,
            commit_seq: 0,
            order,
            copies,
            locks: BTreeMap::new(),
            buffered: BTreeMap::new(),
            snapshots: BTreeMap::new(),
        }
    }

    /// The latest committed value of a resource, ignoring locks and
    /// buffered writes.
    pub fn committed_value(&self, resource: &Resource) -> Option<i64> {
        self.copies.get(resource).map(Replica::latest)
    }

    pub fn holds_any_lock(&self, txn: &TxnId) -> bool {
        self.locks
            .values()
            .any(|l| l.writers.contains(txn) || l.readers.contains(txn))
    }

    fn replica(&self, resource: &Resource) -> Result<&Replica> {
        self.copies
            .get(resource)
            .ok_or_else(|| err(format!("site {} does not hold {}", self.id, resource)))
    }

    fn release_locks(&mut self, txn: &TxnId) {
        for entry in self.locks.values_mut() {
            entry.readers.remove(txn);
            entry.writers.remove(txn);
        }
        self.locks.retain(|_, entry| !entry.is_free());
    }

    fn read(&mut self, txn: &TxnId, resource: &Resource) -> Result<String> {
        let committed = self.replica(resource)?.latest();
        let entry = self.locks.entry(resource.clone()).or_default();
        if !entry.writers.contains(txn) {
            entry.readers.insert(txn.clone());
        }
        let value = self
            .buffered
            .get(txn)
            .and_then(|w| w.get(resource))
            .copied()
            .unwrap_or(committed);
        Ok(format!("{}: {} (site {})", resource, value, self.id))
    }

    fn write(&mut self, txn: &TxnId, resource: &Resource, value: i64) -> Result<()> {
        self.replica(resource)?;
        let entry = self.locks.entry(resource.clone()).or_default();
        // A sole reader upgrades in place.
        entry.readers.remove(txn);
        entry.writers.insert(txn.clone());
        self.buffered
            .entry(txn.clone())
            .or_default()
            .insert(resource.clone(), value);
        Ok(())
    }

    fn read_only_read(&self, txn: &TxnId, resource: &Resource) -> Result<String> {
        let snapshot = self
            .snapshots
            .get(txn)
            .ok_or_else(|| err(format!("site {} has no snapshot for {}", self.id, txn)))?;
        if snapshot.excluded.contains(resource) {
            return Err(err(format!(
                "site {} snapshot for {} does not cover {}",
                self.id, txn, resource
            )));
        }
        let seq = snapshot.seq;
        let value = self
            .replica(resource)?
            .as_of(seq)
            .ok_or_else(|| err(format!("site {} has no version of {} at snapshot", self.id, resource)))?;
        Ok(format!("{}: {} (site {}, snapshot)", resource, value, self.id))
    }

    fn commit(&mut self, txn: &TxnId) {
        if let Some(writes) = self.buffered.remove(txn) {
            if !writes.is_empty() {
                self.commit_seq += 1;
            }
            for (resource, value) in writes {
                if let Some(copy) = self.copies.get_mut(&resource) {
                    copy.versions.push(Version {
                        seq: self.commit_seq,
                        value,
                    });
                    copy.recovering = false;
                }
            }
        }
        self.release_locks(txn);
        self.snapshots.remove(txn);
    }

    fn abort(&mut self, txn: &TxnId) {
        self.buffered.remove(txn);
        self.release_locks(txn);
        self.snapshots.remove(txn);
    }

    fn dump(&self, target: &DumpTarget) -> Option<String> {
        let render = |r: &Resource| -> Option<String> {
            self.copies.get(r).map(|c| format!("{}: {}", r, c.latest()))
        };
        let body: Vec<String> = match target {
            DumpTarget::Resource(r) => render(r).into_iter().collect(),
            DumpTarget::All | DumpTarget::Site(_) => self.order.iter().filter_map(render).collect(),
        };
        if body.is_empty() {
            return None;
        }
        Some(format!("site {} - {}", self.id, body.join(", ")))
    }
}

impl Site for MemSite {
    fn site_id(&self) -> SiteId {
        self.id
    }

    fn check_conflict(&self, request: &Request) -> BTreeSet<TxnId> {
        let mut conflicts = BTreeSet::new();
        let (txn, resource, is_write) = match request {
            Request::Read { txn, resource } => (txn, resource, false),
            Request::Write { txn, resource, .. } => (txn, resource, true),
            _ => return conflicts,
        };
        if let Some(entry) = self.locks.get(resource) {
            conflicts.extend(entry.writers.iter().filter(|w| *w != txn).cloned());
            if is_write {
                conflicts.extend(entry.readers.iter().filter(|r| *r != txn).cloned());
            }
        }
        conflicts
    }

    fn execute(&mut self, request: &Request) -> Result<Option<String>> {
        if !self.running {
            return Err(err(format!("site {} is down, cannot execute {}", self.id, request)));
        }
        debug!(target: "avail::site", site = %self.id, %request, "execute");
        match request {
            Request::Read { txn, resource } => self.read(txn, resource).map(Some),
            Request::Write {
                txn,
                resource,
                value,
            } => {
                self.write(txn, resource, *value)?;
                Ok(None)
            }
            Request::ReadOnlyRead { txn, resource } => self.read_only_read(txn, resource).map(Some),
            Request::Snapshot { txn } => {
                self.create_snapshot(txn);
                Ok(None)
            }
            Request::Commit { txn } => {
                self.commit(txn);
                Ok(None)
            }
            Request::Abort { txn } => {
                self.abort(txn);
                Ok(None)
            }
            Request::Dump(target) => Ok(self.dump(target)),
            Request::Begin { .. }
            | Request::BeginReadOnly { .. }
            | Request::End { .. }
            | Request::Fail { .. }
            | Request::Recover { .. } => Err(err(format!(
                "site {} cannot execute {:?} requests",
                self.id,
                request.kind()
            ))),
        }
    }

    fn fail(&mut self) {
        debug!(target: "avail::site", site = %self.id, "fail");
        self.running = false;
        self.locks.clear();
        self.buffered.clear();
    }

    fn recover(&mut self) {
        debug!(target: "avail::site", site = %self.id, "recover");
        self.running = true;
        for copy in self.copies.values_mut() {
            if copy.replicated {
                copy.recovering = true;
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn contains_resource(&self, resource: &Resource) -> bool {
        self.copies.contains_key(resource)
    }

    fn is_recovering(&self, resource: &Resource) -> bool {
        self.copies.get(resource).map_or(false, |c| c.recovering)
    }

    fn create_snapshot(&mut self, txn: &TxnId) {
        let excluded = self
            .copies
            .iter()
            .filter(|(_, c)| c.recovering)
            .map(|(r, _)| r.clone())
            .collect();
        self.snapshots.insert(
            txn.clone(),
            Snapshot {
                seq: self.commit_seq,
                excluded,
            },
        );
    }

    fn snapshot_covers(&self, txn: &TxnId, resource: &Resource) -> bool {
        self.copies.contains_key(resource)
            && self
                .snapshots
                .get(txn)
                .map_or(false, |s| !s.excluded.contains(resource))
    }
}
