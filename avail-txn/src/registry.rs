use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use avail_base::{LogicalClock, SiteId, SiteSet, Timestamp, TxnId};

use crate::{NotLiving, TxnError};

// Status only ever moves forward: Running -> Aborted or Running -> Committed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum TxnStatus {
    Running,
    Aborted,
    Committed,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TxnRecord {
    pub id: TxnId,
    pub timestamp: Timestamp,
    pub read_only: bool,
    pub status: TxnStatus,
    // Sites this transaction holds locks or buffered writes on. Frozen once
    // the status leaves Running.
    pub visited: SiteSet,
    // For read-only transactions: the sites that were running at begin and
    // took a snapshot. Fixed at begin; never grows afterwards.
    pub snapshot: SiteSet,
}

impl TxnRecord {
    pub fn is_running(&self) -> bool {
        self.status == TxnStatus::Running
    }

    fn not_living(&self) -> Option<NotLiving> {
        match self.status {
            TxnStatus::Running => None,
            TxnStatus::Aborted => Some(NotLiving::Aborted),
            TxnStatus::Committed => Some(NotLiving::Committed),
        }
    }

    /// Every site that must hear about this transaction's end, one way or
    /// the other.
    pub fn touched_sites(&self) -> SiteSet {
        let mut sites = self.visited;
        sites.union(&self.snapshot);
        sites
    }
}

/// The authoritative record of every transaction ever begun, together with
/// the per-site index of running transactions visiting each site.
///
/// `visiting` is the inverse of the running transactions' `visited` sets.
/// Both sides are only updated here, through add_visited_site and
/// set_status, so the two can't drift apart.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    clock: LogicalClock,
    txns: BTreeMap<TxnId, TxnRecord>,
    visiting: BTreeMap<SiteId, BTreeSet<TxnId>>,
    // Finished read-only transactions whose snapshot at a site could not be
    // released because the site was down at the time.
    unreleased: BTreeMap<SiteId, BTreeSet<TxnId>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn begin(&mut self, id: &TxnId, read_only: bool) -> Result<&TxnRecord, TxnError> {
        if self.txns.contains_key(id) {
            return Err(TxnError::DuplicateTransaction(id.clone()));
        }
        let timestamp = self.clock.tick();
        debug!(target: "avail::registry", txn = %id, %timestamp, read_only, "begin");
        let record = TxnRecord {
            id: id.clone(),
            timestamp,
            read_only,
            status: TxnStatus::Running,
            visited: SiteSet::new(),
            snapshot: SiteSet::new(),
        };
        Ok(self.txns.entry(id.clone()).or_insert(record))
    }

    pub fn contains(&self, id: &TxnId) -> bool {
        self.txns.contains_key(id)
    }

    pub fn get(&self, id: &TxnId) -> Result<&TxnRecord, TxnError> {
        self.txns
            .get(id)
            .ok_or_else(|| TxnError::TransactionNotFound(id.clone()))
    }

    pub fn timestamp(&self, id: &TxnId) -> Result<Timestamp, TxnError> {
        self.get(id).map(|r| r.timestamp)
    }

    /// The record, if and only if the transaction is Running.
    pub fn require_living(&self, id: &TxnId) -> Result<&TxnRecord, TxnError> {
        let record = self
            .txns
            .get(id)
            .ok_or_else(|| TxnError::TransactionNotLiving(id.clone(), NotLiving::NotBegun))?;
        match record.not_living() {
            None => Ok(record),
            Some(why) => Err(TxnError::TransactionNotLiving(id.clone(), why)),
        }
    }

    fn get_living_mut(&mut self, id: &TxnId) -> Result<&mut TxnRecord, TxnError> {
        self.require_living(id)?;
        self.txns
            .get_mut(id)
            .ok_or_else(|| TxnError::TransactionNotFound(id.clone()))
    }

    pub fn add_visited_site(&mut self, id: &TxnId, site: SiteId) -> Result<(), TxnError> {
        let record = self.get_living_mut(id)?;
        record.visited.insert(site);
        self.visiting.entry(site).or_default().insert(id.clone());
        Ok(())
    }

    pub fn record_snapshot(&mut self, id: &TxnId, site: SiteId) -> Result<(), TxnError> {
        let record = self.get_living_mut(id)?;
        record.snapshot.insert(site);
        Ok(())
    }

    /// Moves a Running transaction to `status`. Leaving Running freezes the
    /// visited set and takes the transaction out of every visiting set.
    pub fn set_status(&mut self, id: &TxnId, status: TxnStatus) -> Result<(), TxnError> {
        let record = self.get_living_mut(id)?;
        if status == TxnStatus::Running {
            return Ok(());
        }
        record.status = status;
        let visited = record.visited;
        debug!(target: "avail::registry", txn = %id, ?status, "finish");
        for site in visited.iter() {
            if let Some(txns) = self.visiting.get_mut(&site) {
                txns.remove(id);
                if txns.is_empty() {
                    self.visiting.remove(&site);
                }
            }
        }
        Ok(())
    }

    /// Remembers that `site` still holds a snapshot for finished `id`.
    pub fn defer_release(&mut self, site: SiteId, id: &TxnId) {
        self.unreleased.entry(site).or_default().insert(id.clone());
    }

    /// Takes the snapshots `site` still has to drop.
    pub fn take_unreleased(&mut self, site: SiteId) -> Vec<TxnId> {
        self.unreleased
            .remove(&site)
            .map(|txns| txns.into_iter().collect())
            .unwrap_or_default()
    }

    /// Running transactions currently visiting `site`, in name order.
    pub fn visiting(&self, site: SiteId) -> Vec<TxnId> {
        self.visiting
            .get(&site)
            .map(|txns| txns.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TxnRecord> {
        self.txns.values()
    }

    pub fn len(&self) -> usize {
        self.txns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txns.is_empty()
    }

    /// Checks that `visiting` is exactly the inverse of the running
    /// transactions' visited sets.
    pub fn is_consistent(&self) -> bool {
        for (site, txns) in self.visiting.iter() {
            for txn in txns {
                match self.txns.get(txn) {
                    Some(r) if r.is_running() && r.visited.contains(*site) => {}
                    _ => return false,
                }
            }
        }
        self.txns.values().filter(|r| r.is_running()).all(|r| {
            r.visited.iter().all(|site| {
                self.visiting
                    .get(&site)
                    .map_or(false, |txns| txns.contains(&r.id))
            })
        })
    }
}
