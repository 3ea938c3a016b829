// Admission of reads and writes.
//
// Two gates, in order. Gate (a) looks only at the waiting list: a request that
// would overtake a queued request it conflicts with joins the queue instead.
// Gate (b) asks the replicas about locks and applies wait-die: an older
// requester waits, a requester younger than every holder dies.
//
// Replication is available-copies. A read needs one running replica whose
// copy is not recovering; a write needs every running, non-recovering replica
// to be conflict-free, and then goes to every running replica.

use std::collections::BTreeSet;

use tracing::{debug, info};

use avail_base::{err, Request, Resource, Result, TxnId};

use crate::{AbortReason, Outcome, QueueReason, TransactionManager};

impl TransactionManager {
    /// Gate (a). Returns the queued request this one must wait behind, if
    /// any. Only meaningful for requests that passed validation.
    pub(crate) fn blocking_queued(&self, request: &Request) -> Result<Option<Request>> {
        let blocker = match request {
            Request::Begin { .. }
            | Request::BeginReadOnly { .. }
            | Request::Dump(_)
            | Request::Fail { .. }
            | Request::Recover { .. }
            | Request::Abort { .. } => None,
            Request::Read { txn, resource } => {
                if self.registry.get(txn)?.read_only {
                    None
                } else {
                    self.waiting.first_data_conflict(resource, false)
                }
            }
            Request::Write { resource, .. } => self.waiting.first_data_conflict(resource, true),
            Request::End { txn } => self.waiting.first_of_txn(txn),
            Request::ReadOnlyRead { .. } | Request::Commit { .. } | Request::Snapshot { .. } => {
                return Err(err(format!(
                    "invalid request kind {:?} for admission: {}",
                    request.kind(),
                    request
                )))
            }
        };
        Ok(blocker.cloned())
    }

    /// Wait-die over a non-empty conflict set.
    fn wait_or_die(
        &mut self,
        txn: &TxnId,
        request: &Request,
        holders: BTreeSet<TxnId>,
    ) -> Result<Outcome> {
        let requester = self.registry.timestamp(txn)?;
        let mut younger_than_all = true;
        for holder in holders.iter() {
            if requester.is_older_than(self.registry.timestamp(holder)?) {
                younger_than_all = false;
            }
        }
        if younger_than_all {
            info!(target: "avail::resolver", %txn, %request, ?holders, "wait-die: requester dies");
            self.abort_txn(txn)?;
            Ok(Outcome::Aborted(AbortReason::WaitDie { holders }))
        } else {
            debug!(target: "avail::resolver", %txn, %request, ?holders, "wait-die: requester waits");
            self.waiting.push(request.clone());
            Ok(Outcome::Queued(QueueReason::LockConflict(holders)))
        }
    }

    fn queue_unavailable(&mut self, request: &Request) -> Outcome {
        debug!(target: "avail::resolver", %request, "no eligible replica, queueing");
        self.waiting.push(request.clone());
        Outcome::Queued(QueueReason::NoSiteAvailable)
    }

    /// Read by a read-write transaction: the first eligible replica decides.
    pub(crate) fn read(&mut self, txn: &TxnId, resource: &Resource, request: &Request) -> Result<Outcome> {
        let replicas = self.topology.sites_for(resource)?.to_vec();
        for id in replicas {
            let site = self.site_ref(id)?;
            if !site.is_running() || site.is_recovering(resource) {
                continue;
            }
            let holders = site.check_conflict(request);
            if !holders.is_empty() {
                return self.wait_or_die(txn, request, holders);
            }
            let response = self.site_mut(id)?.execute(request)?;
            self.registry.add_visited_site(txn, id)?;
            return Ok(Outcome::Done(response.into_iter().collect()));
        }
        Ok(self.queue_unavailable(request))
    }

    /// Read by a read-only transaction: no locks, and only against the
    /// snapshots taken when the transaction began. A copy that was
    /// recovering at begin never serves this transaction.
    pub(crate) fn read_only_read(
        &mut self,
        txn: &TxnId,
        resource: &Resource,
        request: &Request,
    ) -> Result<Outcome> {
        let snapshot = self.registry.get(txn)?.snapshot;
        let replicas = self.topology.sites_for(resource)?.to_vec();
        for id in snapshot.iter().filter(|id| replicas.contains(id)) {
            let site = self.site_ref(id)?;
            if !site.is_running()
                || site.is_recovering(resource)
                || !site.snapshot_covers(txn, resource)
            {
                continue;
            }
            let ro = Request::ReadOnlyRead {
                txn: txn.clone(),
                resource: resource.clone(),
            };
            let response = self.site_mut(id)?.execute(&ro)?;
            return Ok(Outcome::Done(response.into_iter().collect()));
        }
        Ok(self.queue_unavailable(request))
    }

    /// Write: every running, non-recovering replica must be conflict-free
    /// before any replica is touched.
    pub(crate) fn write(&mut self, txn: &TxnId, resource: &Resource, request: &Request) -> Result<Outcome> {
        let replicas = self.topology.sites_for(resource)?.to_vec();
        let mut holders = BTreeSet::new();
        for id in replicas.iter().copied() {
            let site = self.site_ref(id)?;
            if !site.is_running() || site.is_recovering(resource) {
                continue;
            }
            holders.extend(site.check_conflict(request));
        }
        if !holders.is_empty() {
            return self.wait_or_die(txn, request, holders);
        }

        let mut granted = Vec::new();
        for id in replicas {
            if !self.is_site_running(id)? {
                continue;
            }
            self.site_mut(id)?.execute(request)?;
            self.registry.add_visited_site(txn, id)?;
            granted.push(id.to_string());
        }
        if granted.is_empty() {
            return Ok(self.queue_unavailable(request));
        }
        Ok(Outcome::Done(vec![format!(
            "{} written at sites [{}]",
            resource,
            granted.join(", ")
        )]))
    }
}
