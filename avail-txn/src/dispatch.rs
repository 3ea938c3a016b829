// The single entry point. Each call is one tick of the simulation: first the
// waiting list is drained, then the tick's new requests are handled in
// arrival order. Draining repeats while a pass commits at least one
// transaction, since a commit can release locks that unblock requests
// anywhere in the queue (including ones already replayed earlier in that
// same pass).
//
// Every request goes through the same pipeline:
//
//   1. validation: unknown or finished names are rejected and dropped,
//   2. gate (a) against the waiting list,
//   3. the kind-specific handler, which for reads and writes is gate (b).

use tracing::{debug, info};

use avail_base::{err, DumpTarget, Request, Result};

use crate::{Event, NotLiving, Outcome, QueueReason, TransactionManager, TxnError};

impl TransactionManager {
    pub fn handle_requests(&mut self, batch: impl IntoIterator<Item = Request>) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        if !self.waiting.is_empty() {
            self.drain_waiting(&mut events)?;
        }
        for request in batch {
            self.step(request, false, &mut events)?;
        }
        Ok(events)
    }

    fn drain_waiting(&mut self, events: &mut Vec<Event>) -> Result<()> {
        let mut passes = 0;
        loop {
            passes += 1;
            debug!(target: "avail::dispatch", pass = passes, queued = self.waiting.len(), "drain pass");
            self.waiting.begin_pass();
            let mut committed = false;
            while let Some(request) = self.waiting.next_in_pass() {
                let is_end = matches!(request, Request::End { .. });
                if self.step(request, true, events)? && is_end {
                    committed = true;
                }
            }
            if !committed || self.waiting.is_empty() {
                return Ok(());
            }
        }
    }

    // Handles one request and records its event, followed by one event per
    // queued request that an abort along the way threw out. Returns whether
    // the request itself was done.
    fn step(&mut self, request: Request, replayed: bool, events: &mut Vec<Event>) -> Result<bool> {
        let outcome = self.handle_request(&request)?;
        let done = outcome.is_done();
        events.push(Event {
            request,
            outcome,
            replayed,
        });
        for request in std::mem::take(&mut self.cancelled) {
            let Some(txn) = request.txn().cloned() else {
                return Err(err(format!("cancelled request {} has no transaction", request)));
            };
            events.push(Event {
                request,
                outcome: Outcome::Rejected(TxnError::TransactionNotLiving(txn, NotLiving::Aborted)),
                replayed: true,
            });
        }
        Ok(done)
    }

    /// Runs one request through the whole pipeline. The Err case is reserved
    /// for defects; everything the command stream can get wrong comes back
    /// as Outcome::Rejected. Queued requests cancelled by an abort are only
    /// reported through handle_requests.
    pub fn handle_request(&mut self, request: &Request) -> Result<Outcome> {
        self.cancelled.clear();
        if request.kind().is_site_directed() {
            return Err(err(format!("site-directed request {} reached the dispatcher", request)));
        }
        if let Err(e) = self.validate(request) {
            info!(target: "avail::dispatch", %request, error = %e, "rejected");
            return Ok(Outcome::Rejected(e));
        }
        if let Some(blocker) = self.blocking_queued(request)? {
            debug!(target: "avail::dispatch", %request, %blocker, "behind queued request");
            self.waiting.push(request.clone());
            return Ok(Outcome::Queued(QueueReason::BehindQueued(blocker)));
        }
        match request {
            Request::Begin { txn } => self.begin(txn, false),
            Request::BeginReadOnly { txn } => self.begin(txn, true),
            Request::Read { txn, resource } => {
                if self.registry.get(txn)?.read_only {
                    self.read_only_read(txn, resource, request)
                } else {
                    self.read(txn, resource, request)
                }
            }
            Request::Write { txn, resource, .. } => self.write(txn, resource, request),
            Request::End { txn } => self.end_txn(txn),
            Request::Abort { txn } => {
                self.abort_txn(txn)?;
                Ok(Outcome::Done(vec![format!("{} aborted", txn)]))
            }
            Request::Dump(target) => self.dump(target),
            Request::Fail { site } => self.fail_site(*site),
            Request::Recover { site } => self.recover_site(*site),
            Request::ReadOnlyRead { .. } | Request::Commit { .. } | Request::Snapshot { .. } => {
                Err(err(format!("invalid request kind {:?} for dispatch", request.kind())))
            }
        }
    }

    fn validate(&self, request: &Request) -> std::result::Result<(), TxnError> {
        match request {
            Request::Begin { txn } | Request::BeginReadOnly { txn } => {
                if self.registry.contains(txn) {
                    return Err(TxnError::DuplicateTransaction(txn.clone()));
                }
            }
            Request::Read { txn, resource } | Request::Write { txn, resource, .. } => {
                self.topology.sites_for(resource)?;
                self.registry.require_living(txn)?;
            }
            Request::End { txn } | Request::Abort { txn } => {
                self.registry.require_living(txn)?;
            }
            Request::Dump(DumpTarget::All) => {}
            Request::Dump(DumpTarget::Site(site)) => {
                if self.site(*site).is_none() {
                    return Err(TxnError::SiteNotFound(*site));
                }
            }
            Request::Dump(DumpTarget::Resource(resource)) => {
                self.topology.sites_for(resource)?;
            }
            Request::Fail { site } => match self.site(*site) {
                None => return Err(TxnError::SiteNotFound(*site)),
                Some(s) if !s.is_running() => return Err(TxnError::SiteAlreadyFailed(*site)),
                Some(_) => {}
            },
            Request::Recover { site } => match self.site(*site) {
                None => return Err(TxnError::SiteNotFound(*site)),
                Some(s) if s.is_running() => return Err(TxnError::SiteRunning(*site)),
                Some(_) => {}
            },
            // Refused before validation.
            Request::ReadOnlyRead { .. } | Request::Commit { .. } | Request::Snapshot { .. } => {}
        }
        Ok(())
    }
}
