use tracing::info;

use avail_base::{Request, Result, TxnId};

use crate::{Outcome, TransactionManager, TxnStatus};

impl TransactionManager {
    /// Registers a new transaction. A read-only transaction also takes a
    /// snapshot at every site that is up right now; those sites are the only
    /// ones it will ever read from.
    pub(crate) fn begin(&mut self, txn: &TxnId, read_only: bool) -> Result<Outcome> {
        let timestamp = self.registry.begin(txn, read_only)?.timestamp;
        let mut lines = Vec::new();
        if read_only {
            let up: Vec<_> = self
                .sites
                .iter()
                .filter(|(_, site)| site.is_running())
                .map(|(id, _)| *id)
                .collect();
            for id in up.iter().copied() {
                self.site_mut(id)?.create_snapshot(txn);
                self.registry.record_snapshot(txn, id)?;
            }
            lines.push(format!(
                "{} begins read-only at {}, snapshot on {} sites",
                txn,
                timestamp,
                up.len()
            ));
        } else {
            lines.push(format!("{} begins at {}", txn, timestamp));
        }
        info!(target: "avail::lifecycle", %txn, %timestamp, read_only, "begin");
        Ok(Outcome::Done(lines))
    }

    /// Commits a Running transaction at every site it touched that is still
    /// up. Sites that went down in the meantime already aborted it.
    pub(crate) fn end_txn(&mut self, txn: &TxnId) -> Result<Outcome> {
        let commit = Request::Commit { txn: txn.clone() };
        self.finish_at_sites(txn, &commit)?;
        self.registry.set_status(txn, TxnStatus::Committed)?;
        info!(target: "avail::lifecycle", %txn, "committed");
        Ok(Outcome::Done(vec![format!("{} committed", txn)]))
    }

    /// Aborts a Running transaction: its queued work is dropped, every live
    /// site it touched releases its locks and throws away its buffered
    /// writes, and it leaves every visiting set. Callers must have checked
    /// that the transaction is Running.
    ///
    /// Its queued requests are set aside in `cancelled` so the dispatcher can
    /// report what became of them.
    pub(crate) fn abort_txn(&mut self, txn: &TxnId) -> Result<()> {
        let dropped = self.waiting.remove_txn(txn);
        let abort = Request::Abort { txn: txn.clone() };
        self.finish_at_sites(txn, &abort)?;
        self.registry.set_status(txn, TxnStatus::Aborted)?;
        info!(target: "avail::lifecycle", %txn, dropped = dropped.len(), "aborted");
        self.cancelled.extend(dropped);
        Ok(())
    }

    // Sends the final commit or abort to every touched site that is up. A
    // down site lost locks and buffered writes when it failed, but it keeps
    // snapshots; those are released when it comes back.
    fn finish_at_sites(&mut self, txn: &TxnId, last: &Request) -> Result<()> {
        let record = self.registry.require_living(txn)?;
        let sites = record.touched_sites();
        let snapshot = record.snapshot;
        for id in sites.iter() {
            if self.is_site_running(id)? {
                self.site_mut(id)?.execute(last)?;
            } else if snapshot.contains(id) {
                self.registry.defer_release(id, txn);
            }
        }
        Ok(())
    }
}
