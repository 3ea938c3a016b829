use tracing::{info, warn};

use avail_base::{DumpTarget, Request, Result, SiteId};

use crate::{Outcome, TransactionManager};

impl TransactionManager {
    /// Takes a site down and aborts every transaction visiting it. Their
    /// buffered writes at this site are gone with it, so none of them can
    /// commit anymore.
    pub(crate) fn fail_site(&mut self, id: SiteId) -> Result<Outcome> {
        self.site_mut(id)?.fail();
        let victims = self.registry.visiting(id);
        warn!(target: "avail::coordinator", site = %id, victims = victims.len(), "site failed");
        let mut lines = vec![format!("site {} failed", id)];
        for txn in victims {
            self.abort_txn(&txn)?;
            lines.push(format!("{} aborted: visited failed site {}", txn, id));
        }
        Ok(Outcome::Done(lines))
    }

    /// Brings a site back. Replicated copies stay unreadable there until a
    /// write commits to them; the site tracks that, we only ever ask.
    /// Snapshots of read-only transactions that finished while the site was
    /// down are released now.
    pub(crate) fn recover_site(&mut self, id: SiteId) -> Result<Outcome> {
        let stale = self.registry.take_unreleased(id);
        let site = self.site_mut(id)?;
        site.recover();
        for txn in stale.iter() {
            site.execute(&Request::Abort { txn: txn.clone() })?;
        }
        info!(target: "avail::coordinator", site = %id, released = stale.len(), "site recovered");
        Ok(Outcome::Done(vec![format!("site {} recovered", id)]))
    }

    pub(crate) fn dump(&mut self, target: &DumpTarget) -> Result<Outcome> {
        let ids: Vec<SiteId> = match target {
            DumpTarget::All => self.site_ids().collect(),
            DumpTarget::Site(id) => vec![*id],
            DumpTarget::Resource(resource) => self.topology.sites_for(resource)?.to_vec(),
        };
        let request = Request::Dump(target.clone());
        let mut lines = Vec::new();
        for id in ids {
            if self.is_site_running(id)? {
                lines.extend(self.site_mut(id)?.execute(&request)?);
            } else {
                lines.push(format!("site {} - down", id));
            }
        }
        Ok(Outcome::Done(lines))
    }
}
