use std::collections::BTreeMap;

use tracing::info;

use avail_base::{err, Request, Resource, Result, SiteId};
use avail_site::{BoxSite, Site};

use crate::{Registry, Topology, WaitingList};

/// The transaction manager. Owns the site table, the transaction registry,
/// the resource topology and the waiting list; everything else in this crate
/// is an `impl TransactionManager` block over those four.
///
/// There is exactly one logical actor: every request is processed to
/// completion before the next one starts, so none of this needs locking.
pub struct TransactionManager {
    pub(crate) sites: BTreeMap<SiteId, BoxSite>,
    pub(crate) registry: Registry,
    pub(crate) topology: Topology,
    pub(crate) waiting: WaitingList,
    // Queued requests dropped by aborts during the request being handled,
    // waiting to be reported.
    pub(crate) cancelled: Vec<Request>,
}

impl TransactionManager {
    /// Takes ownership of the sites and builds the topology by asking each
    /// of them about each candidate resource. Two sites with the same id is
    /// a wiring mistake.
    pub fn new(
        sites: impl IntoIterator<Item = BoxSite>,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<Self> {
        let mut table = BTreeMap::new();
        for site in sites {
            let id = site.site_id();
            if table.insert(id, site).is_some() {
                return Err(err(format!("duplicate site id {}", id)));
            }
        }
        let topology = Topology::build(resources, &table);
        info!(
            target: "avail::manager",
            sites = table.len(),
            resources = topology.len(),
            "transaction manager ready"
        );
        Ok(TransactionManager {
            sites: table,
            registry: Registry::new(),
            topology,
            waiting: WaitingList::new(),
            cancelled: Vec::new(),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn waiting(&self) -> &WaitingList {
        &self.waiting
    }

    pub fn site_ids(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.sites.keys().copied()
    }

    pub fn site(&self, id: SiteId) -> Option<&dyn Site> {
        self.sites.get(&id).map(|s| &**s)
    }

    // Lookups below are only made for ids that already passed validation or
    // came out of the topology, so a miss is a defect.
    pub(crate) fn site_ref(&self, id: SiteId) -> Result<&dyn Site> {
        self.site(id)
            .ok_or_else(|| err(format!("site {} missing from site table", id)))
    }

    pub(crate) fn site_mut(&mut self, id: SiteId) -> Result<&mut BoxSite> {
        self.sites
            .get_mut(&id)
            .ok_or_else(|| err(format!("site {} missing from site table", id)))
    }

    pub(crate) fn is_site_running(&self, id: SiteId) -> Result<bool> {
        Ok(self.site_ref(id)?.is_running())
    }
}
