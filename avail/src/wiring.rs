// The standard layout. Resource xi starts at value_step * i. Even-numbered
// resources are replicated at every site; odd-numbered ones live only at
// site 1 + (i mod sites).

use tracing::debug;

use avail_base::{Resource, Result, SiteId};
use avail_site::{BoxSite, MemSite, ResourceSpec};
use avail_txn::TransactionManager;

use crate::SimConfig;

pub fn resource_name(i: u32) -> Resource {
    Resource(format!("x{}", i))
}

pub fn home_site(i: u32, sites: u8) -> Option<SiteId> {
    if i % 2 == 0 || sites == 0 {
        None
    } else {
        u8::try_from(1 + i % u32::from(sites)).ok().map(SiteId)
    }
}

pub fn specs_for(site: SiteId, config: &SimConfig) -> Vec<ResourceSpec> {
    (1..=config.resources)
        .filter(|&i| i % 2 == 0 || home_site(i, config.sites) == Some(site))
        .map(|i| ResourceSpec {
            resource: resource_name(i),
            initial: config.value_step.saturating_mul(i64::from(i)),
            replicated: i % 2 == 0,
        })
        .collect()
}

pub fn build_sites(config: &SimConfig) -> Vec<BoxSite> {
    (1..=config.sites)
        .map(|n| {
            let id = SiteId(n);
            let specs = specs_for(id, config);
            debug!(target: "avail::wiring", site = %id, resources = specs.len(), "site");
            Box::new(MemSite::new(id, specs)) as BoxSite
        })
        .collect()
}

pub fn build_manager(config: &SimConfig) -> Result<TransactionManager> {
    config.check()?;
    TransactionManager::new(build_sites(config), (1..=config.resources).map(resource_name))
}
