use std::collections::BTreeMap;

use tracing::warn;

use avail_base::{Resource, SiteId};
use avail_site::BoxSite;

use crate::TxnError;

/// Which sites replicate which resource, in ascending site order. Built once
/// by asking every site about every candidate resource. A candidate that no
/// site holds is dropped here, and from then on is as unknown as a name that
/// was never a candidate at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Topology {
    sites_by_resource: BTreeMap<Resource, Vec<SiteId>>,
}

impl Topology {
    pub fn build(
        candidates: impl IntoIterator<Item = Resource>,
        sites: &BTreeMap<SiteId, BoxSite>,
    ) -> Self {
        let mut sites_by_resource = BTreeMap::new();
        for resource in candidates {
            let holders: Vec<SiteId> = sites
                .iter()
                .filter(|(_, site)| site.contains_resource(&resource))
                .map(|(id, _)| *id)
                .collect();
            if holders.is_empty() {
                warn!(target: "avail::topology", %resource, "no site holds resource, dropping it");
                continue;
            }
            sites_by_resource.insert(resource, holders);
        }
        Topology { sites_by_resource }
    }

    pub fn sites_for(&self, resource: &Resource) -> Result<&[SiteId], TxnError> {
        self.sites_by_resource
            .get(resource)
            .map(|v| v.as_slice())
            .ok_or_else(|| TxnError::ResourceNotFound(resource.clone()))
    }

    pub fn contains(&self, resource: &Resource) -> bool {
        self.sites_by_resource.contains_key(resource)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.sites_by_resource.keys()
    }

    pub fn len(&self) -> usize {
        self.sites_by_resource.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites_by_resource.is_empty()
    }
}
