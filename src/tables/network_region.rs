use crate::{name::Name, packet::Link};

/// The producer regions this node belongs to.
///
/// An Interest carrying a Link is forwarded by its own name once it reaches
/// a region one of its delegations points into.
#[derive(Default)]
pub struct NetworkRegionTable {
    regions: Vec<Name>,
}

impl NetworkRegionTable {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    pub fn insert(&mut self, region: Name) {
        if !self.regions.contains(&region) {
            self.regions.push(region);
        }
    }

    pub fn remove(&mut self, region: &Name) -> bool {
        let before = self.regions.len();
        self.regions.retain(|r| r != region);
        self.regions.len() != before
    }

    pub fn is_in_producer_region(&self, link: &Link) -> bool {
        link.delegations().iter().any(|d| {
            self.regions
                .iter()
                .any(|region| d.name.is_prefix_of(region))
        })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
