// Catalog Snapshot
//
// Services and add-ons as fetched at one point in time. A snapshot is never
// mutated: refreshing produces a new value with a higher revision.

use super::{AddOn, Service};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    revision: u64,
    services: Vec<Service>,
    add_ons: Vec<AddOn>,
}

impl CatalogSnapshot {
    pub fn new(services: Vec<Service>, add_ons: Vec<AddOn>) -> Self {
        Self {
            revision: 0,
            services,
            add_ons,
        }
    }

    /// Monotonic counter, bumped on every refresh
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn add_ons(&self) -> &[AddOn] {
        &self.add_ons
    }

    /// Find a service by its display name (first match)
    pub fn find_service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.name == name)
    }

    /// Find an add-on by name (first match)
    pub fn find_add_on(&self, name: &str) -> Option<&AddOn> {
        self.add_ons.iter().find(|add_on| add_on.name == name)
    }

    /// New snapshot with the service list replaced
    pub fn with_services(&self, services: Vec<Service>) -> Self {
        Self {
            revision: self.revision + 1,
            services,
            add_ons: self.add_ons.clone(),
        }
    }

    /// New snapshot with both lists replaced
    pub fn with_catalogs(&self, services: Vec<Service>, add_ons: Vec<AddOn>) -> Self {
        Self {
            revision: self.revision + 1,
            services,
            add_ons,
        }
    }

    /// New snapshot with the add-on list replaced
    pub fn with_add_ons(&self, add_ons: Vec<AddOn>) -> Self {
        Self {
            revision: self.revision + 1,
            services: self.services.clone(),
            add_ons,
        }
    }
}
