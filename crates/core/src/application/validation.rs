// Catalog Validation
//
// The one place service and add-on references are checked. Used by the
// request builders and by direct dispatch.

use crate::domain::{AddOn, CatalogSnapshot, PatchConfig, Service, ServiceInterface};
use crate::error::ValidationError;

type Result<T> = std::result::Result<T, ValidationError>;

/// Look up a service by name
pub fn resolve_service<'a>(catalog: &'a CatalogSnapshot, name: &str) -> Result<&'a Service> {
    catalog
        .find_service(name)
        .ok_or_else(|| ValidationError::UnknownService(name.to_string()))
}

/// Require `service` to declare `expected`
pub fn require_interface(service: &Service, expected: &ServiceInterface) -> Result<()> {
    if &service.interface != expected {
        return Err(ValidationError::WrongInterface {
            service: service.name.clone(),
            expected: expected.to_string(),
            found: service.interface.to_string(),
        });
    }
    Ok(())
}

/// Existence first, then interface
pub fn resolve_service_with_interface<'a>(
    catalog: &'a CatalogSnapshot,
    name: &str,
    expected: &ServiceInterface,
) -> Result<&'a Service> {
    let service = resolve_service(catalog, name)?;
    require_interface(service, expected)?;
    Ok(service)
}

/// Look up an add-on by name
pub fn resolve_add_on<'a>(catalog: &'a CatalogSnapshot, name: &str) -> Result<&'a AddOn> {
    catalog
        .find_add_on(name)
        .ok_or_else(|| ValidationError::UnknownAddOn(name.to_string()))
}

/// Check one patch against the target service
pub fn validate_patch<'a>(
    catalog: &'a CatalogSnapshot,
    service_name: &str,
    patch: &PatchConfig,
) -> Result<&'a AddOn> {
    let add_on = resolve_add_on(catalog, &patch.name)?;
    if !add_on.is_compatible_with(service_name) {
        return Err(ValidationError::IncompatibleAddOn {
            add_on: patch.name.clone(),
            service: service_name.to_string(),
        });
    }
    Ok(add_on)
}

/// Check patches in caller order, stopping at the first invalid one
pub fn validate_patches(
    catalog: &CatalogSnapshot,
    service_name: &str,
    patches: &[PatchConfig],
) -> Result<()> {
    for patch in patches {
        validate_patch(catalog, service_name, patch)?;
    }
    Ok(())
}

/// A new add-on name must not be taken yet
pub fn ensure_add_on_name_available(catalog: &CatalogSnapshot, name: &str) -> Result<()> {
    if catalog.find_add_on(name).is_some() {
        return Err(ValidationError::AddOnAlreadyExists(name.to_string()));
    }
    Ok(())
}
