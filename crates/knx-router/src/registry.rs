//! The resource list: register, URI lookup, access control, and content
//! negotiation.
//!
//! Modeled as a flat `Vec` rather than this workspace's 256-bucket Kademlia
//! table: the routing key here is a short URI string, not a 256-bit node
//! ID, so a linear scan over a few dozen resources is the right-sized
//! analogue of this workspace's bounded, linearly-scanned k-bucket.

use crate::resource::{InterfaceMask, MethodMask, Resource};
use crate::{Result, RouterError};

/// A resource lookup result: the matched resource and, for a wildcard
/// match, the instance suffix.
pub struct Matched<'a> {
    pub resource: &'a Resource,
    pub suffix: &'a str,
}

/// The router's resource table.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: Vec<Resource>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The illustrative core resources this crate ships to exercise CRUD,
    /// load-state, and s-mode dispatch end to end: `/dev/sn`, `/a/sen`, `/fp/g[/*]`, `/fp/r[/*]`, `/fp/p[/*]`, and
    /// `/.well-known/core`.
    pub fn with_core_resources() -> Self {
        let mut registry = Self::new();
        registry.register(
            Resource::new("/.well-known/core", InterfaceMask::LL, 40)
                .with_methods(MethodMask::GET)
                .public(),
        );
        registry.register(
            Resource::new("/dev/sn", InterfaceMask::I, 60)
                .with_methods(MethodMask::GET)
                .with_resource_type("dpa.501.10"),
        );
        registry.register(
            Resource::new("/a/sen", InterfaceMask::A, 60)
                .with_methods(MethodMask::POST)
                .with_resource_type("urn:knx:sen"),
        );
        for (base, rt) in [("/fp/g", "urn:knx:fp:g"), ("/fp/r", "urn:knx:fp:r"), ("/fp/p", "urn:knx:fp:p")] {
            registry.register(
                Resource::new(base, InterfaceMask::C, 60)
                    .with_methods(MethodMask::GET | MethodMask::POST)
                    .with_resource_type(rt),
            );
            registry.register(
                Resource::new(format!("{base}/*"), InterfaceMask::C, 60)
                    .with_methods(MethodMask::GET | MethodMask::PUT | MethodMask::DELETE)
                    .with_resource_type(rt),
            );
        }
        registry
    }

    pub fn register(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// URI matching: exact match first, then wildcard.
    pub fn find<'a>(&'a self, path: &'a str) -> Option<Matched<'a>> {
        if let Some(resource) = self.resources.iter().find(|r| !r.is_wildcard() && r.uri == path) {
            return Some(Matched { resource, suffix: "" });
        }
        self.resources
            .iter()
            .filter(|r| r.is_wildcard())
            .find_map(|r| r.matches(path).map(|suffix| Matched { resource: r, suffix }))
    }

    /// Resources flagged discoverable, for `/.well-known/core` rendering.
    pub fn discoverable(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.discoverable)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Test `request.required_scope ⊆ granted_scopes`, refusing with 4.03
/// otherwise. An unauthenticated request (`granted = None`) may only invoke
/// a resource marked public.
pub fn check_access(resource: &Resource, granted: Option<InterfaceMask>) -> Result<()> {
    match granted {
        Some(scopes) if scopes.contains_all(resource.interface_mask) => Ok(()),
        Some(_) => Err(RouterError::Forbidden),
        None if resource.public => Ok(()),
        None => Err(RouterError::Forbidden),
    }
}

pub fn check_method(resource: &Resource, method: MethodMask) -> Result<()> {
    if resource.methods.allows(method) {
        Ok(())
    } else {
        Err(RouterError::MethodNotAllowed)
    }
}

/// CBOR-only resources reject any other Accept value with 4.06. `accept` of `None` means the request didn't negotiate, which is
/// always acceptable.
pub fn negotiate_content_format(resource: &Resource, accept: Option<u16>) -> Result<u16> {
    match accept {
        None => Ok(resource.content_format),
        Some(requested) if requested == resource.content_format => Ok(requested),
        Some(_) => Err(RouterError::NotAcceptable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_takes_priority_over_wildcard() {
        let registry = ResourceRegistry::with_core_resources();
        let matched = registry.find("/fp/g").expect("exact match");
        assert_eq!(matched.resource.uri, "/fp/g");
        assert_eq!(matched.suffix, "");
    }

    #[test]
    fn wildcard_match_exposes_instance_suffix() {
        let registry = ResourceRegistry::with_core_resources();
        let matched = registry.find("/fp/g/17").expect("wildcard match");
        assert_eq!(matched.resource.uri, "/fp/g/*");
        assert_eq!(matched.suffix, "17");
    }

    #[test]
    fn unknown_uri_does_not_match() {
        let registry = ResourceRegistry::with_core_resources();
        assert!(registry.find("/nope").is_none());
    }

    #[test]
    fn access_denied_without_sufficient_scope() {
        let resource = Resource::new("/fp/g", InterfaceMask::C | InterfaceMask::SEC, 60);
        assert_eq!(check_access(&resource, Some(InterfaceMask::C)), Err(RouterError::Forbidden));
        assert_eq!(
            check_access(&resource, Some(InterfaceMask::C | InterfaceMask::SEC)),
            Ok(())
        );
    }

    #[test]
    fn unauthenticated_request_requires_public_resource() {
        let public = Resource::new("/.well-known/core", InterfaceMask::LL, 40).public();
        assert_eq!(check_access(&public, None), Ok(()));

        let secured = Resource::new("/dev/sn", InterfaceMask::I, 60);
        assert_eq!(check_access(&secured, None), Err(RouterError::Forbidden));
    }

    #[test]
    fn content_negotiation_rejects_mismatched_accept() {
        let resource = Resource::new("/dev/sn", InterfaceMask::I, 60);
        assert_eq!(negotiate_content_format(&resource, Some(60)), Ok(60));
        assert_eq!(
            negotiate_content_format(&resource, Some(50)),
            Err(RouterError::NotAcceptable)
        );
        assert_eq!(negotiate_content_format(&resource, None), Ok(60));
    }

    #[test]
    fn method_not_allowed_when_not_in_mask() {
        let resource = Resource::new("/dev/sn", InterfaceMask::I, 60).with_methods(MethodMask::GET);
        assert_eq!(check_method(&resource, MethodMask::GET), Ok(()));
        assert_eq!(check_method(&resource, MethodMask::POST), Err(RouterError::MethodNotAllowed));
    }
}
