//! Entity registry for managing table descriptors and their routes

use axum::Router;
use std::collections::BTreeMap;

/// Trait that describes how to build routes for one table
///
/// Each record type (Deal, Invoice, BackupJob, etc.) has a descriptor that
/// mounts the generic CRUD handlers and its domain handlers.
pub trait EntityDescriptor: Send + Sync {
    /// The entity type name (singular, e.g., "deal")
    fn entity_type(&self) -> &str;

    /// The plural form, also the route prefix (e.g., "deals")
    fn plural(&self) -> &str;

    /// Build the routes for this table
    ///
    /// Should return a Router with routes like:
    /// - GET /{plural}
    /// - POST /{plural}
    /// - GET /{plural}/{id}
    fn build_routes(&self) -> Router;
}

/// Registry for all tables and module-level routes
#[derive(Default)]
pub struct EntityRegistry {
    descriptors: BTreeMap<String, Box<dyn EntityDescriptor>>,
    extra_routes: Vec<Router>,
}

impl EntityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table descriptor, keyed by its entity type
    pub fn register(&mut self, descriptor: Box<dyn EntityDescriptor>) {
        let entity_type = descriptor.entity_type().to_string();
        self.descriptors.insert(entity_type, descriptor);
    }

    /// Register routes that belong to a module rather than one table
    /// (stats, settings actions, reports)
    pub fn register_routes(&mut self, routes: Router) {
        self.extra_routes.push(routes);
    }

    /// Build a router with all registered routes
    pub fn build_routes(&self) -> Router {
        let mut router = Router::new();

        for descriptor in self.descriptors.values() {
            router = router.merge(descriptor.build_routes());
        }
        for routes in &self.extra_routes {
            router = router.merge(routes.clone());
        }

        router
    }

    /// Get all registered entity types, sorted
    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.keys().map(|s| s.as_str()).collect()
    }

    /// Route prefix of a registered entity type
    pub fn plural_of(&self, entity_type: &str) -> Option<&str> {
        self.descriptors.get(entity_type).map(|d| d.plural())
    }
}
