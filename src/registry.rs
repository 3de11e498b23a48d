//! Named-factory backend registry.
//!
//! Grounded on `original_source/common/include/common/factory_registry.h`
//! and its two concrete instantiations,
//! `solver_registry_sole.cpp`/`solver_registry_attach.cpp`: a registry
//! maps a backend name to a constructor, rejects duplicate names, and
//! resolves products by name at startup, never inside a hot loop.

use std::collections::HashMap;

/// A registry of named factories producing boxed `Product` values.
/// Registered once (typically at process or test startup) and consulted
/// once per `Environment` construction, never per mechanics/diffusion
/// step.
pub struct FactoryRegistry<Product: ?Sized> {
    factories: HashMap<String, Box<dyn Fn() -> Box<Product> + Send + Sync>>,
}

impl<Product: ?Sized> Default for FactoryRegistry<Product> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<Product: ?Sized> FactoryRegistry<Product> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` with `factory`. Returns `false` without
    /// replacing the existing entry if `name` is already registered;
    /// duplicate registration is recoverable, unlike an unknown-name
    /// lookup.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> Box<Product> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return false;
        }
        self.factories.insert(name, Box::new(factory));
        true
    }

    /// Constructs a fresh product from the named factory. `None` if
    /// `name` was never registered; release builds treat this as a
    /// legal no-op, debug builds additionally assert.
    pub fn get(&self, name: &str) -> Option<Box<Product>> {
        match self.factories.get(name) {
            Some(factory) => Some(factory()),
            None => {
                debug_assert!(false, "no backend registered under name '{name}'");
                None
            }
        }
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn available_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn register_and_get_round_trip() {
        let mut registry: FactoryRegistry<dyn Greeter> = FactoryRegistry::new();
        assert!(registry.register("english", || Box::new(English)));
        let product = registry.get("english").unwrap();
        assert_eq!(product.greet(), "hello");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry: FactoryRegistry<dyn Greeter> = FactoryRegistry::new();
        assert!(registry.register("english", || Box::new(English)));
        assert!(!registry.register("english", || Box::new(English)));
    }

    #[test]
    fn unknown_name_returns_none() {
        let registry: FactoryRegistry<dyn Greeter> = FactoryRegistry::new();
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn available_names_lists_registrations() {
        let mut registry: FactoryRegistry<dyn Greeter> = FactoryRegistry::new();
        registry.register("english", || Box::new(English));
        assert_eq!(registry.available_names(), vec!["english"]);
    }
}
