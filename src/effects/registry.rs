use std::collections::HashMap;
use std::sync::Arc;

use crate::effects::{preset, Effect};
use crate::error::{ConfigError, Result};

/// Registry for managing available photo effects
///
/// The registry provides a central place to discover effects. Effects are
/// registered by id and listed in registration order.
pub struct EffectRegistry {
    effects: HashMap<String, Arc<dyn Effect>>,
    order: Vec<String>,
}

impl EffectRegistry {
    /// Create a new registry with all built-in effects
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for effect in preset::builtin() {
            registry.register(effect);
        }
        registry
    }

    /// Registry with no effects at all
    pub fn empty() -> Self {
        Self { effects: HashMap::new(), order: Vec::new() }
    }

    /// Register an effect, replacing any effect with the same id
    pub fn register<E>(&mut self, effect: E)
    where
        E: Effect + 'static,
    {
        let id = effect.id().to_string();
        if self.effects.insert(id.clone(), Arc::new(effect)).is_none() {
            self.order.push(id);
        }
    }

    /// Get an effect by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn Effect>> {
        self.effects.get(id).cloned()
    }

    /// Like `get`, but unknown ids are a configuration error
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Effect>> {
        self.get(id).ok_or_else(|| {
            ConfigError::UnknownOption { kind: "effect".to_string(), id: id.to_string() }.into()
        })
    }

    /// Display name for an id, falling back to the id itself
    pub fn display_name(&self, id: &str) -> String {
        self.effects
            .get(id)
            .map(|e| e.name().to_string())
            .unwrap_or_else(|| id.to_string())
    }

    /// All effect ids in registration order
    pub fn available(&self) -> &[String] {
        &self.order
    }

    pub fn has_effect(&self, id: &str) -> bool {
        self.effects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{FilterEffect, FilterOp};

    #[test]
    fn test_builtin_effects_available() {
        let registry = EffectRegistry::new();

        for id in [
            "none", "glow", "kiss", "vintage", "noir", "rose-tint", "heart-bokeh", "golden-hour", "passion",
            "cupid-sparkle", "sparkle",
        ] {
            assert!(registry.has_effect(id), "missing {}", id);
        }
        assert_eq!(registry.len(), 11);
        assert_eq!(registry.available()[0], "none");
    }

    #[test]
    fn test_get_effect() {
        let registry = EffectRegistry::new();

        let glow = registry.get("glow");
        assert!(glow.is_some());
        assert_eq!(glow.unwrap().name(), "Dreamy");

        assert!(registry.get("unknown").is_none());
        assert!(registry.resolve("unknown").is_err());
        assert_eq!(registry.display_name("kiss"), "Cupid");
    }

    #[test]
    fn test_custom_effect_registration() {
        let mut registry = EffectRegistry::new();
        registry.register(FilterEffect::new("dim", "Dim", vec![FilterOp::Brightness(0.5)]));

        assert!(registry.has_effect("dim"));
        assert_eq!(registry.len(), 12);
        assert_eq!(registry.available().last().map(String::as_str), Some("dim"));

        // Re-registering keeps the original position
        registry.register(FilterEffect::new("none", "Plain", vec![]));
        assert_eq!(registry.len(), 12);
        assert_eq!(registry.display_name("none"), "Plain");
        assert_eq!(registry.available()[0], "none");
    }
}
