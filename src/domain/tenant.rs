//! Tenant (league) view and module-enablement resolution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Explicit per-module configuration block on a tenant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub enabled: bool,
}

/// Read-only view of one league, as far as the orchestrator is concerned.
///
/// The orchestrator only ever reads the enablement maps; everything else a
/// league carries belongs to the business modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub active: bool,
    /// Explicit per-module config, highest precedence.
    pub configured_modules: HashMap<String, ModuleConfig>,
    /// Legacy flat enablement map, consulted under the snake_case key first
    /// and the camelCase spelling second.
    pub legacy_modules: HashMap<String, bool>,
}

impl Tenant {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active: true,
            configured_modules: HashMap::new(),
            legacy_modules: HashMap::new(),
        }
    }

    /// Resolve whether the module behind `key` is enabled for this tenant.
    ///
    /// Precedence: explicit per-module config, then the legacy flat map
    /// (snake_case key, then its camelCase spelling), then disabled.
    #[must_use]
    pub fn module_enabled(&self, key: &str) -> bool {
        if let Some(config) = self.configured_modules.get(key) {
            return config.enabled;
        }
        if let Some(enabled) = self.legacy_modules.get(key) {
            return *enabled;
        }
        if let Some(enabled) = self.legacy_modules.get(&snake_to_camel(key)) {
            return *enabled;
        }
        false
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_wins_over_legacy() {
        let mut tenant = Tenant::new("l1", "League One");
        tenant
            .configured_modules
            .insert("top_scorer".into(), ModuleConfig { enabled: false });
        tenant.legacy_modules.insert("top_scorer".into(), true);

        assert!(!tenant.module_enabled("top_scorer"));
    }

    #[test]
    fn legacy_snake_key_beats_camel_spelling() {
        let mut tenant = Tenant::new("l1", "League One");
        tenant.legacy_modules.insert("top_scorer".into(), false);
        tenant.legacy_modules.insert("topScorer".into(), true);

        assert!(!tenant.module_enabled("top_scorer"));
    }

    #[test]
    fn camel_spelling_is_accepted_as_fallback() {
        let mut tenant = Tenant::new("l1", "League One");
        tenant.legacy_modules.insert("goldenGlove".into(), true);

        assert!(tenant.module_enabled("golden_glove"));
    }

    #[test]
    fn unknown_module_is_a_definite_false() {
        let tenant = Tenant::new("l1", "League One");
        assert!(!tenant.module_enabled("knockout"));
    }
}
