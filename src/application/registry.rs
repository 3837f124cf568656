//! Manager registry: ordering and per-tenant activation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::domain::manager::ManagerDescriptor;
use crate::domain::tenant::Tenant;
use crate::error::DependencyError;
use crate::port::manager::Manager;

/// The static catalog of registered managers in execution order.
///
/// Built once at startup via [`ManagerRegistryBuilder`]; a dependency cycle or
/// a reference to an unregistered id fails the build and the process must not
/// begin polling.
pub struct ManagerRegistry {
    managers: Vec<Arc<dyn Manager>>,
    by_id: HashMap<String, usize>,
    order: Vec<String>,
}

impl ManagerRegistry {
    /// Create a builder.
    #[must_use]
    pub fn builder() -> ManagerRegistryBuilder {
        ManagerRegistryBuilder::default()
    }

    /// Ids in dependency order, ties broken by ascending priority then id.
    #[must_use]
    pub fn resolve_order(&self) -> &[String] {
        &self.order
    }

    /// Look up a manager by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Manager>> {
        self.by_id.get(id).map(|&idx| &self.managers[idx])
    }

    /// All descriptors, in execution order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<&ManagerDescriptor> {
        self.in_order().map(|m| m.descriptor()).collect()
    }

    /// Managers active for `tenant`, in execution order.
    ///
    /// A manager runs when it is always-on or the tenant's configuration
    /// enables its module key.
    #[must_use]
    pub fn active_for(&self, tenant: &Tenant) -> Vec<Arc<dyn Manager>> {
        self.in_order()
            .filter(|manager| {
                let descriptor = manager.descriptor();
                descriptor.always_on
                    || descriptor
                        .module_key
                        .as_deref()
                        .is_some_and(|key| tenant.module_enabled(key))
            })
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    fn in_order(&self) -> impl Iterator<Item = &Arc<dyn Manager>> {
        self.order.iter().map(|id| &self.managers[self.by_id[id]])
    }
}

/// Builder collecting managers before dependency validation.
#[derive(Default)]
pub struct ManagerRegistryBuilder {
    managers: Vec<Arc<dyn Manager>>,
}

impl ManagerRegistryBuilder {
    /// Register a manager. Order of registration is irrelevant; execution
    /// order comes from dependencies and priorities.
    #[must_use]
    pub fn register(mut self, manager: Arc<dyn Manager>) -> Self {
        self.managers.push(manager);
        self
    }

    /// Validate the dependency graph and produce the registry.
    pub fn build(self) -> Result<ManagerRegistry, DependencyError> {
        let mut by_id = HashMap::with_capacity(self.managers.len());
        for (idx, manager) in self.managers.iter().enumerate() {
            let id = manager.descriptor().id.clone();
            if by_id.insert(id.clone(), idx).is_some() {
                return Err(DependencyError::Duplicate { id });
            }
        }

        let descriptors: Vec<&ManagerDescriptor> =
            self.managers.iter().map(|m| m.descriptor()).collect();
        let order = topological_order(&descriptors)?;

        Ok(ManagerRegistry {
            managers: self.managers,
            by_id,
            order,
        })
    }
}

/// Kahn's algorithm with deterministic tie-breaking: among ready nodes the
/// lowest (priority, id) runs first.
fn topological_order(
    descriptors: &[&ManagerDescriptor],
) -> Result<Vec<String>, DependencyError> {
    let by_id: HashMap<&str, &ManagerDescriptor> = descriptors
        .iter()
        .map(|d| (d.id.as_str(), *d))
        .collect();

    let mut in_degree: HashMap<&str, usize> =
        descriptors.iter().map(|d| (d.id.as_str(), 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for descriptor in descriptors {
        for dependency in &descriptor.dependencies {
            if !by_id.contains_key(dependency.as_str()) {
                return Err(DependencyError::Unknown {
                    manager: descriptor.id.clone(),
                    dependency: dependency.clone(),
                });
            }
            if let Some(degree) = in_degree.get_mut(descriptor.id.as_str()) {
                *degree += 1;
            }
            dependents
                .entry(dependency.as_str())
                .or_default()
                .push(descriptor.id.as_str());
        }
    }

    let mut ready: BTreeSet<(u32, &str)> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&id, _)| (by_id[id].priority, id))
        .collect();

    let mut order = Vec::with_capacity(descriptors.len());
    while let Some(&(priority, id)) = ready.iter().next() {
        ready.remove(&(priority, id));
        order.push(id.to_string());

        for &dependent in dependents.get(id).map_or(&[][..], Vec::as_slice) {
            let Some(degree) = in_degree.get_mut(dependent) else {
                continue;
            };
            *degree -= 1;
            if *degree == 0 {
                ready.insert((by_id[dependent].priority, dependent));
            }
        }
    }

    if order.len() != descriptors.len() {
        let mut ids: Vec<String> = in_degree
            .iter()
            .filter(|(_, &degree)| degree > 0)
            .map(|(&id, _)| id.to_string())
            .collect();
        ids.sort();
        return Err(DependencyError::Cycle { ids });
    }

    Ok(order)
}
