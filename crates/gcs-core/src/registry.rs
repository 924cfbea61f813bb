//! Component schema registration.
//!
//! Every component kind used in a [`World`](crate::world::World) must first be
//! registered in its [`ComponentRegistry`] under a unique name. Registration
//! validates the schema, stores an immutable copy and returns a
//! [`ComponentInfo`] handle.
//!
//! The handle is a content hash of the name and the ordered field list, so it
//! is stable across runs: the same registration always yields the same
//! handle, and the same schema under two names yields two handles.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::definition::ComponentDefinition;
use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Opaque handle identifying a registered component schema.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentInfo(u64);

impl ComponentInfo {
    fn compute(name: &str, definition: &ComponentDefinition) -> Self {
        let mut hasher = blake3::Hasher::new();
        hash_str(&mut hasher, name);
        hasher.update(&(definition.len() as u64).to_le_bytes());
        for field in definition.fields() {
            hash_str(&mut hasher, &field.name);
            hasher.update(&field.field_type.host_tag().to_le_bytes());
        }
        let hash = hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash.as_bytes()[..8]);
        Self(u64::from_le_bytes(prefix))
    }

    /// The raw hash value.
    pub fn get_hash(self) -> u64 {
        self.0
    }
}

/// Feed `s` into `hasher` behind its byte length.
fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentInfo({:016x})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping component names to their validated schemas.
///
/// A name can only be bound to one schema. Registering it again with an
/// identical schema returns the existing handle; a different schema is
/// rejected.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Name -> handle.
    by_name: HashMap<String, ComponentInfo>,
    /// Handle -> stored schema.
    definitions: HashMap<ComponentInfo, ComponentDefinition>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            definitions: HashMap::new(),
        }
    }

    /// Register `definition` under `name`.
    ///
    /// Fails with [`EcsError::EmptyName`] for an empty name, with
    /// [`EcsError::SchemaViolation`] if the definition repeats a field name,
    /// and with [`EcsError::ComponentAlreadyRegistered`] if `name` is already
    /// bound to a different schema. A handle already owned by another name
    /// fails with [`EcsError::HandleCollision`]. The registry is unchanged on
    /// failure.
    pub fn register(
        &mut self,
        name: &str,
        definition: ComponentDefinition,
    ) -> Result<ComponentInfo, EcsError> {
        if name.is_empty() {
            return Err(EcsError::EmptyName { what: "component" });
        }
        definition.validate(name)?;

        if let Some(&existing) = self.by_name.get(name) {
            if self.definitions.get(&existing) == Some(&definition) {
                debug!(component = %name, info = ?existing, "component re-registered with identical schema");
                return Ok(existing);
            }
            warn!(component = %name, "rejected conflicting schema for registered component");
            return Err(EcsError::ComponentAlreadyRegistered {
                name: name.to_owned(),
            });
        }

        let info = ComponentInfo::compute(name, &definition);
        if self.definitions.contains_key(&info) {
            let owner = self
                .by_name
                .iter()
                .find(|(_, existing)| **existing == info)
                .map(|(owner, _)| owner.clone())
                .unwrap_or_default();
            warn!(component = %name, owner = %owner, info = ?info, "component handle collision");
            return Err(EcsError::HandleCollision {
                name: name.to_owned(),
                owner,
            });
        }
        debug!(component = %name, info = ?info, fields = definition.len(), "component registered");
        self.definitions.insert(info, definition);
        self.by_name.insert(name.to_owned(), info);
        Ok(info)
    }

    /// Look up a component's handle by its registered name.
    pub fn lookup_by_name(&self, name: &str) -> Option<ComponentInfo> {
        self.by_name.get(name).copied()
    }

    /// Get the stored schema for a handle.
    pub fn get_definition(&self, info: ComponentInfo) -> Option<&ComponentDefinition> {
        self.definitions.get(&info)
    }

    /// Get the stored schema for a name.
    pub fn definition_by_name(&self, name: &str) -> Option<&ComponentDefinition> {
        self.lookup_by_name(name)
            .and_then(|info| self.get_definition(info))
    }

    /// Whether `name` has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Whether `info` refers to a registered schema.
    pub fn contains_info(&self, info: ComponentInfo) -> bool {
        self.definitions.contains_key(&info)
    }

    /// Total number of registered components.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Returns the names of all registered components, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
