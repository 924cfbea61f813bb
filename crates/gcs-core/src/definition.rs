//! Component schemas.
//!
//! A [`ComponentDefinition`] is an ordered list of [`FieldDefinition`]s built
//! up with [`ComponentDefinition::add_field`] and then handed to
//! [`World::register_component`](crate::world::World::register_component).
//! The world keeps its own validated copy, so the builder can be reused or
//! mutated afterwards without affecting the registered schema.
//!
//! Anything that can produce an ordered list of `(name, type)` pairs can act
//! as a schema through the [`SchemaSource`] trait. The crate ships two
//! sources: a hand-built [`ComponentDefinition`] and a [`ScriptPropertyList`]
//! reflected from a host script.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::variant::VariantType;
use crate::{EcsError, Violation};

// ---------------------------------------------------------------------------
// FieldDefinition
// ---------------------------------------------------------------------------

/// One named, typed field of a component. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: VariantType,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: VariantType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

// ---------------------------------------------------------------------------
// ComponentDefinition
// ---------------------------------------------------------------------------

/// The shape of one component kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentDefinition {
    fields: Vec<FieldDefinition>,
}

impl ComponentDefinition {
    /// Create an empty definition.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a field declaration.
    ///
    /// Only an empty name is rejected here. Adding the same name twice is
    /// allowed and surfaces as a [`Violation::DuplicateField`] when the
    /// definition is registered.
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        field_type: VariantType,
    ) -> Result<(), EcsError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EcsError::EmptyName { what: "field" });
        }
        self.fields.push(FieldDefinition { name, field_type });
        Ok(())
    }

    /// Builder-style [`add_field`](Self::add_field).
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        field_type: VariantType,
    ) -> Result<Self, EcsError> {
        self.add_field(name, field_type)?;
        Ok(self)
    }

    /// Field declarations in insertion order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check the definition can be registered as `component`.
    pub(crate) fn validate(&self, component: &str) -> Result<(), EcsError> {
        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(EcsError::EmptyName { what: "field" });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(EcsError::SchemaViolation {
                    component: component.to_owned(),
                    field: field.name.clone(),
                    violation: Violation::DuplicateField,
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<FieldDefinition> for ComponentDefinition {
    fn from_iter<I: IntoIterator<Item = FieldDefinition>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// SchemaSource
// ---------------------------------------------------------------------------

/// Anything that can describe a component's fields.
pub trait SchemaSource {
    /// Produce the ordered field list as a definition.
    fn to_definition(&self) -> Result<ComponentDefinition, EcsError>;
}

impl SchemaSource for ComponentDefinition {
    fn to_definition(&self) -> Result<ComponentDefinition, EcsError> {
        Ok(self.clone())
    }
}

impl SchemaSource for [FieldDefinition] {
    fn to_definition(&self) -> Result<ComponentDefinition, EcsError> {
        Ok(self.iter().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Script property reflection
// ---------------------------------------------------------------------------

/// One property as reported by the host's script reflection.
///
/// `type_tag` is the host's numeric type tag; see
/// [`VariantType::from_host_tag`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptProperty {
    pub name: String,
    pub type_tag: i64,
}

/// The property list of a host script, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPropertyList {
    pub properties: Vec<ScriptProperty>,
}

impl ScriptPropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, type_tag: i64) {
        self.properties.push(ScriptProperty {
            name: name.into(),
            type_tag,
        });
    }
}

impl SchemaSource for ScriptPropertyList {
    /// Every property becomes a field. A property whose type is outside the
    /// supported set fails the whole conversion.
    fn to_definition(&self) -> Result<ComponentDefinition, EcsError> {
        let mut definition = ComponentDefinition::new();
        for property in &self.properties {
            let field_type = VariantType::from_host_tag(property.type_tag)?;
            definition.add_field(property.name.clone(), field_type)?;
        }
        Ok(definition)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn add_field_keeps_order() {
        let mut def = ComponentDefinition::new();
        def.add_field("y", VariantType::Real).unwrap();
        def.add_field("x", VariantType::Real).unwrap();
        def.add_field("label", VariantType::String).unwrap();
        let names: Vec<_> = def.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["y", "x", "label"]);
        assert_eq!(def.field("label").unwrap().field_type, VariantType::String);
        assert!(def.field("z").is_none());
    }

    #[test]
    fn empty_field_name_rejected() {
        let mut def = ComponentDefinition::new();
        let err = def.add_field("", VariantType::Int).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidName);
        assert!(def.is_empty());
    }

    #[test]
    fn duplicate_names_accepted_by_builder_rejected_by_validate() {
        let mut def = ComponentDefinition::new();
        def.add_field("x", VariantType::Real).unwrap();
        def.add_field("x", VariantType::Real).unwrap();
        assert_eq!(def.len(), 2);

        let err = def.validate("Position").unwrap_err();
        assert!(matches!(
            err,
            EcsError::SchemaViolation {
                violation: Violation::DuplicateField,
                ..
            }
        ));
    }

    #[test]
    fn structural_equality() {
        let a = ComponentDefinition::new()
            .with_field("x", VariantType::Real)
            .unwrap();
        let b: ComponentDefinition = [FieldDefinition::new("x", VariantType::Real)]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        let c = ComponentDefinition::new()
            .with_field("x", VariantType::Int)
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn script_properties_become_fields() {
        let mut props = ScriptPropertyList::new();
        props.push("speed", 3);
        props.push("name", 4);
        props.push("alive", 1);
        let def = props.to_definition().unwrap();
        let expected = ComponentDefinition::new()
            .with_field("speed", VariantType::Real)
            .and_then(|d| d.with_field("name", VariantType::String))
            .and_then(|d| d.with_field("alive", VariantType::Bool))
            .unwrap();
        assert_eq!(def, expected);
    }

    #[test]
    fn script_property_with_unsupported_type_fails() {
        let mut props = ScriptPropertyList::new();
        props.push("position", 5);
        assert!(props.to_definition().is_err());
    }
}
