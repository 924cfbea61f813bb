//! Per-entity component values.
//!
//! A [`ComponentData`] maps field names to [`Value`]s for one entity's
//! instance of one component kind. It is built freely by the caller and only
//! checked against the registered schema when it is written into a
//! [`World`](crate::world::World).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::definition::ComponentDefinition;
use crate::variant::{Value, VariantType};
use crate::{EcsError, Violation};

static NIL: Value = Value::Nil;

/// Field values of one component instance.
///
/// Fields that were never set read as [`Value::Nil`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentData {
    fields: BTreeMap<String, Value>,
}

impl ComponentData {
    /// An instance with no fields set.
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// The value of `field`, or [`Value::Nil`] if it is absent.
    pub fn get_field(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NIL)
    }

    /// Set `field`, replacing any previous value.
    pub fn set_field(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Builder-style [`set_field`](Self::set_field).
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(field, value);
        self
    }

    /// Unset `field`, returning its previous value.
    pub fn remove_field(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Whether `field` has been set.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// All set fields, ordered by name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check every field against `definition` and return the stored form.
    ///
    /// Nil values are dropped (nil and absent read the same). When `widen`
    /// is set, ints written to real fields are stored as reals.
    pub(crate) fn conform(
        self,
        component: &str,
        definition: &ComponentDefinition,
        widen: bool,
    ) -> Result<ComponentData, EcsError> {
        let mut stored = BTreeMap::new();
        for (name, value) in self.fields {
            let Some(field) = definition.field(&name) else {
                return Err(EcsError::SchemaViolation {
                    component: component.to_owned(),
                    field: name,
                    violation: Violation::UnknownField,
                });
            };
            let value = match (field.field_type, value) {
                (_, Value::Nil) => continue,
                (VariantType::Real, Value::Int(i)) if widen => Value::Real(i as f64),
                (expected, value) if value.get_type() == expected => value,
                (expected, value) => {
                    return Err(EcsError::SchemaViolation {
                        component: component.to_owned(),
                        field: name,
                        violation: Violation::TypeMismatch {
                            expected,
                            found: value.get_type(),
                        },
                    });
                }
            };
            stored.insert(name, value);
        }
        Ok(ComponentData { fields: stored })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ComponentData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn position() -> ComponentDefinition {
        ComponentDefinition::new()
            .with_field("x", VariantType::Real)
            .and_then(|d| d.with_field("y", VariantType::Real))
            .and_then(|d| d.with_field("label", VariantType::String))
            .unwrap()
    }

    #[test]
    fn absent_field_reads_nil() {
        let data = ComponentData::new().with_field("x", 1.0);
        assert_eq!(data.get_field("x"), &Value::Real(1.0));
        assert_eq!(data.get_field("y"), &Value::Nil);
        assert!(!data.has_field("y"));
    }

    #[test]
    fn set_field_overwrites() {
        let mut data = ComponentData::new();
        data.set_field("x", 1.0);
        data.set_field("x", 2.0);
        assert_eq!(data.len(), 1);
        assert_eq!(data.get_field("x"), &Value::Real(2.0));
        assert_eq!(data.remove_field("x"), Some(Value::Real(2.0)));
        assert!(data.is_empty());
    }

    #[test]
    fn conform_accepts_matching_types() {
        let data: ComponentData = [("x", Value::Real(1.0)), ("label", Value::from("a"))]
            .into_iter()
            .collect();
        let stored = data.clone().conform("Position", &position(), true).unwrap();
        assert_eq!(stored, data);
    }

    #[test]
    fn conform_rejects_unknown_field() {
        let data = ComponentData::new().with_field("x", 1.0).with_field("z", 2.0);
        let err = data.conform("Position", &position(), true).unwrap_err();
        match err {
            EcsError::SchemaViolation {
                component,
                field,
                violation,
            } => {
                assert_eq!(component, "Position");
                assert_eq!(field, "z");
                assert_eq!(violation, Violation::UnknownField);
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[test]
    fn conform_rejects_wrong_type() {
        let data = ComponentData::new().with_field("label", 3);
        let err = data.conform("Position", &position(), true).unwrap_err();
        assert!(matches!(
            err,
            EcsError::SchemaViolation {
                violation: Violation::TypeMismatch {
                    expected: VariantType::String,
                    found: VariantType::Int,
                },
                ..
            }
        ));
    }

    #[test]
    fn int_widens_to_real_only_when_enabled() {
        let data = ComponentData::new().with_field("x", 4);
        let stored = data.clone().conform("Position", &position(), true).unwrap();
        assert_eq!(stored.get_field("x"), &Value::Real(4.0));

        assert!(data.conform("Position", &position(), false).is_err());
    }

    #[test]
    fn real_never_narrows_to_int() {
        let def = ComponentDefinition::new()
            .with_field("hp", VariantType::Int)
            .unwrap();
        let data = ComponentData::new().with_field("hp", 4.0);
        assert!(data.conform("Health", &def, true).is_err());
    }

    #[test]
    fn nil_is_dropped() {
        let data = ComponentData::new()
            .with_field("x", 1.0)
            .with_field("y", Value::Nil);
        let stored = data.conform("Position", &position(), true).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.get_field("y"), &Value::Nil);
    }
}
