//! Dynamically-typed values exchanged with the host.
//!
//! The host owns its own dynamic value type (a "variant"). The core only needs
//! a handful of conversions from it, captured by the [`Variant`] trait. Inside
//! the core every field value is a [`Value`], which covers the supported tag
//! set: nil, 64-bit integer, 64-bit float, boolean and UTF-8 text.
//!
//! Two [`Variant`] implementations ship with the crate: [`Value`] itself and
//! [`serde_json::Value`], which is handy for hosts that already speak JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EcsError;

// ---------------------------------------------------------------------------
// VariantType
// ---------------------------------------------------------------------------

/// Runtime tag of a [`Value`] and declared type of a component field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariantType {
    Nil,
    Bool,
    Int,
    Real,
    String,
}

impl VariantType {
    /// Decode the host's numeric type tag.
    ///
    /// The host numbers its atomic types `0 = nil, 1 = bool, 2 = int,
    /// 3 = real, 4 = string`. Every other host type (vectors, colors, arrays,
    /// objects, ...) is outside the supported set.
    pub fn from_host_tag(tag: i64) -> Result<Self, EcsError> {
        match tag {
            0 => Ok(VariantType::Nil),
            1 => Ok(VariantType::Bool),
            2 => Ok(VariantType::Int),
            3 => Ok(VariantType::Real),
            4 => Ok(VariantType::String),
            other => Err(EcsError::UnsupportedType {
                tag: format!("host tag {other}"),
            }),
        }
    }

    /// The host's numeric tag for this type.
    pub fn host_tag(self) -> i64 {
        match self {
            VariantType::Nil => 0,
            VariantType::Bool => 1,
            VariantType::Int => 2,
            VariantType::Real => 3,
            VariantType::String => 4,
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantType::Nil => "nil",
            VariantType::Bool => "bool",
            VariantType::Int => "int",
            VariantType::Real => "real",
            VariantType::String => "string",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Variant -- the host bridge
// ---------------------------------------------------------------------------

/// Conversions the core needs from a host's dynamic value type.
///
/// `to_*` conversions follow the implementation's coercion rules and return
/// [`EcsError::TypeMismatch`] when a value cannot be coerced. `from_*`
/// constructors never fail.
pub trait Variant: Sized {
    /// The runtime tag, or `None` if the value is outside the supported set.
    fn variant_type(&self) -> Option<VariantType>;

    fn to_i64(&self) -> Result<i64, EcsError>;
    fn to_f64(&self) -> Result<f64, EcsError>;
    fn to_bool(&self) -> Result<bool, EcsError>;
    fn to_text(&self) -> Result<String, EcsError>;

    fn from_i64(value: i64) -> Self;
    fn from_f64(value: f64) -> Self;
    fn from_bool(value: bool) -> Self;
    fn from_text(value: String) -> Self;

    /// The empty (nil) value.
    fn empty() -> Self;
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A field value as stored by the core.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Real(f64),
    String(String),
}

impl Value {
    /// The runtime tag of this value.
    pub fn get_type(&self) -> VariantType {
        match self {
            Value::Nil => VariantType::Nil,
            Value::Bool(_) => VariantType::Bool,
            Value::Int(_) => VariantType::Int,
            Value::Real(_) => VariantType::Real,
            Value::String(_) => VariantType::String,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Read a host value into the core representation.
    ///
    /// The host's own tag decides which conversion runs, so nothing is
    /// coerced on the way in.
    pub fn from_variant<V: Variant>(variant: &V) -> Result<Self, EcsError> {
        let tag = variant.variant_type().ok_or_else(|| EcsError::UnsupportedType {
            tag: "non-atomic host value".to_owned(),
        })?;
        Ok(match tag {
            VariantType::Nil => Value::Nil,
            VariantType::Bool => Value::Bool(variant.to_bool()?),
            VariantType::Int => Value::Int(variant.to_i64()?),
            VariantType::Real => Value::Real(variant.to_f64()?),
            VariantType::String => Value::String(variant.to_text()?),
        })
    }

    /// Hand this value back to the host.
    pub fn to_variant<V: Variant>(&self) -> V {
        match self {
            Value::Nil => V::empty(),
            Value::Bool(v) => V::from_bool(*v),
            Value::Int(v) => V::from_i64(*v),
            Value::Real(v) => V::from_f64(*v),
            Value::String(v) => V::from_text(v.clone()),
        }
    }

    fn mismatch(&self, expected: VariantType) -> EcsError {
        EcsError::TypeMismatch {
            expected,
            found: self.get_type(),
        }
    }
}

impl Variant for Value {
    fn variant_type(&self) -> Option<VariantType> {
        Some(self.get_type())
    }

    /// Floats truncate toward zero (saturating at the `i64` range, NaN is 0),
    /// booleans become 0 or 1 and text must parse as an integer.
    fn to_i64(&self) -> Result<i64, EcsError> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Real(v) => Ok(*v as i64),
            Value::Bool(v) => Ok(i64::from(*v)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| self.mismatch(VariantType::Int)),
            Value::Nil => Err(self.mismatch(VariantType::Int)),
        }
    }

    fn to_f64(&self) -> Result<f64, EcsError> {
        match self {
            Value::Real(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::Bool(v) => Ok(if *v { 1.0 } else { 0.0 }),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.mismatch(VariantType::Real)),
            Value::Nil => Err(self.mismatch(VariantType::Real)),
        }
    }

    /// Numbers are true when non-zero; text must read `true` or `false`.
    fn to_bool(&self) -> Result<bool, EcsError> {
        match self {
            Value::Bool(v) => Ok(*v),
            Value::Int(v) => Ok(*v != 0),
            Value::Real(v) => Ok(*v != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(self.mismatch(VariantType::Bool)),
            },
            Value::Nil => Err(self.mismatch(VariantType::Bool)),
        }
    }

    /// Every value has a text form; nil renders as the empty string.
    fn to_text(&self) -> Result<String, EcsError> {
        Ok(self.to_string())
    }

    fn from_i64(value: i64) -> Self {
        Value::Int(value)
    }

    fn from_f64(value: f64) -> Self {
        Value::Real(value)
    }

    fn from_bool(value: bool) -> Self {
        Value::Bool(value)
    }

    fn from_text(value: String) -> Self {
        Value::String(value)
    }

    fn empty() -> Self {
        Value::Nil
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

// ---------------------------------------------------------------------------
// serde_json::Value as a host variant
// ---------------------------------------------------------------------------

/// JSON numbers that fit an `i64` are ints, every other number is a real.
/// Arrays and objects have no supported tag.
impl Variant for serde_json::Value {
    fn variant_type(&self) -> Option<VariantType> {
        match self {
            serde_json::Value::Null => Some(VariantType::Nil),
            serde_json::Value::Bool(_) => Some(VariantType::Bool),
            serde_json::Value::Number(n) if n.is_i64() => Some(VariantType::Int),
            serde_json::Value::Number(_) => Some(VariantType::Real),
            serde_json::Value::String(_) => Some(VariantType::String),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    fn to_i64(&self) -> Result<i64, EcsError> {
        json_to_value(self)?.to_i64()
    }

    fn to_f64(&self) -> Result<f64, EcsError> {
        json_to_value(self)?.to_f64()
    }

    fn to_bool(&self) -> Result<bool, EcsError> {
        json_to_value(self)?.to_bool()
    }

    fn to_text(&self) -> Result<String, EcsError> {
        json_to_value(self)?.to_text()
    }

    fn from_i64(value: i64) -> Self {
        serde_json::Value::from(value)
    }

    /// Non-finite floats have no JSON form and become `null`.
    fn from_f64(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }

    fn from_bool(value: bool) -> Self {
        serde_json::Value::Bool(value)
    }

    fn from_text(value: String) -> Self {
        serde_json::Value::String(value)
    }

    fn empty() -> Self {
        serde_json::Value::Null
    }
}

/// Direct structural mapping, without going through the `to_*` coercions.
fn json_to_value(json: &serde_json::Value) -> Result<Value, EcsError> {
    match json {
        serde_json::Value::Null => Ok(Value::Nil),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n.as_f64().map(Value::Real).ok_or_else(|| EcsError::UnsupportedType {
                tag: format!("json number {n}"),
            }),
        },
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Array(_) => Err(EcsError::UnsupportedType {
            tag: "json array".to_owned(),
        }),
        serde_json::Value::Object(_) => Err(EcsError::UnsupportedType {
            tag: "json object".to_owned(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
