// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamically typed property and data values.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use peniko::Color;

use crate::transform::Transform;

/// A value carried by data and properties.
///
/// [`Value::Null`] means "unset": implied defaults are computed for it and casts skip it. It is
/// not a falsy value: only [`Value::Bool`] and [`Value::Number`] have a truth value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Unset.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    Text(Rc<str>),
    /// A color.
    Color(Color),
    /// A panel transform.
    Transform(Transform),
    /// A list (typically a mark's data).
    List(Rc<[Value]>),
    /// A record (typically one datum).
    Record(Rc<HashMap<Rc<str>, Value>>),
}

impl Value {
    /// Builds a list value.
    pub fn list<T: Into<Self>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a record value from `(field, value)` pairs.
    pub fn record<K: Into<Rc<str>>, T: Into<Self>>(
        fields: impl IntoIterator<Item = (K, T)>,
    ) -> Self {
        Self::Record(Rc::new(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The number, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The color, if this is one.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// The transform, if this is one.
    pub fn as_transform(&self) -> Option<Transform> {
        match self {
            Self::Transform(t) => Some(*t),
            _ => None,
        }
    }

    /// The items, if this is a list.
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// A field of a record. Missing fields and non-records give `None`.
    pub fn field(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Truth value used by boolean casts: `Null`, `false`, `0`, `NaN` and `""` are false.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// A hashable key for instance reconciliation, if this value can serve as an id.
    pub fn id_key(&self) -> Option<IdKey> {
        match self {
            Self::Bool(b) => Some(IdKey::Bool(*b)),
            Self::Number(n) if !n.is_nan() => Some(IdKey::Number((*n + 0.0).to_bits())),
            Self::Text(s) => Some(IdKey::Text(s.clone())),
            _ => None,
        }
    }
}

/// Hashable form of an instance `id`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdKey {
    /// A boolean id.
    Bool(bool),
    /// A numeric id, by bit pattern (`-0.0` is folded into `0.0`).
    Number(u64),
    /// A string id.
    Text(Rc<str>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Color(c) => {
                let rgba = c.to_rgba8();
                write!(f, "rgba({}, {}, {}, {})", rgba.r, rgba.g, rgba.b, rgba.a)
            }
            Self::Transform(t) => write!(f, "scale({}) translate({}, {})", t.k, t.x, t.y),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Record(fields) => {
                let mut keys: Vec<&Rc<str>> = fields.keys().collect();
                keys.sort();
                f.write_str("{")?;
                for (i, k) in keys.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {}", fields[k])?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s.into())
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Self::Text(s)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Self::Color(c)
    }
}

impl From<Transform> for Value {
    fn from(t: Transform) -> Self {
        Self::Transform(t)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::list(items)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
