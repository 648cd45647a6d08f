// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property records.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use peniko::Color;

use crate::cast::Cast;
use crate::context::Ctx;
use crate::error::PropertyError;
use crate::transform::Transform;
use crate::value::Value;

/// Signature of a property function.
pub type PropFn = dyn Fn(&Ctx<'_>) -> Result<Value, PropertyError>;

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// Allocates a property id. Ids increase monotonically for the whole process, so a larger id
/// always means a more recent declaration.
pub fn next_id() -> usize {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// How a property record is evaluated.
///
/// The discriminant is the evaluation bucket: defs come before ordinary properties, and constants
/// before functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    /// A constant def (state variable).
    DefConst = 0,
    /// A computed def.
    DefFn = 1,
    /// A constant property.
    Const = 2,
    /// A computed property.
    Fn = 3,
}

impl PropertyKind {
    /// Whether this is a def.
    pub fn is_def(self) -> bool {
        matches!(self, Self::DefConst | Self::DefFn)
    }

    /// Bucket index used by binding.
    pub fn bucket(self) -> usize {
        self as usize
    }
}

/// The declared value of a property.
#[derive(Clone)]
pub enum PropertyValue {
    /// A constant, already cast.
    Const(Value),
    /// A function evaluated per instance; its result is cast after evaluation.
    Function(Rc<PropFn>),
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => f.debug_tuple("Const").field(v).finish(),
            Self::Function(_) => f.write_str("Function(<fn>)"),
        }
    }
}

/// One declaration of a named property on a mark or a mark type.
///
/// Records are immutable and shared. Declaring the same name again on the same mark replaces the
/// record; declarations on prototypes and type defaults stay reachable through delegation.
#[derive(Debug)]
pub struct Property {
    /// Property name.
    pub name: &'static str,
    /// Declaration id (see [`next_id`]).
    pub id: usize,
    /// Evaluation bucket.
    pub kind: PropertyKind,
    /// Declared value.
    pub value: PropertyValue,
    /// Optional provenance tag (for example `"default"` or `"anchor"`).
    pub tag: Option<&'static str>,
}

impl Property {
    /// Creates a constant record, applying `cast` to non-null values.
    pub fn constant(name: &'static str, value: Value, cast: Option<Cast>, def: bool) -> Self {
        let value = match cast {
            Some(cast) if !value.is_null() => cast(value),
            _ => value,
        };
        Self {
            name,
            id: next_id(),
            kind: if def {
                PropertyKind::DefConst
            } else {
                PropertyKind::Const
            },
            value: PropertyValue::Const(value),
            tag: None,
        }
    }

    /// Creates a function record. `cast` is applied to every non-null result.
    pub fn function<F, R>(name: &'static str, f: F, cast: Option<Cast>, def: bool) -> Self
    where
        F: Fn(&Ctx<'_>) -> R + 'static,
        R: IntoPropertyResult,
    {
        let func: Rc<PropFn> = match cast {
            Some(cast) => Rc::new(move |ctx: &Ctx<'_>| {
                let v = f(ctx).into_property_result()?;
                Ok(if v.is_null() { v } else { cast(v) })
            }),
            None => Rc::new(move |ctx: &Ctx<'_>| f(ctx).into_property_result()),
        };
        Self {
            name,
            id: next_id(),
            kind: if def {
                PropertyKind::DefFn
            } else {
                PropertyKind::Fn
            },
            value: PropertyValue::Function(func),
            tag: None,
        }
    }

    /// Attaches a provenance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Evaluates the record in `ctx`.
    pub fn eval(&self, ctx: &Ctx<'_>) -> Result<Value, PropertyError> {
        match &self.value {
            PropertyValue::Const(v) => Ok(v.clone()),
            PropertyValue::Function(f) => f(ctx),
        }
    }
}

/// Return types accepted from property functions.
///
/// Plain values are wrapped in `Ok`; `Result`s are passed through so functions can fail.
pub trait IntoPropertyResult {
    /// Converts into the evaluation result.
    fn into_property_result(self) -> Result<Value, PropertyError>;
}

macro_rules! impl_into_property_result {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoPropertyResult for $ty {
                fn into_property_result(self) -> Result<Value, PropertyError> {
                    Ok(self.into())
                }
            }

            impl IntoPropertyResult for Result<$ty, PropertyError> {
                fn into_property_result(self) -> Result<Value, PropertyError> {
                    self.map(Into::into)
                }
            }
        )*
    };
}

impl_into_property_result!(
    Value,
    f64,
    f32,
    i32,
    u32,
    usize,
    bool,
    &'static str,
    String,
    Color,
    Transform,
    Option<f64>,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_monotonically() {
        let a = Property::constant("left", Value::from(1.0), None, false);
        let b = Property::constant("left", Value::from(2.0), None, false);
        assert!(b.id > a.id, "later declarations must have larger ids");
    }

    #[test]
    fn constant_cast_skips_null() {
        let p = Property::constant("width", Value::Null, Some(crate::cast::number), false);
        assert!(matches!(p.value, PropertyValue::Const(Value::Null)));
        let p = Property::constant("width", Value::from("4"), Some(crate::cast::number), false);
        assert!(matches!(p.value, PropertyValue::Const(Value::Number(n)) if n == 4.0));
        assert_eq!(p.kind, PropertyKind::Const);
    }
}
