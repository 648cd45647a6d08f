// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property casts.
//!
//! A cast normalizes a non-null value when a property is set (constants) or evaluated
//! (functions). [`Value::Null`] never reaches a cast.

use alloc::string::ToString;

use crate::value::Value;

/// Signature of a property cast.
pub type Cast = fn(Value) -> Value;

/// Coerces to a number. Booleans map to `0`/`1`, numeric strings are parsed, anything else is
/// `NaN`.
pub fn number(v: Value) -> Value {
    let n = match &v {
        Value::Number(n) => *n,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Text(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    };
    Value::Number(n)
}

/// Coerces to a boolean using [`Value::truthy`].
pub fn boolean(v: Value) -> Value {
    Value::Bool(v.truthy())
}

/// Coerces to a string using the value's display form.
pub fn text(v: Value) -> Value {
    match v {
        Value::Text(_) => v,
        other => Value::Text(other.to_string().into()),
    }
}

/// Keeps colors; anything else is left untouched for the renderer to interpret.
///
/// Color string parsing is out of scope, so a string stays a string.
pub fn color(v: Value) -> Value {
    v
}

/// Keeps transforms; a bare number becomes a pure scale.
pub fn transform(v: Value) -> Value {
    match v {
        Value::Number(k) => Value::Transform(crate::Transform::scale(k)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_cast_coerces() {
        assert_eq!(number(Value::from("  12.5 ")), Value::Number(12.5));
        assert_eq!(number(Value::from(true)), Value::Number(1.0));
        assert!(number(Value::from("abc")).as_f64().is_some_and(f64::is_nan));
    }

    #[test]
    fn boolean_and_text_casts() {
        assert_eq!(boolean(Value::from(0.0)), Value::Bool(false));
        assert_eq!(boolean(Value::from("x")), Value::Bool(true));
        assert_eq!(text(Value::from(3.0)), Value::from("3"));
    }
}
