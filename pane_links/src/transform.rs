//! Value transforms applied when a property's client representation differs from its
//! semantic value.

use pane_model::{ObjectRef, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Applied to a value read from the source, before it leaves the source.
    Source,
    /// Applied to a value on its way into the target.
    Target,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transform {
    Identity,
    /// A client-side expression of `value`.
    Expression(String),
    /// The property cannot be represented without the server.
    Refused,
}

impl Transform {
    /// The expression to splice into generated code, or `None` for a refusal.
    pub fn expression(&self) -> Option<&str> {
        match self {
            Transform::Identity => Some("value"),
            Transform::Expression(expression) => Some(expression.as_str()),
            Transform::Refused => None,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }

    /// Applies the transform to a value pushed from the server. Expressions without a
    /// server-side counterpart leave the value alone.
    pub fn apply(&self, value: Value) -> Value {
        match self {
            Transform::Expression(expression) if expression == "String(value)" => {
                Value::String(js_string(&value))
            }
            _ => value,
        }
    }
}

/// `String(value)` as the browser evaluates it.
fn js_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e21 => {
                format!("{float:.0}")
            }
            _ => number.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                item => js_string(item),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Looks up the transform for `property` on `object`.
///
/// Tables are keyed by semantic parameter names, so a renamed model property is mapped
/// back to its parameter first. Only reactive components carry transforms.
pub fn transform(object: &ObjectRef, property: &str, side: Side) -> Transform {
    let ObjectRef::Component(component) = object else {
        return Transform::Identity;
    };
    let param = if component.params().contains(property) {
        property
    } else {
        component.param_for(property).unwrap_or(property)
    };
    let ty = component.ty();
    let entry = match side {
        Side::Source => ty.source_transform(param),
        Side::Target => ty.target_transform(param),
    };
    match entry {
        None => Transform::Identity,
        Some(None) => Transform::Refused,
        Some(Some(expression)) => Transform::Expression(expression.to_string()),
    }
}
