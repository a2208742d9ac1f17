use thiserror::Error;

/// Errors raised by the model layer when a property or parameter cannot be set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{model} model has no property {property:?}")]
    UnknownProperty { model: String, property: String },
    #[error("{owner} has no parameter {name:?}")]
    UnknownParameter { owner: String, name: String },
    #[error("{owner}.{name} rejected value {value}: {reason}")]
    InvalidValue {
        owner: String,
        name: String,
        value: String,
        reason: String,
    },
}
