#![forbid(unsafe_code)]

//! The object graph the link engine works against.
//!
//! Applications are trees of reactive [`Component`]s. Rendering a tree into a
//! [`Document`] produces a parallel tree of renderer-native [`Model`]s, one per
//! component per rendering root. Plain [`Parameterized`] objects hold state without being
//! rendered, and [`Plot`]s stand in for figures produced by a plotting backend.
//!
//! Everything here is a narrow collaborator: the link engine only ever asks it for a
//! component's model under a root, a plot's named handles, a container's children and a
//! component type's rename and transform tables.

pub mod client;
pub mod component;
pub mod document;
mod error;
pub mod js;
pub mod model;
pub mod object;
pub mod params;
pub mod plot;
pub mod widgets;

pub use component::{Component, ComponentType, Domain, Role, WeakComponent};
pub use document::{Document, DocumentEvent, PatchMessage};
pub use error::ModelError;
pub use js::{CustomJs, JsArg, ScriptPlan};
pub use model::{Model, WeakModel};
pub use object::{ObjectId, ObjectRef, WeakObjectRef};
pub use params::{ParamEvent, Parameterized, WatcherId, WeakParameterized};
pub use plot::{Plot, WeakPlot};
pub use serde_json::{json, Value};
