#![forbid(unsafe_code)]

//! Client-side links between components.
//!
//! A link is declared once, independent of any rendering, and registered in the
//! process-wide [`Registry`]. Each time a component tree is rendered under a root,
//! [`process_callbacks`] discovers the declarations whose endpoints are present under that
//! root and has a [`CallbackGenerator`] turn each of them into client-side scripts attached
//! to the root's models.
//!
//! ```ignore
//! let a = widgets::text_input("");
//! let b = widgets::text_input("");
//! a.jslink(&b).property("value", "value").bidirectional(true).register()?;
//!
//! let column = widgets::column([a, b]);
//! let root = column.render(&document)?;
//! process_callbacks(&LinkContext::default(), &column, &root)?;
//! ```

pub mod context;
pub mod datamodel;
pub mod declaration;
pub mod discovery;
mod error;
pub mod generator;
pub mod jslink;
pub mod registry;
pub mod resolve;
pub mod spec;
pub mod transform;

pub use context::{GeneratorTable, LinkContext};
pub use datamodel::create_linked_datamodel;
pub use declaration::{Arg, Declaration, DeclarationBuilder, DeclarationId, DeclarationKind};
pub use discovery::{discover, linkable, process_callbacks, Attachment};
pub use error::{LinkError, ResolutionError};
pub use generator::{
    CallbackGenerator, JsCallbackGenerator, JsLinkCallbackGenerator, LinkTriple, Script,
    SpecEntry,
};
pub use jslink::{JsCallback, JsLink, JsLinkExt};
pub use registry::Registry;
pub use resolve::resolve_model;
pub use spec::PropertySpec;
pub use transform::{transform, Side, Transform};
