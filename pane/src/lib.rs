#![forbid(unsafe_code)]

//! Reactive dashboard components whose links keep working in the browser.
//!
//! Components are linked once with [`jslink`](links::JsLinkExt::jslink) or
//! [`jscallback`](links::JsLinkExt::jscallback). Every [`render`] of a component tree
//! attaches the client-side scripts for the links whose endpoints are present under the
//! new root, and [`render_static`] additionally records the states reachable through the
//! tree's widgets so the page can be exported without a server.
//!
//! ```ignore
//! use pane::prelude::*;
//!
//! let a = widgets::text_input("");
//! let b = widgets::text_input("");
//! a.jslink(&b).property("value", "value").bidirectional(true).register()?;
//!
//! let document = Document::new();
//! let rendered = render(&LinkContext::default(), &widgets::column([a, b]), &document)?;
//! ```

mod error;
mod render;

pub use error::PaneError;
pub use pane_config as config;
pub use pane_embed as embed;
pub use pane_links as links;
pub use pane_model as model;
pub use render::{render, render_static, teardown, Rendered};

pub mod prelude {
    pub use crate::{render, render_static, teardown, PaneError, Rendered};
    pub use pane_config::{EmbedOptions, PaneConfig};
    pub use pane_embed::{embed_state, EmbedError, Samples, StateArtifact};
    pub use pane_links::{
        Arg, DeclarationBuilder, DeclarationKind, JsLinkExt, LinkContext, LinkError,
        Registry,
    };
    pub use pane_model::{
        client, json, widgets, Component, Document, Model, Parameterized, Value,
    };
}
