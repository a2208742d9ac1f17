use crate::error::PaneError;
use pane_embed::{embed_state, Samples, StateArtifact};
use pane_links::{process_callbacks, Attachment, LinkContext, Registry};
use pane_model::{Component, Document, Model};

/// A component tree rendered as a document root.
#[derive(Clone, Debug)]
pub struct Rendered {
    pub root: Model,
    /// The client-side links attached while rendering.
    pub attachments: Vec<Attachment>,
}

/// Renders `component` as a new root of `document` and attaches every registered link
/// whose endpoints ended up under it.
pub fn render(
    ctx: &LinkContext,
    component: &Component,
    document: &Document,
) -> Result<Rendered, PaneError> {
    let root = component.render(document)?;
    let attachments = process_callbacks(ctx, component, &root)?;
    tracing::debug!(
        "rendered {} as {} with {} link(s)",
        component.type_name(),
        root.ref_id(),
        attachments.len()
    );
    Ok(Rendered { root, attachments })
}

/// Renders `component` for a page without a server: links are attached as in [`render`],
/// then the reachable widget states are recorded.
pub fn render_static(
    ctx: &LinkContext,
    component: &Component,
    document: &Document,
    samples: &Samples,
) -> Result<(Rendered, Option<StateArtifact>), PaneError> {
    let rendered = render(ctx, component, document)?;
    let state = embed_state(ctx, component, &rendered.root, document, samples)?;
    Ok((rendered, state))
}

/// Tears down `component`: forgets its rendered models under every root and drops every
/// link declaration it or its descendants take part in, returning how many were dropped.
pub fn teardown(component: &Component) -> usize {
    for root in component.models().keys() {
        component.cleanup(*root);
    }
    let released: usize = component
        .descendants()
        .iter()
        .map(|descendant| Registry::release(descendant.id()))
        .sum();
    tracing::debug!(
        "tore down {} and {released} link declaration(s)",
        component.type_name()
    );
    released
}
