//! The root-level discovery pass: finding every registered declaration whose endpoints are
//! rendered under a root and realizing it there.

use crate::{
    context::LinkContext,
    declaration::Declaration,
    error::LinkError,
    generator::LinkTriple,
    registry::Registry,
    resolve::is_rendered_under,
};
use pane_model::{Component, Model, ObjectId, ObjectRef};
use rustc_hash::FxHashSet;

/// A declaration that was wired under a root.
#[derive(Clone, Debug)]
pub struct Attachment {
    pub declaration: Declaration,
    pub source: ObjectRef,
    pub target: Option<ObjectRef>,
    pub root: ObjectId,
    /// Number of scripts attached, counting the mirror script of a bidirectional link.
    pub scripts: usize,
}

/// Wires every registered declaration between the `visible` objects under `root`.
///
/// Declarations are processed per source in registration order. A failing triple is
/// logged and skipped unless `ctx` is in strict mode. Running discovery again on the same
/// root attaches nothing new.
pub fn discover(
    ctx: &LinkContext,
    root: &Model,
    visible: &[ObjectRef],
) -> Result<Vec<Attachment>, LinkError> {
    let mut ids = FxHashSet::default();
    let sources: Vec<&ObjectRef> = visible
        .iter()
        .filter(|object| ids.insert(object.id()))
        .collect();

    let mut triples = Vec::new();
    for source in sources {
        for declaration in Registry::registered(source) {
            let target = declaration.target();
            if declaration.requires_target() {
                let Some(target) = &target else {
                    tracing::trace!("{declaration:?} lost its target");
                    continue;
                };
                if !ids.contains(&target.id()) && !target.is_params() {
                    continue;
                }
            }
            triples.push(LinkTriple {
                declaration,
                source: source.clone(),
                target,
            });
        }
    }

    let mut attachments = Vec::new();
    for triple in triples {
        let target_present = !triple.declaration.requires_target()
            || triple
                .target
                .as_ref()
                .is_some_and(|target| is_rendered_under(root, target));
        if !is_rendered_under(root, &triple.source) || !target_present {
            tracing::trace!(
                "{:?} is not rendered under {}",
                triple.declaration,
                root.ref_id()
            );
            continue;
        }

        let kind = triple.declaration.kind();
        let Some(generator) = ctx.generators.get(kind) else {
            let error =
                LinkError::Configuration(format!("no callback generator is registered for {kind}"));
            if ctx.config.strict {
                return Err(error);
            }
            tracing::warn!("{error}");
            continue;
        };

        match generator.generate(ctx, root, &triple) {
            Ok(0) => {}
            Ok(scripts) => attachments.push(Attachment {
                declaration: triple.declaration,
                source: triple.source,
                target: triple.target,
                root: root.id(),
                scripts,
            }),
            Err(error) if ctx.config.strict => return Err(error),
            Err(error) => {
                tracing::warn!(
                    "failed to generate {} from {}: {error}",
                    kind,
                    triple.source.type_name()
                );
            }
        }
    }
    Ok(attachments)
}

/// Every object that may take part in a link under `root`: the components of the tree, the
/// models rendered under the root and the plots rendered by plot panes.
pub fn linkable(component: &Component, root: &Model) -> Vec<ObjectRef> {
    let components = component.descendants();
    let plots: Vec<ObjectRef> = components
        .iter()
        .filter_map(|component| component.plot(root.id()))
        .map(ObjectRef::from)
        .collect();
    components
        .into_iter()
        .map(ObjectRef::from)
        .chain(root.descendants().into_iter().map(ObjectRef::from))
        .chain(plots)
        .collect()
}

/// Runs discovery for the tree of `component` rendered as `root`, holding the root's
/// document for the duration so the changes land in one consistent diff.
pub fn process_callbacks(
    ctx: &LinkContext,
    component: &Component,
    root: &Model,
) -> Result<Vec<Attachment>, LinkError> {
    let visible = linkable(component, root);
    match root.document() {
        Some(document) => {
            let _hold = document.hold();
            discover(ctx, root, &visible)
        }
        None => discover(ctx, root, &visible),
    }
}
