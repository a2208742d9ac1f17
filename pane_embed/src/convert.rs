//! Replacing server-side links with client-side ones so they survive in a static export.

use crate::{controls::Control, error::EmbedError};
use pane_links::{
    DeclarationBuilder, DeclarationId, DeclarationKind, LinkContext, LinkError, LinkTriple,
};
use pane_model::{Component, Model, ObjectRef, WatcherId};
use rustc_hash::FxHashSet;

/// Generates the client-side scripts of a link that is never registered, returning the
/// id its scripts are tagged with and how many were attached.
fn realize(
    ctx: &LinkContext,
    root: &Model,
    source: &Component,
    target: &Component,
    source_param: &str,
    target_param: &str,
) -> Result<(DeclarationId, usize), LinkError> {
    let declaration = DeclarationBuilder::link(source, target)
        .property(source_param, target_param)
        .bidirectional(true)
        .build()?;
    let id = declaration.id();
    let generator = ctx.generators.get(DeclarationKind::Link).ok_or_else(|| {
        LinkError::Configuration("no generator is registered for Link".to_string())
    })?;
    let triple = LinkTriple {
        declaration,
        source: ObjectRef::from(source),
        target: Some(ObjectRef::from(target)),
    };
    let attached = generator.generate(ctx, root, &triple)?;
    Ok((id, attached))
}

/// Detaches every script generated for `declarations` anywhere under `root`.
fn rollback(root: &Model, declarations: &[DeclarationId]) {
    let prefixes: Vec<String> = declarations.iter().map(|id| format!("{id}:")).collect();
    let removed: usize = root
        .descendants()
        .iter()
        .map(|model| {
            model.remove_callbacks(|callback| {
                callback
                    .tags
                    .iter()
                    .any(|tag| prefixes.iter().any(|prefix| tag.starts_with(prefix)))
            })
        })
        .sum();
    tracing::debug!("rolled back {removed} script(s) of a partial conversion");
}

fn has_external_watchers(component: &Component, except: &FxHashSet<WatcherId>) -> bool {
    let params = component.params();
    params.names().iter().any(|name| {
        params
            .external_watchers(name)
            .iter()
            .any(|watcher| !except.contains(watcher))
    })
}

fn convertible(
    root: &Model,
    source: &Component,
    source_param: &str,
    target: &Component,
    target_param: &str,
) -> bool {
    source.is_rendered(root.id())
        && target.is_rendered(root.id())
        && source.property_for(source_param).is_some()
        && target.property_for(target_param).is_some()
        && !matches!(source.ty().source_transform(source_param), Some(None))
        && !matches!(target.ty().target_transform(target_param), Some(None))
}

/// Converts every server-side link of `widget` into a bidirectional client-side link.
///
/// Either all links convert or none do. Returns the link targets on success and `None`
/// when the widget has to keep its server-side behavior, in which case any script
/// generated along the way is detached again.
pub fn links_to_jslinks(
    ctx: &LinkContext,
    root: &Model,
    widget: &Component,
) -> Result<Option<Vec<Component>>, EmbedError> {
    let links = widget.links();
    if links.is_empty() {
        return Ok(None);
    }
    let link_watchers: FxHashSet<WatcherId> = links.iter().map(|link| link.watcher).collect();
    if has_external_watchers(widget, &link_watchers) {
        return Ok(None);
    }

    let mut plan = Vec::new();
    for link in &links {
        let Some(target) = link.target.upgrade() else {
            return Ok(None);
        };
        if link.transformed {
            return Ok(None);
        }
        if target.domain().is_none() && has_external_watchers(&target, &FxHashSet::default())
        {
            return Ok(None);
        }
        for (source_param, target_param) in &link.mapping {
            if !convertible(root, widget, source_param, &target, target_param) {
                return Ok(None);
            }
            plan.push((target.clone(), source_param.clone(), target_param.clone()));
        }
    }

    let mut realized = Vec::with_capacity(plan.len());
    for (target, source_param, target_param) in &plan {
        match realize(ctx, root, widget, target, source_param, target_param) {
            Ok((id, attached)) => {
                realized.push(id);
                if attached == 0 {
                    tracing::debug!(
                        "{source_param} of {} could not be linked on the client",
                        widget.type_name()
                    );
                    rollback(root, &realized);
                    return Ok(None);
                }
            }
            Err(error) => {
                rollback(root, &realized);
                return Err(error.into());
            }
        }
    }

    let mut targets: Vec<Component> = Vec::new();
    for (target, source_param, _) in plan {
        widget.params().trigger(&source_param)?;
        if !targets.iter().any(|known| known.id() == target.id()) {
            targets.push(target);
        }
    }
    Ok(Some(targets))
}

/// Keeps the models of a merged control in sync on the client.
pub fn wire_together(
    ctx: &LinkContext,
    root: &Model,
    control: &Control,
) -> Result<(), EmbedError> {
    let Some((first, rest)) = control.widgets.split_first() else {
        return Ok(());
    };
    for other in rest {
        let (_, attached) = realize(ctx, root, first, other, "value", "value")?;
        if attached == 0 {
            tracing::warn!(
                "{} and {} are not kept in sync",
                first.type_name(),
                other.type_name()
            );
        }
    }
    Ok(())
}
