#![forbid(unsafe_code)]

//! Static export of interactive applications.
//!
//! [`embed_state`] drives every widget of a rendered application through a sample of its
//! values, records the document diff each combination produces and packages the results
//! as a `State` root, so the exported page can replay them without a server.
//!
//! ```ignore
//! let root = app.render(&document)?;
//! process_callbacks(&ctx, &app, &root)?;
//! if let Some(artifact) = embed_state(&ctx, &app, &root, &document, &Samples::default())? {
//!     println!("recorded {} controls", artifact.values.len());
//! }
//! ```

pub mod controls;
pub mod convert;
mod error;
pub mod record;
pub mod save;
pub mod state;

pub use controls::{Control, Samples};
pub use error::EmbedError;
pub use record::StateTree;
pub use state::{StateArtifact, STATE_JS};

use pane_links::{LinkContext, Registry};
use pane_model::{Component, Document, Model};
use rustc_hash::FxHashSet;

/// Collects the widgets under `component` that can be driven, converting server-side links
/// to client-side ones where possible.
fn collect_controls(
    ctx: &LinkContext,
    component: &Component,
    root: &Model,
    samples: &Samples,
) -> Result<Vec<Control>, EmbedError> {
    let options = &ctx.config.embed;
    let pruned = Registry::prune();
    if pruned > 0 {
        tracing::debug!("pruned {pruned} stale link declaration(s)");
    }
    let widgets = component.select(|widget| {
        widget.domain().is_some()
            && widget.is_rendered(root.id())
            && !widget.is_disabled()
            && !Registry::contains(widget.id())
    });

    let mut ignored = FxHashSet::default();
    let mut remaining = Vec::new();
    for widget in widgets {
        match convert::links_to_jslinks(ctx, root, &widget) {
            Ok(Some(targets)) => {
                tracing::debug!(
                    "{} now links to {} target(s) on the client",
                    widget.name(),
                    targets.len()
                );
                ignored.insert(widget.id());
                ignored.extend(targets.iter().map(Component::id));
            }
            Ok(None) => remaining.push(widget),
            Err(error) => {
                tracing::warn!("could not convert the links of {}: {error}", widget.name());
                remaining.push(widget);
            }
        }
    }

    let mut sampled = Vec::new();
    for widget in remaining {
        if ignored.contains(&widget.id()) {
            continue;
        }
        match controls::sample_values(&widget, samples.get(&widget.id()), options.max_opts)? {
            Some(values) => sampled.push((widget, values)),
            None => tracing::warn!(
                "{} {:?} has no enumerable values and is not embedded",
                widget.type_name(),
                widget.name()
            ),
        }
    }

    let controls = controls::merge(sampled, root);
    for control in &controls {
        if let Err(error) = convert::wire_together(ctx, root, control) {
            tracing::warn!("could not link the widgets named {:?}: {error}", control.name);
        }
    }
    Ok(controls)
}

/// Explores the states of `component` rendered as `root` in `document`.
///
/// Returns `None` when there is nothing worth embedding: no drivable widgets, no
/// combination that changes the document, or too many states in a documentation build.
/// Widget values and queued document events are restored before returning, also when
/// exploration fails.
pub fn embed_state(
    ctx: &LinkContext,
    component: &Component,
    root: &Model,
    document: &Document,
    samples: &Samples,
) -> Result<Option<StateArtifact>, EmbedError> {
    let options = &ctx.config.embed;
    let _hold = document.hold();

    let controls = collect_controls(ctx, component, root, samples)?;
    if controls.is_empty() {
        return Ok(None);
    }

    let total = controls::state_count(&controls);
    if total > options.max_states {
        if ctx.config.doc_build {
            tracing::debug!("skipping {total} states in a documentation build");
            return Ok(None);
        }
        tracing::warn!(
            "The cross product of different application states is very large to explore \
             (N={total}), consider reducing the number of options on the widgets or \
             increase the max_states specified to remove this warning"
        );
    }

    let progress = record::progress_bar(total, options.progress);
    let baseline = document.replace_events(Vec::new());
    let explored = record::explore(document, &controls, &progress);
    for control in &controls {
        control.restore();
    }
    document.replace_events(baseline);
    progress.finish_and_clear();
    let explored = explored?;
    tracing::debug!("recorded {} states", explored.states);
    if !explored.changes {
        return Ok(None);
    }

    let state = if options.json {
        save::externalize(&explored.tree, controls.len(), options)?
    } else {
        explored.tree
    };
    let values = controls.iter().map(Control::initial).collect::<Vec<_>>();
    let widgets = controls
        .iter()
        .enumerate()
        .flat_map(|(index, control)| control.models.iter().map(move |model| (model.ref_id(), index)))
        .collect();
    let retired = state::retire_previous(document, &controls);
    if retired > 0 {
        tracing::debug!("replacing {retired} earlier state root(s)");
    }
    let model = state::state_model(options.json, &state, &values, &widgets);
    state::install_state_hooks(&model, &controls);
    document.add_root(&model);

    Ok(Some(StateArtifact {
        model,
        state,
        values,
        widgets,
    }))
}
