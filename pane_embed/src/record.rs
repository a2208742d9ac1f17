//! Driving every combination of control values and recording the resulting diffs.

use crate::{
    controls::{label, Control},
    error::EmbedError,
};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use pane_model::{Document, Model, ObjectId, Value};
use rustc_hash::FxHashSet;
use serde_json::Map;

/// Nested state tree: one level per control, patches at the leaves.
pub type StateTree = Map<String, Value>;

#[derive(Debug, Default)]
pub struct Exploration {
    pub tree: StateTree,
    /// Whether any combination produced a non-empty diff.
    pub changes: bool,
    pub states: usize,
}

pub fn progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "Rendering states {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    ) {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

fn insert(tree: &mut StateTree, path: &[String], leaf: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut node = tree;
    for key in parents {
        let child = node
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        let Value::Object(child) = child else {
            return;
        };
        node = child;
    }
    node.insert(last.clone(), leaf);
}

/// Sets every combination of control values, domains walked in reverse, and records the
/// diff each one produces.
///
/// Events originating from the driven models themselves are dropped before diffing. The
/// caller is responsible for restoring the controls afterwards, also on error.
pub fn explore(
    document: &Document,
    controls: &[Control],
    progress: &ProgressBar,
) -> Result<Exploration, EmbedError> {
    let driven: FxHashSet<ObjectId> = controls
        .iter()
        .flat_map(|control| control.models.iter().map(Model::id))
        .collect();
    let mut exploration = Exploration::default();

    let combinations = controls
        .iter()
        .map(|control| control.values.iter().rev().cloned().collect::<Vec<_>>())
        .multi_cartesian_product();
    for combination in combinations {
        let mut path = Vec::with_capacity(combination.len());
        for (control, value) in controls.iter().zip(&combination) {
            for widget in &control.widgets {
                widget.set("value", value.clone()).map_err(|error| {
                    EmbedError::Validation(format!(
                        "could not set {} to {value}: {error}",
                        control.name
                    ))
                })?;
            }
            path.push(label(value));
        }
        document.retain_events(|event| !driven.contains(&event.model_id()));
        let patch = document.diff()?;
        exploration.changes |= !patch.is_empty();
        insert(&mut exploration.tree, &path, serde_json::to_value(&patch)?);
        exploration.states += 1;
        progress.inc(1);
    }
    Ok(exploration)
}
