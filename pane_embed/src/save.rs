//! Writing the leaves of a state tree to individual JSON files.

use crate::{error::EmbedError, record::StateTree};
use pane_config::EmbedOptions;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::{fs, path::Path};
use uuid::Uuid;

fn io_error(path: &Path, error: std::io::Error) -> EmbedError {
    EmbedError::Io {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}

/// Characters kept as-is when a label becomes part of a filename. `_` joins labels, so it
/// is escaped inside them.
const LABEL: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.');
const URL_SEGMENT: &AsciiSet = &LABEL.remove(b'_');

fn filename(key: &[String]) -> String {
    let labels: Vec<String> = key
        .iter()
        .map(|label| utf8_percent_encode(label, LABEL).to_string())
        .collect();
    format!("{}.json", labels.join("_"))
}

fn save_level(
    tree: &StateTree,
    depth: usize,
    leaf_depth: usize,
    key: &mut Vec<String>,
    save_dir: &Path,
    load_dir: Option<&str>,
) -> Result<StateTree, EmbedError> {
    let mut saved = StateTree::new();
    for (label, value) in tree {
        key.push(label.clone());
        let entry = if depth < leaf_depth {
            let Value::Object(child) = value else {
                return Err(EmbedError::Serialize(format!(
                    "expected a nested state under {:?}",
                    key.join("_")
                )));
            };
            Value::Object(save_level(child, depth + 1, leaf_depth, key, save_dir, load_dir)?)
        } else {
            let filename = filename(key);
            let path = save_dir.join(&filename);
            fs::write(&path, serde_json::to_vec(value)?).map_err(|e| io_error(&path, e))?;
            Value::String(match load_dir {
                Some(load_dir) => {
                    format!("{load_dir}/{}", utf8_percent_encode(&filename, URL_SEGMENT))
                }
                None => path.display().to_string(),
            })
        };
        key.pop();
        saved.insert(label.clone(), entry);
    }
    Ok(saved)
}

/// Writes each leaf of `tree` to its own file in a fresh directory under the configured
/// save path and returns the tree with leaves replaced by the paths the client should
/// fetch them from.
///
/// `levels` is the depth of the tree, one level per control.
pub fn externalize(
    tree: &StateTree,
    levels: usize,
    options: &EmbedOptions,
) -> Result<StateTree, EmbedError> {
    let dir = format!("{}_{}", options.json_prefix, Uuid::new_v4().simple());
    let save_dir = options.save_path.join(&dir);
    fs::create_dir_all(&save_dir).map_err(|e| io_error(&save_dir, e))?;
    let load_dir = options
        .load_path
        .as_deref()
        .map(|load| format!("{}/{dir}", load.trim_end_matches('/')));
    tracing::debug!("saving {} states to {}", tree.len(), save_dir.display());
    save_level(
        tree,
        0,
        levels.saturating_sub(1),
        &mut Vec::with_capacity(levels),
        &save_dir,
        load_dir.as_deref(),
    )
}
