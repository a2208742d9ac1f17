//! A mock client for testing.
//!
//! It applies changes the way a browser session would (user input first, then the
//! attached scripts) without running any JavaScript. Only scripts with an executable
//! [`ScriptPlan`] are replayed; everything else is skipped.

use crate::{
    error::ModelError,
    js::{CustomJs, ScriptPlan},
    model::Model,
};
use serde_json::Value;

/// Applies a user edit of `name` on `model` and runs the change hooks it triggers.
pub fn set_property(model: &Model, name: &str, value: Value) -> Result<(), ModelError> {
    if model.set_from_client(name, value)? {
        for callback in model.property_callbacks(name) {
            run(&callback);
        }
    }
    Ok(())
}

/// Fires the client event `event` on `model`.
pub fn trigger_event(model: &Model, event: &str) {
    for callback in model.event_callbacks(event) {
        run(&callback);
    }
}

/// Executes one script. Failures are reported the way the generated code reports them:
/// on the console, never to the caller.
pub fn run(callback: &CustomJs) {
    let (source, target) = (callback.arg_model("source"), callback.arg_model("target"));
    match &callback.plan {
        ScriptPlan::Opaque => {
            tracing::trace!("client skipped opaque script");
        }
        ScriptPlan::Assign {
            identity: false, ..
        } => {
            tracing::trace!("client skipped transformed script");
        }
        ScriptPlan::Assign {
            source_attr,
            target_attr,
            identity: true,
        } => {
            let (Some(source), Some(target)) = (source, target) else {
                return;
            };
            let value = match source_attr {
                Some(attr) => source.get(attr).unwrap_or(Value::Null),
                None => Value::Bool(true),
            };
            if !target.has_property(target_attr) {
                tracing::warn!(
                    "WARNING: Could not set {target_attr} on target, raised error: \
                     {} has no property {target_attr}",
                    target.type_name()
                );
                return;
            }
            if let Err(error) = set_property(&target, target_attr, value) {
                tracing::warn!("{error}");
            }
        }
        ScriptPlan::Loading {
            source_attr,
            spinner,
        } => {
            let (Some(source), Some(target)) = (source, target) else {
                return;
            };
            let loading = source_attr
                .as_deref()
                .and_then(|attr| source.get(attr))
                .and_then(|value| value.as_bool())
                .unwrap_or(true);
            let mut classes: Vec<Value> = target
                .get("css_classes")
                .and_then(|classes| classes.as_array().cloned())
                .unwrap_or_default();
            let marker = Value::from("pn-loading");
            let spinner = Value::from(spinner.as_str());
            if loading && !classes.contains(&marker) {
                classes.push(marker);
                classes.push(spinner);
            } else if !loading && classes.contains(&marker) {
                classes.retain(|class| *class != marker && *class != spinner);
            }
            if let Err(error) = set_property(&target, "css_classes", Value::Array(classes)) {
                tracing::warn!("{error}");
            }
        }
    }
}
