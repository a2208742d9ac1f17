use crate::{controls::Control, record::StateTree};
use indexmap::IndexMap;
use pane_links::generator::templates::render;
use pane_model::{CustomJs, Document, Model, Value};
use serde_json::json;

/// Looks up the state root by id and hands it the new widget value.
pub const STATE_JS: &str = r#"
var state = null
for (var root of cb_obj.document.roots()) {
  if (root.id == '{id}') {
    state = root;
    break;
  }
}
if (!state) { return; }
state.set_state(cb_obj, {js_getter})
"#;

/// Tag prefix of the state hooks, followed by the reference of the state root they feed.
pub const STATE_TAG: &str = "pane-state:";

/// The result of exploring an application's states.
#[derive(Clone, Debug)]
pub struct StateArtifact {
    /// The root model shipped to the client.
    pub model: Model,
    /// Patches (or paths to them) nested by control value labels.
    pub state: StateTree,
    /// Initial value of each control, in exploration order.
    pub values: Vec<Value>,
    /// Widget model reference to control index.
    pub widgets: IndexMap<String, usize>,
}

pub fn state_model(
    json: bool,
    state: &StateTree,
    values: &[Value],
    widgets: &IndexMap<String, usize>,
) -> Model {
    Model::new("State")
        .with_property("json", json!(json))
        .with_property("state", Value::Object(state.clone()))
        .with_property("values", Value::Array(values.to_vec()))
        .with_property(
            "widgets",
            Value::Object(
                widgets
                    .iter()
                    .map(|(reference, index)| (reference.clone(), json!(index)))
                    .collect(),
            ),
        )
}

/// Detaches the state hooks of an earlier exploration from the control models and
/// removes the state roots they fed from `document`, returning how many roots went.
pub fn retire_previous(document: &Document, controls: &[Control]) -> usize {
    let is_hook = |callback: &CustomJs| {
        callback.tags.iter().any(|tag| tag.starts_with(STATE_TAG))
    };
    let mut previous: Vec<String> = Vec::new();
    for model in controls.iter().flat_map(|control| &control.models) {
        for callbacks in model.js_property_callbacks().values() {
            let tags = callbacks.iter().flat_map(|callback| &callback.tags);
            for reference in tags.filter_map(|tag| tag.strip_prefix(STATE_TAG)) {
                if !previous.iter().any(|known| known == reference) {
                    previous.push(reference.to_string());
                }
            }
        }
        model.remove_callbacks(is_hook);
    }
    document
        .roots()
        .iter()
        .filter(|root| previous.contains(&root.ref_id()))
        .filter(|root| document.remove_root(root))
        .count()
}

/// Attaches [`STATE_JS`] to the value property of every control model.
pub fn install_state_hooks(state: &Model, controls: &[Control]) {
    let id = state.ref_id();
    let tag = format!("{STATE_TAG}{id}");
    for control in controls {
        let getter = format!("cb_obj.{}", control.property);
        let code = render(
            STATE_JS,
            &[("id", id.as_str()), ("js_getter", getter.as_str())],
        );
        for model in &control.models {
            model.js_on_change(
                &control.property,
                CustomJs::new(code.clone()).with_tag(tag.clone()),
            );
        }
    }
}
