use crate::model::{Model, WeakModel};
use indexmap::IndexMap;
use serde_json::Value;

/// An entry in a script's reference dictionary.
///
/// Models are held weakly: a script lives in the callback list of one model and
/// frequently references that same model, so a strong handle would form a cycle.
#[derive(Clone, Debug)]
pub enum JsArg {
    Model(WeakModel),
    Value(Value),
}

impl JsArg {
    pub fn model(model: &Model) -> Self {
        JsArg::Model(model.downgrade())
    }

    /// The referenced model, if this is a model argument that is still alive.
    pub fn as_model(&self) -> Option<Model> {
        match self {
            JsArg::Model(model) => model.upgrade(),
            JsArg::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            JsArg::Value(value) => Some(value),
            JsArg::Model(_) => None,
        }
    }
}

impl From<&Model> for JsArg {
    fn from(value: &Model) -> Self {
        JsArg::model(value)
    }
}

impl From<Value> for JsArg {
    fn from(value: Value) -> Self {
        JsArg::Value(value)
    }
}

/// What a generated script does, in a form the mock client can execute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptPlan {
    /// Arbitrary code. The mock client does not run it.
    Opaque,
    /// Copy `source[source_attr]` (or `true` for an event) onto `target[target_attr]`.
    /// Only identity pipelines can be replayed.
    Assign {
        source_attr: Option<String>,
        target_attr: String,
        identity: bool,
    },
    /// Toggle the loading classes on the target's `css_classes`.
    Loading {
        source_attr: Option<String>,
        spinner: String,
    },
}

/// A generated client-side script together with the models it references.
#[derive(Clone, Debug)]
pub struct CustomJs {
    pub args: IndexMap<String, JsArg>,
    pub code: String,
    pub tags: Vec<String>,
    pub plan: ScriptPlan,
}

impl CustomJs {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            args: IndexMap::new(),
            code: code.into(),
            tags: Vec::new(),
            plan: ScriptPlan::Opaque,
        }
    }

    pub fn with_args(mut self, args: IndexMap<String, JsArg>) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg(mut self, name: impl Into<String>, arg: impl Into<JsArg>) -> Self {
        self.args.insert(name.into(), arg.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_plan(mut self, plan: ScriptPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Looks up a model argument by name.
    pub fn arg_model(&self, name: &str) -> Option<Model> {
        self.args.get(name).and_then(JsArg::as_model)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
