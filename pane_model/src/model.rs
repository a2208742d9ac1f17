use crate::{
    document::{Document, DocumentEvent, ModelRef, WeakDocument},
    error::ModelError,
    js::CustomJs,
    object::ObjectId,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::{
    fmt,
    sync::{Arc, Weak},
};

/// A server-side observer of property changes on a [`Model`].
pub type ChangeListener = Arc<dyn Fn(&Model, &str, &Value) + Send + Sync>;

/// A renderer-native visual model.
///
/// Cloning a `Model` yields another handle to the same model.
#[derive(Clone)]
pub struct Model(Arc<ModelInner>);

struct ModelInner {
    id: ObjectId,
    type_name: String,
    state: RwLock<ModelState>,
}

#[derive(Default)]
struct ModelState {
    properties: IndexMap<String, Value>,
    handles: IndexMap<String, Model>,
    children: Vec<Model>,
    js_property_callbacks: IndexMap<String, Vec<CustomJs>>,
    js_event_callbacks: IndexMap<String, Vec<CustomJs>>,
    listeners: Vec<ChangeListener>,
    references: Vec<Model>,
    document: Option<WeakDocument>,
    cleanups: Vec<Box<dyn FnOnce() + Send + Sync>>,
}

impl Drop for ModelInner {
    fn drop(&mut self) {
        for cleanup in std::mem::take(&mut self.state.get_mut().cleanups) {
            cleanup();
        }
    }
}

impl Model {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self(Arc::new(ModelInner {
            id: ObjectId::next(),
            type_name: type_name.into(),
            state: RwLock::new(ModelState::default()),
        }))
    }

    /// Declares a property with its initial value. Does not notify anyone.
    pub fn with_property(self, name: impl Into<String>, value: Value) -> Self {
        self.0.state.write().properties.insert(name.into(), value);
        self
    }

    pub fn with_handle(self, name: impl Into<String>, model: &Model) -> Self {
        self.set_handle(name, model);
        self
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    /// The identifier the client uses to refer to this model.
    pub fn ref_id(&self) -> String {
        format!("p{}", self.0.id)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.state.read().properties.get(name).cloned()
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.0.state.read().properties.contains_key(name)
    }

    pub fn properties(&self) -> IndexMap<String, Value> {
        self.0.state.read().properties.clone()
    }

    /// Sets a property from the server side.
    ///
    /// Returns `Ok(false)` without notifying anyone if the value is unchanged. Otherwise the
    /// change is queued on the owning document and every listener is called.
    pub fn set(&self, name: &str, value: Value) -> Result<bool, ModelError> {
        self.apply(name, value, true)
    }

    /// Sets a property as if the change came from the client: listeners run, but nothing
    /// is queued for the document because the client already has the new value.
    pub(crate) fn set_from_client(
        &self,
        name: &str,
        value: Value,
    ) -> Result<bool, ModelError> {
        self.apply(name, value, false)
    }

    fn apply(
        &self,
        name: &str,
        value: Value,
        queue_event: bool,
    ) -> Result<bool, ModelError> {
        let (listeners, document) = {
            let mut state = self.0.state.write();
            let Some(slot) = state.properties.get_mut(name) else {
                return Err(ModelError::UnknownProperty {
                    model: self.0.type_name.clone(),
                    property: name.to_string(),
                });
            };
            if *slot == value {
                return Ok(false);
            }
            *slot = value.clone();
            (
                state.listeners.clone(),
                state.document.as_ref().and_then(WeakDocument::upgrade),
            )
        };

        if queue_event {
            if let Some(document) = document {
                document.push_event(DocumentEvent::ModelChanged {
                    model: ModelRef(self.id()),
                    attr: name.to_string(),
                    new: value.clone(),
                });
            }
        }
        for listener in listeners {
            listener(self, name, &value);
        }
        Ok(true)
    }

    /// Registers a server-side observer called after every effective property change.
    pub fn on_change(
        &self,
        listener: impl Fn(&Model, &str, &Value) + Send + Sync + 'static,
    ) {
        self.0.state.write().listeners.push(Arc::new(listener));
    }

    /// Registers a function to run when the last handle to this model is dropped.
    pub fn on_cleanup(&self, cleanup: impl FnOnce() + Send + Sync + 'static) {
        self.0.state.write().cleanups.push(Box::new(cleanup));
    }

    pub fn handle(&self, name: &str) -> Option<Model> {
        self.0.state.read().handles.get(name).cloned()
    }

    pub fn handles(&self) -> IndexMap<String, Model> {
        self.0.state.read().handles.clone()
    }

    /// Adds a named sub-model reachable through dotted property paths.
    pub fn set_handle(&self, name: impl Into<String>, model: &Model) {
        self.0.state.write().handles.insert(name.into(), model.clone());
        if let Some(document) = self.document() {
            model.attach_document(&document);
        }
    }

    pub fn add_child(&self, child: &Model) {
        self.0.state.write().children.push(child.clone());
        if let Some(document) = self.document() {
            child.attach_document(&document);
        }
    }

    pub fn children(&self) -> Vec<Model> {
        self.0.state.read().children.clone()
    }

    /// Keeps another model alive for as long as this one lives, and shares this model's
    /// document with it.
    pub fn retain(&self, model: &Model) {
        self.0.state.write().references.push(model.clone());
        if let Some(document) = self.document() {
            model.attach_document(&document);
        }
    }

    pub fn references(&self) -> Vec<Model> {
        self.0.state.read().references.clone()
    }

    /// This model followed by every model reachable through handles and children,
    /// depth first, each listed once.
    pub fn descendants(&self) -> Vec<Model> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect(&mut out, &mut seen, false);
        out
    }

    pub fn select(&self, predicate: impl Fn(&Model) -> bool) -> Vec<Model> {
        self.descendants()
            .into_iter()
            .filter(|model| predicate(model))
            .collect()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.descendants().iter().any(|model| model.id() == id)
    }

    fn collect(
        &self,
        out: &mut Vec<Model>,
        seen: &mut FxHashSet<ObjectId>,
        with_references: bool,
    ) {
        if !seen.insert(self.id()) {
            return;
        }
        out.push(self.clone());
        let next = {
            let state = self.0.state.read();
            let mut next: Vec<Model> = state.handles.values().cloned().collect();
            next.extend(state.children.iter().cloned());
            if with_references {
                next.extend(state.references.iter().cloned());
            }
            next
        };
        for model in next {
            model.collect(out, seen, with_references);
        }
    }

    pub fn document(&self) -> Option<Document> {
        self.0
            .state
            .read()
            .document
            .as_ref()
            .and_then(WeakDocument::upgrade)
    }

    /// Points this model, and everything it reaches, at `document`.
    pub(crate) fn attach_document(&self, document: &Document) {
        let mut models = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect(&mut models, &mut seen, true);
        for model in models {
            model.0.state.write().document = Some(document.downgrade());
        }
    }

    /// Attaches a script to the change hook of `property`.
    pub fn js_on_change(&self, property: &str, callback: CustomJs) {
        self.0
            .state
            .write()
            .js_property_callbacks
            .entry(format!("change:{property}"))
            .or_default()
            .push(callback);
    }

    /// Attaches a script to the client event `event`.
    pub fn js_on_event(&self, event: &str, callback: CustomJs) {
        self.0
            .state
            .write()
            .js_event_callbacks
            .entry(event.to_string())
            .or_default()
            .push(callback);
    }

    pub fn js_property_callbacks(&self) -> IndexMap<String, Vec<CustomJs>> {
        self.0.state.read().js_property_callbacks.clone()
    }

    pub fn js_event_callbacks(&self) -> IndexMap<String, Vec<CustomJs>> {
        self.0.state.read().js_event_callbacks.clone()
    }

    pub fn property_callbacks(&self, property: &str) -> Vec<CustomJs> {
        self.0
            .state
            .read()
            .js_property_callbacks
            .get(&format!("change:{property}"))
            .cloned()
            .unwrap_or_default()
    }

    pub fn event_callbacks(&self, event: &str) -> Vec<CustomJs> {
        self.0
            .state
            .read()
            .js_event_callbacks
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether any attached script, property or event, carries `tag`.
    pub fn has_tagged_callback(&self, tag: &str) -> bool {
        let state = self.0.state.read();
        state
            .js_property_callbacks
            .values()
            .chain(state.js_event_callbacks.values())
            .flatten()
            .any(|callback| callback.has_tag(tag))
    }

    /// Detaches every script whose tags satisfy `matches`, returning how many were removed.
    pub fn remove_callbacks(&self, matches: impl Fn(&CustomJs) -> bool) -> usize {
        let mut state = self.0.state.write();
        let state = &mut *state;
        let mut removed = 0;
        for callbacks in state
            .js_property_callbacks
            .values_mut()
            .chain(state.js_event_callbacks.values_mut())
        {
            let before = callbacks.len();
            callbacks.retain(|callback| !matches(callback));
            removed += before - callbacks.len();
        }
        state.js_property_callbacks.retain(|_, callbacks| !callbacks.is_empty());
        state.js_event_callbacks.retain(|_, callbacks| !callbacks.is_empty());
        removed
    }

    pub fn downgrade(&self) -> WeakModel {
        WeakModel {
            id: self.0.id,
            inner: Arc::downgrade(&self.0),
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.0.id)
            .field("type_name", &self.0.type_name)
            .finish()
    }
}

/// A non-owning handle to a [`Model`].
#[derive(Clone)]
pub struct WeakModel {
    id: ObjectId,
    inner: Weak<ModelInner>,
}

impl WeakModel {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn upgrade(&self) -> Option<Model> {
        self.inner.upgrade().map(Model)
    }
}

impl fmt::Debug for WeakModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakModel").field("id", &self.id).finish()
    }
}
