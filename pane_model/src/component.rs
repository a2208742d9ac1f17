//! Reactive components: parameterized objects that render to one model per root.

use crate::{
    document::Document,
    error::ModelError,
    model::Model,
    object::ObjectId,
    params::{ParamEvent, Parameterized, WatcherId},
    plot::Plot,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use serde_json::{json, Value};
use std::{
    fmt,
    sync::{Arc, Weak},
};

/// `(semantic name, renamed-to)` pairs. `None` means the parameter never reaches the model.
pub type RenameTable = &'static [(&'static str, Option<&'static str>)];

/// `(semantic name, expression)` pairs. `None` marks a parameter that cannot be
/// represented client-side at all.
pub type TransformTable = &'static [(&'static str, Option<&'static str>)];

/// How the values of a widget can be enumerated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    /// One of the values in the `options` parameter.
    Options,
    Boolean,
    /// A number between the `start` and `end` parameters.
    Range { integer: bool },
    /// Anything, e.g. free text.
    Unbounded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// An interactive control whose `value` parameter ranges over a domain.
    Widget(Domain),
    /// A non-interactive widget.
    Display,
    Pane,
    Layout,
    PlotPane,
}

/// The static description of a kind of component.
#[derive(Debug)]
pub struct ComponentType {
    pub name: &'static str,
    pub model_type: &'static str,
    pub defaults: fn() -> Vec<(&'static str, Value)>,
    pub rename: RenameTable,
    pub source_transforms: TransformTable,
    pub target_transforms: TransformTable,
    pub role: Role,
    /// Builds the backend plot around a freshly created container model.
    pub build_plot: Option<fn(Model) -> Plot>,
}

fn lookup(table: TransformTable, key: &str) -> Option<Option<&'static str>> {
    table.iter().find(|(name, _)| *name == key).map(|(_, value)| *value)
}

impl ComponentType {
    /// The model property a parameter is rendered to, if any.
    pub fn property_for<'a>(&self, param: &'a str) -> Option<&'a str> {
        match lookup(self.rename, param) {
            Some(renamed) => renamed,
            None => Some(param),
        }
    }

    /// The parameter a model property was rendered from, if it was renamed or not renamed
    /// at all. Callers still have to check the parameter exists.
    pub fn param_for<'a>(&self, property: &'a str) -> Option<&'a str> {
        if let Some((param, _)) =
            self.rename.iter().find(|(_, renamed)| *renamed == Some(property))
        {
            return Some(*param);
        }
        match lookup(self.rename, property) {
            Some(_) => None,
            None => Some(property),
        }
    }

    /// `None` when no transform is registered, `Some(None)` for a refusal.
    pub fn source_transform(&self, param: &str) -> Option<Option<&'static str>> {
        lookup(self.source_transforms, param)
    }

    pub fn target_transform(&self, param: &str) -> Option<Option<&'static str>> {
        lookup(self.target_transforms, param)
    }

    pub fn is_renamed_away(&self, param: &str) -> bool {
        matches!(lookup(self.rename, param), Some(None))
    }
}

/// A custom server-side reaction installed by [`Component::link_with`].
pub type LinkCallback =
    Arc<dyn Fn(&Component, &ParamEvent) -> Result<(), ModelError> + Send + Sync>;

/// A server-side link: changes to the source parameters are forwarded to the target
/// by a watcher.
#[derive(Clone)]
pub struct ServerLink {
    pub target: WeakComponent,
    pub mapping: IndexMap<String, String>,
    /// Whether a custom callback runs instead of a plain copy.
    pub transformed: bool,
    pub watcher: WatcherId,
}

impl fmt::Debug for ServerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerLink")
            .field("target", &self.target)
            .field("mapping", &self.mapping)
            .field("transformed", &self.transformed)
            .finish()
    }
}

struct Rendered {
    model: Model,
    plot: Option<Plot>,
    watcher: WatcherId,
}

#[derive(Default)]
struct ComponentState {
    rendered: IndexMap<ObjectId, Rendered>,
    children: Vec<Component>,
    links: Vec<ServerLink>,
}

/// A reactive component.
///
/// Rendering under a root creates a model for that root and keeps it in sync with the
/// component's parameters in both directions until [`Component::cleanup`] is called.
#[derive(Clone)]
pub struct Component(Arc<ComponentInner>);

struct ComponentInner {
    id: ObjectId,
    ty: &'static ComponentType,
    params: Parameterized,
    state: RwLock<ComponentState>,
}

impl Component {
    pub fn new(ty: &'static ComponentType) -> Self {
        Self::new_with(ty, [])
    }

    /// Creates a component whose parameters start from the type's defaults with
    /// `overrides` applied. Overrides are not validated.
    pub fn new_with(
        ty: &'static ComponentType,
        overrides: impl IntoIterator<Item = (&'static str, Value)>,
    ) -> Self {
        let id = ObjectId::next();
        let mut values = vec![
            ("name", json!(format!("{}{:05}", ty.name, id.as_u64()))),
            ("loading", json!(false)),
            ("css_classes", json!([])),
        ];
        values.extend((ty.defaults)());
        values.extend(overrides);
        Self(Arc::new(ComponentInner {
            id,
            ty,
            params: Parameterized::new(ty.name, values),
            state: RwLock::new(ComponentState::default()),
        }))
    }

    /// Sets a parameter while building the component.
    pub fn with(self, name: &str, value: Value) -> Result<Self, ModelError> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn with_children(self, children: impl IntoIterator<Item = Component>) -> Self {
        self.0.state.write().children.extend(children);
        self
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn ty(&self) -> &'static ComponentType {
        self.0.ty
    }

    pub fn type_name(&self) -> &'static str {
        self.0.ty.name
    }

    pub fn role(&self) -> Role {
        self.0.ty.role
    }

    pub fn domain(&self) -> Option<Domain> {
        match self.0.ty.role {
            Role::Widget(domain) => Some(domain),
            _ => None,
        }
    }

    pub fn params(&self) -> &Parameterized {
        &self.0.params
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.params.get(name)
    }

    pub fn name(&self) -> String {
        self.get("name")
            .and_then(|name| name.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn is_disabled(&self) -> bool {
        self.get("disabled").and_then(|d| d.as_bool()).unwrap_or(false)
    }

    /// Validates and sets one parameter.
    pub fn set(&self, name: &str, value: Value) -> Result<bool, ModelError> {
        self.validate(name, &value)?;
        self.0.params.set(name, value)
    }

    /// Checks a value against the widget's options or bounds.
    pub fn validate(&self, name: &str, value: &Value) -> Result<(), ModelError> {
        if name != "value" {
            return Ok(());
        }
        let reject = |reason: String| ModelError::InvalidValue {
            owner: self.type_name().to_string(),
            name: name.to_string(),
            value: value.to_string(),
            reason,
        };
        match self.domain() {
            Some(Domain::Options) => {
                let options = self.get("options").unwrap_or(Value::Null);
                let known = options
                    .as_array()
                    .is_some_and(|options| options.contains(value));
                if known {
                    Ok(())
                } else {
                    Err(reject(format!("not one of the options {options}")))
                }
            }
            Some(Domain::Boolean) if !value.is_boolean() => {
                Err(reject("expected a boolean".to_string()))
            }
            Some(Domain::Range { integer }) => {
                if integer && !(value.is_i64() || value.is_u64()) {
                    return Err(reject("expected an integer".to_string()));
                }
                let Some(number) = value.as_f64() else {
                    return Err(reject("expected a number".to_string()));
                };
                let bound = |key: &str| self.get(key).and_then(|v| v.as_f64());
                match (bound("start"), bound("end")) {
                    (Some(start), Some(end)) if number < start || number > end => {
                        Err(reject(format!("outside of bounds [{start}, {end}]")))
                    }
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    pub fn property_for<'a>(&self, param: &'a str) -> Option<&'a str> {
        self.0.ty.property_for(param)
    }

    pub fn param_for<'a>(&self, property: &'a str) -> Option<&'a str> {
        self.0
            .ty
            .param_for(property)
            .filter(|param| self.0.params.contains(param))
    }

    pub fn children(&self) -> Vec<Component> {
        self.0.state.read().children.clone()
    }

    pub fn add_child(&self, child: Component) {
        self.0.state.write().children.push(child);
    }

    /// This component and all of its descendants, depth first.
    pub fn descendants(&self) -> Vec<Component> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect(&mut out, &mut seen);
        out
    }

    fn collect(&self, out: &mut Vec<Component>, seen: &mut FxHashSet<ObjectId>) {
        if !seen.insert(self.id()) {
            return;
        }
        out.push(self.clone());
        for child in self.children() {
            child.collect(out, seen);
        }
    }

    pub fn select(&self, predicate: impl Fn(&Component) -> bool) -> Vec<Component> {
        self.descendants()
            .into_iter()
            .filter(|component| predicate(component))
            .collect()
    }

    /// The model rendered for `root`.
    pub fn model(&self, root: ObjectId) -> Option<Model> {
        self.0
            .state
            .read()
            .rendered
            .get(&root)
            .map(|rendered| rendered.model.clone())
    }

    /// Every root this component is rendered under, with its model.
    pub fn models(&self) -> IndexMap<ObjectId, Model> {
        self.0
            .state
            .read()
            .rendered
            .iter()
            .map(|(root, rendered)| (*root, rendered.model.clone()))
            .collect()
    }

    pub fn is_rendered(&self, root: ObjectId) -> bool {
        self.0.state.read().rendered.contains_key(&root)
    }

    pub fn plot(&self, root: ObjectId) -> Option<Plot> {
        self.0
            .state
            .read()
            .rendered
            .get(&root)
            .and_then(|rendered| rendered.plot.clone())
    }

    /// Renders this component as a new root of `document`.
    pub fn render(&self, document: &Document) -> Result<Model, ModelError> {
        let model = self.build(None)?;
        document.add_root(&model);
        Ok(model)
    }

    fn build(&self, root: Option<ObjectId>) -> Result<Model, ModelError> {
        let ty = self.0.ty;
        let mut model = Model::new(ty.model_type);
        let mut synced = Vec::new();
        for (param, value) in self.0.params.values() {
            if let Some(property) = ty.property_for(&param) {
                model = model.with_property(property, value);
                synced.push(param);
            }
        }
        let plot = ty.build_plot.map(|build| build(model.clone()));
        let root = root.unwrap_or(model.id());

        for child in self.children() {
            let child_model = child.build(Some(root))?;
            model.add_child(&child_model);
        }

        let names: Vec<&str> = synced.iter().map(String::as_str).collect();
        let weak_model = model.downgrade();
        let watcher = self.0.params.watch_internal(&names, move |events| {
            let Some(model) = weak_model.upgrade() else {
                return;
            };
            for event in events {
                let Some(property) = ty.property_for(&event.name) else {
                    continue;
                };
                if let Err(error) = model.set(property, event.new.clone()) {
                    tracing::warn!("could not sync {}: {error}", event.name);
                }
            }
        })?;

        let weak_params = self.0.params.downgrade();
        model.on_change(move |_, property, value| {
            let Some(params) = weak_params.upgrade() else {
                return;
            };
            let Some(param) = ty.param_for(property) else {
                return;
            };
            if !params.contains(param) {
                return;
            }
            if let Err(error) = params.set(param, value.clone()) {
                tracing::warn!("could not sync {property} back: {error}");
            }
        });

        self.0.state.write().rendered.insert(
            root,
            Rendered {
                model: model.clone(),
                plot,
                watcher,
            },
        );
        Ok(model)
    }

    /// Forgets the models rendered under `root`, here and in every descendant.
    pub fn cleanup(&self, root: ObjectId) {
        let removed = self.0.state.write().rendered.shift_remove(&root);
        if let Some(rendered) = removed {
            self.0.params.unwatch(rendered.watcher);
        }
        for child in self.children() {
            child.cleanup(root);
        }
    }

    /// Links parameters of this component to parameters of `target` on the server:
    /// whenever a source parameter changes, the mapped target parameter is set.
    pub fn link(
        &self,
        target: &Component,
        mapping: &[(&str, &str)],
    ) -> Result<WatcherId, ModelError> {
        self.add_link(target, mapping, None)
    }

    /// Like [`Component::link`], but runs `callback` for every change instead of copying.
    pub fn link_with(
        &self,
        target: &Component,
        mapping: &[(&str, &str)],
        callback: impl Fn(&Component, &ParamEvent) -> Result<(), ModelError>
            + Send
            + Sync
            + 'static,
    ) -> Result<WatcherId, ModelError> {
        self.add_link(target, mapping, Some(Arc::new(callback)))
    }

    fn add_link(
        &self,
        target: &Component,
        mapping: &[(&str, &str)],
        callback: Option<LinkCallback>,
    ) -> Result<WatcherId, ModelError> {
        if let Some((_, name)) =
            mapping.iter().find(|(_, name)| !target.params().contains(name))
        {
            return Err(ModelError::UnknownParameter {
                owner: target.type_name().to_string(),
                name: name.to_string(),
            });
        }
        let mapping: IndexMap<String, String> = mapping
            .iter()
            .map(|(source, target)| (source.to_string(), target.to_string()))
            .collect();
        let names: Vec<&str> = mapping.keys().map(String::as_str).collect();
        let transformed = callback.is_some();
        let weak_target = target.downgrade();
        let forward = mapping.clone();

        let watcher = self.0.params.watch(&names, move |events| {
            let Some(target) = weak_target.upgrade() else {
                return;
            };
            for event in events {
                let result = match &callback {
                    Some(callback) => callback(&target, event),
                    None => match forward.get(&event.name) {
                        Some(name) => target.set(name, event.new.clone()).map(|_| ()),
                        None => Ok(()),
                    },
                };
                if let Err(error) = result {
                    tracing::warn!(
                        "link from {} to {} failed: {error}",
                        event.name,
                        target.type_name()
                    );
                }
            }
        })?;

        self.0.state.write().links.push(ServerLink {
            target: target.downgrade(),
            mapping,
            transformed,
            watcher,
        });
        Ok(watcher)
    }

    pub fn links(&self) -> Vec<ServerLink> {
        self.0.state.read().links.clone()
    }

    /// Removes a server-side link installed by [`Component::link`].
    pub fn unlink(&self, watcher: WatcherId) -> bool {
        self.0.state.write().links.retain(|link| link.watcher != watcher);
        self.0.params.unwatch(watcher)
    }

    pub fn downgrade(&self) -> WeakComponent {
        WeakComponent {
            id: self.0.id,
            inner: Arc::downgrade(&self.0),
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.0.id)
            .field("type_name", &self.0.ty.name)
            .finish()
    }
}

#[derive(Clone)]
pub struct WeakComponent {
    id: ObjectId,
    inner: Weak<ComponentInner>,
}

impl WeakComponent {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn upgrade(&self) -> Option<Component> {
        self.inner.upgrade().map(Component)
    }
}

impl fmt::Debug for WeakComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakComponent").field("id", &self.id).finish()
    }
}
