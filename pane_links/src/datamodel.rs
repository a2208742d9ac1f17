//! Proxy models for plain parameterized objects.
//!
//! A [`Parameterized`] object has no visual model of its own, so when a link points at
//! one, a data model mirroring its parameters is created, kept in sync with it in both
//! directions, and retained by the rendering root.

use pane_model::{Model, ObjectId, Parameterized, WeakModel};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock};

/// The structure derived from a parameterized type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    pub type_name: String,
    pub properties: Vec<String>,
}

static SCHEMAS: OnceLock<RwLock<FxHashMap<String, Arc<Schema>>>> = OnceLock::new();
static PROXIES: OnceLock<RwLock<FxHashMap<(ObjectId, ObjectId), WeakModel>>> =
    OnceLock::new();

/// The schema for objects of the same type as `params`, derived once per type.
pub fn schema_for(params: &Parameterized) -> Arc<Schema> {
    let schemas = SCHEMAS.get_or_init(Default::default);
    if let Some(schema) = schemas.read().get(params.type_name()) {
        return Arc::clone(schema);
    }
    let schema = Arc::new(Schema {
        type_name: params.type_name().to_string(),
        properties: params
            .names()
            .into_iter()
            .filter(|name| name != "name")
            .collect(),
    });
    Arc::clone(
        schemas
            .write()
            .entry(schema.type_name.clone())
            .or_insert(schema),
    )
}

/// Returns the proxy model of `params` under `root`, creating it on first use.
///
/// The proxy stops watching `params` once it is dropped.
pub fn create_linked_datamodel(params: &Parameterized, root: &Model) -> Model {
    let key = (root.id(), params.id());
    let proxies = PROXIES.get_or_init(Default::default);
    if let Some(model) = proxies.read().get(&key).and_then(WeakModel::upgrade) {
        return model;
    }

    // creation never touches the cache, so holding the lock serializes racing callers
    let mut proxies = proxies.write();
    if let Some(model) = proxies.get(&key).and_then(WeakModel::upgrade) {
        return model;
    }
    let model = build_proxy(params);
    root.retain(&model);
    proxies.retain(|_, proxy| proxy.upgrade().is_some());
    proxies.insert(key, model.downgrade());
    model
}

fn build_proxy(params: &Parameterized) -> Model {
    let schema = schema_for(params);
    let model = schema
        .properties
        .iter()
        .filter_map(|name| params.get(name).map(|value| (name, value)))
        .fold(Model::new(schema.type_name.clone()), |model, (name, value)| {
            model.with_property(name.clone(), value)
        });

    // attributes currently being propagated, in either direction
    let changing: Arc<Mutex<Vec<String>>> = Arc::default();

    let names: Vec<&str> = schema.properties.iter().map(String::as_str).collect();
    let weak_model = model.downgrade();
    let watched = params.watch_internal(&names, {
        let changing = Arc::clone(&changing);
        move |events| {
            let Some(model) = weak_model.upgrade() else {
                return;
            };
            for event in events {
                if changing.lock().contains(&event.name) {
                    continue;
                }
                changing.lock().push(event.name.clone());
                if let Err(error) = model.set(&event.name, event.new.clone()) {
                    tracing::warn!("could not update data model: {error}");
                }
                changing.lock().retain(|name| *name != event.name);
            }
        }
    });
    match watched {
        Ok(watcher) => {
            let weak_params = params.downgrade();
            model.on_cleanup(move || {
                if let Some(params) = weak_params.upgrade() {
                    params.unwatch(watcher);
                }
            });
        }
        Err(error) => tracing::warn!("could not watch {}: {error}", params.type_name()),
    }

    let weak_params = params.downgrade();
    model.on_change(move |_, attr, value| {
        let Some(params) = weak_params.upgrade() else {
            return;
        };
        if changing.lock().iter().any(|name| name == attr) {
            return;
        }
        changing.lock().push(attr.to_string());
        if let Err(error) = params.set(attr, value.clone()) {
            tracing::warn!("could not update {}: {error}", params.type_name());
        }
        changing.lock().retain(|name| name != attr);
    });
    model
}
