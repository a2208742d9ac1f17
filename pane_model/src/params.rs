use crate::{error::ModelError, object::ObjectId};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::{
    fmt,
    sync::{Arc, Weak},
};

/// One parameter change delivered to a watcher.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamEvent {
    pub name: String,
    pub old: Value,
    pub new: Value,
}

pub type Watcher = Arc<dyn Fn(&[ParamEvent]) + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

struct WatcherEntry {
    id: WatcherId,
    names: Vec<String>,
    internal: bool,
    callback: Watcher,
}

/// A plain stateful object: ordered named values plus watchers.
#[derive(Clone)]
pub struct Parameterized(Arc<ParamsInner>);

struct ParamsInner {
    id: ObjectId,
    type_name: String,
    state: RwLock<ParamsState>,
}

struct ParamsState {
    values: IndexMap<String, Value>,
    watchers: Vec<WatcherEntry>,
    next_watcher: u64,
}

impl Parameterized {
    pub fn new<K: Into<String>>(
        type_name: impl Into<String>,
        values: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        Self(Arc::new(ParamsInner {
            id: ObjectId::next(),
            type_name: type_name.into(),
            state: RwLock::new(ParamsState {
                values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
                watchers: Vec::new(),
                next_watcher: 0,
            }),
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.state.read().values.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.state.read().values.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.0.state.read().values.keys().cloned().collect()
    }

    pub fn values(&self) -> IndexMap<String, Value> {
        self.0.state.read().values.clone()
    }

    /// Sets one parameter. Returns whether the value changed.
    pub fn set(&self, name: &str, value: Value) -> Result<bool, ModelError> {
        Ok(!self.update([(name, value)])?.is_empty())
    }

    /// Sets several parameters at once, then notifies each interested watcher a single
    /// time with all the changes it cares about.
    ///
    /// Fails without changing anything if any name is unknown.
    pub fn update<'a>(
        &self,
        values: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Result<Vec<ParamEvent>, ModelError> {
        let values: Vec<_> = values.into_iter().collect();
        let (events, watchers) = {
            let mut state = self.0.state.write();
            if let Some((name, _)) =
                values.iter().find(|(name, _)| !state.values.contains_key(*name))
            {
                return Err(ModelError::UnknownParameter {
                    owner: self.0.type_name.clone(),
                    name: name.to_string(),
                });
            }

            let mut events = Vec::new();
            for (name, new) in values {
                if let Some(slot) = state.values.get_mut(name) {
                    if *slot != new {
                        let old = std::mem::replace(slot, new.clone());
                        events.push(ParamEvent {
                            name: name.to_string(),
                            old,
                            new,
                        });
                    }
                }
            }
            (events, Self::interested(&state, None))
        };

        Self::dispatch(&events, watchers);
        Ok(events)
    }

    /// Fires watchers of `name` as though it changed, without changing it.
    pub fn trigger(&self, name: &str) -> Result<(), ModelError> {
        let (event, watchers) = {
            let state = self.0.state.read();
            let Some(value) = state.values.get(name) else {
                return Err(ModelError::UnknownParameter {
                    owner: self.0.type_name.clone(),
                    name: name.to_string(),
                });
            };
            let event = ParamEvent {
                name: name.to_string(),
                old: value.clone(),
                new: value.clone(),
            };
            (event, Self::interested(&state, Some(name)))
        };
        Self::dispatch(&[event], watchers);
        Ok(())
    }

    fn interested(
        state: &ParamsState,
        only: Option<&str>,
    ) -> Vec<(Vec<String>, Watcher)> {
        state
            .watchers
            .iter()
            .filter(|entry| only.is_none_or(|name| entry.names.iter().any(|n| n == name)))
            .map(|entry| (entry.names.clone(), Arc::clone(&entry.callback)))
            .collect()
    }

    fn dispatch(events: &[ParamEvent], watchers: Vec<(Vec<String>, Watcher)>) {
        if events.is_empty() {
            return;
        }
        // internal watchers were registered first, so models are in sync before
        // user callbacks run
        for (names, callback) in watchers {
            let relevant: Vec<ParamEvent> = events
                .iter()
                .filter(|event| names.contains(&event.name))
                .cloned()
                .collect();
            if !relevant.is_empty() {
                callback(&relevant);
            }
        }
    }

    /// Watches `names` on behalf of user code.
    pub fn watch(
        &self,
        names: &[&str],
        callback: impl Fn(&[ParamEvent]) + Send + Sync + 'static,
    ) -> Result<WatcherId, ModelError> {
        self.add_watcher(names, false, Arc::new(callback))
    }

    /// Watches `names` on behalf of the framework, e.g. to keep a rendered model in sync.
    pub fn watch_internal(
        &self,
        names: &[&str],
        callback: impl Fn(&[ParamEvent]) + Send + Sync + 'static,
    ) -> Result<WatcherId, ModelError> {
        self.add_watcher(names, true, Arc::new(callback))
    }

    fn add_watcher(
        &self,
        names: &[&str],
        internal: bool,
        callback: Watcher,
    ) -> Result<WatcherId, ModelError> {
        let mut state = self.0.state.write();
        if let Some(name) = names.iter().find(|name| !state.values.contains_key(**name)) {
            return Err(ModelError::UnknownParameter {
                owner: self.0.type_name.clone(),
                name: name.to_string(),
            });
        }
        let id = WatcherId(state.next_watcher);
        state.next_watcher += 1;
        let entry = WatcherEntry {
            id,
            names: names.iter().map(|name| name.to_string()).collect(),
            internal,
            callback,
        };
        if internal {
            let at = state.watchers.iter().take_while(|w| w.internal).count();
            state.watchers.insert(at, entry);
        } else {
            state.watchers.push(entry);
        }
        Ok(id)
    }

    pub fn unwatch(&self, id: WatcherId) -> bool {
        let mut state = self.0.state.write();
        let before = state.watchers.len();
        state.watchers.retain(|entry| entry.id != id);
        state.watchers.len() != before
    }

    /// How many watchers, internal or not, are registered.
    pub fn watcher_count(&self) -> usize {
        self.0.state.read().watchers.len()
    }

    /// The user-registered watchers that observe `name`.
    pub fn external_watchers(&self, name: &str) -> Vec<WatcherId> {
        self.0
            .state
            .read()
            .watchers
            .iter()
            .filter(|entry| !entry.internal && entry.names.iter().any(|n| n == name))
            .map(|entry| entry.id)
            .collect()
    }

    pub fn downgrade(&self) -> WeakParameterized {
        WeakParameterized {
            id: self.0.id,
            inner: Arc::downgrade(&self.0),
        }
    }
}

impl PartialEq for Parameterized {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Parameterized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameterized")
            .field("id", &self.0.id)
            .field("type_name", &self.0.type_name)
            .field("values", &self.0.state.read().values)
            .finish()
    }
}

#[derive(Clone)]
pub struct WeakParameterized {
    id: ObjectId,
    inner: Weak<ParamsInner>,
}

impl WeakParameterized {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn upgrade(&self) -> Option<Parameterized> {
        self.inner.upgrade().map(Parameterized)
    }
}

impl fmt::Debug for WeakParameterized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakParameterized")
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ParamEvent, Parameterized};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    fn settings() -> Parameterized {
        Parameterized::new(
            "Settings",
            [("color", json!("red")), ("size", json!(3))],
        )
    }

    #[test]
    fn batch_update_notifies_once() {
        let params = settings();
        let seen: Arc<Mutex<Vec<Vec<ParamEvent>>>> = Arc::default();
        params
            .watch(&["color", "size"], {
                let seen = Arc::clone(&seen);
                move |events| seen.lock().push(events.to_vec())
            })
            .unwrap();

        params
            .update([("color", json!("blue")), ("size", json!(3))])
            .unwrap();
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            vec![ParamEvent {
                name: "color".into(),
                old: json!("red"),
                new: json!("blue")
            }]
        );
    }

    #[test]
    fn unknown_names_are_rejected_atomically() {
        let params = settings();
        assert!(params
            .update([("color", json!("green")), ("shape", json!("circle"))])
            .is_err());
        assert_eq!(params.get("color"), Some(json!("red")));
        assert!(params.watch(&["shape"], |_| {}).is_err());
    }

    #[test]
    fn internal_watchers_run_first() {
        let params = settings();
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::default();
        params
            .watch(&["size"], {
                let order = Arc::clone(&order);
                move |_| order.lock().push("user")
            })
            .unwrap();
        params
            .watch_internal(&["size"], {
                let order = Arc::clone(&order);
                move |_| order.lock().push("sync")
            })
            .unwrap();

        params.set("size", json!(4)).unwrap();
        assert_eq!(*order.lock(), vec!["sync", "user"]);
        assert_eq!(params.external_watchers("size").len(), 1);
    }

    #[test]
    fn unwatch_and_trigger() {
        let params = settings();
        let hits: Arc<Mutex<usize>> = Arc::default();
        let id = params
            .watch(&["color"], {
                let hits = Arc::clone(&hits);
                move |_| *hits.lock() += 1
            })
            .unwrap();

        params.trigger("color").unwrap();
        assert_eq!(*hits.lock(), 1);
        assert!(params.unwatch(id));
        assert!(!params.unwatch(id));
        params.trigger("color").unwrap();
        assert_eq!(*hits.lock(), 1);
    }
}
