//! The process-wide callback registry.
//!
//! Declarations are stored per source, keyed by the source's [`ObjectId`] and holding the
//! source only weakly, so registering a callback never keeps its source alive. Entries
//! whose source has died are ignored on lookup and dropped by [`Registry::prune`].

use crate::declaration::Declaration;
use pane_model::{ObjectId, ObjectRef, WeakObjectRef};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;

struct Entry {
    source: WeakObjectRef,
    declarations: Vec<Declaration>,
}

type RegistryMap = FxHashMap<ObjectId, Entry>;

static MAP: OnceLock<RwLock<RegistryMap>> = OnceLock::new();

pub struct Registry;

impl Registry {
    fn with<U>(fun: impl FnOnce(&RegistryMap) -> U) -> U {
        fun(&MAP.get_or_init(Default::default).read())
    }

    fn with_mut<U>(fun: impl FnOnce(&mut RegistryMap) -> U) -> U {
        fun(&mut MAP.get_or_init(Default::default).write())
    }

    /// Appends `declaration` to its source's list unless an equivalent declaration is
    /// already registered. Returns whether it was appended.
    pub fn register(declaration: &Declaration) -> bool {
        let Some(source) = declaration.source() else {
            tracing::debug!("not registering {declaration:?}: its source is gone");
            return false;
        };
        Self::with_mut(|map| {
            let entry = map.entry(source.id()).or_insert_with(|| Entry {
                source: source.downgrade(),
                declarations: Vec::new(),
            });
            if entry
                .declarations
                .iter()
                .any(|existing| existing.same_registration(declaration))
            {
                return false;
            }
            entry.declarations.push(declaration.clone());
            true
        })
    }

    /// Removes `declaration`. Idempotent.
    pub fn unregister(declaration: &Declaration) -> bool {
        Self::with_mut(|map| {
            let source = declaration.source_id();
            let Some(entry) = map.get_mut(&source) else {
                return false;
            };
            let before = entry.declarations.len();
            entry.declarations.retain(|existing| existing != declaration);
            let removed = entry.declarations.len() != before;
            if entry.declarations.is_empty() {
                map.remove(&source);
            }
            removed
        })
    }

    /// The declarations registered for `source`, in registration order.
    pub fn registered(source: &ObjectRef) -> Vec<Declaration> {
        Self::with(|map| {
            map.get(&source.id())
                .filter(|entry| entry.source.is_alive())
                .map(|entry| entry.declarations.clone())
                .unwrap_or_default()
        })
    }

    /// Whether `id` is the source or target of any live registration.
    ///
    /// A declaration whose required target has died no longer counts.
    pub fn contains(id: ObjectId) -> bool {
        Self::with(|map| {
            map.values()
                .filter(|entry| entry.source.is_alive())
                .flat_map(|entry| &entry.declarations)
                .filter(|declaration| declaration.is_live())
                .any(|declaration| {
                    declaration.source_id() == id || declaration.target_id() == Some(id)
                })
        })
    }

    /// Number of live registrations.
    pub fn len() -> usize {
        Self::with(|map| {
            map.values()
                .filter(|entry| entry.source.is_alive())
                .map(|entry| entry.declarations.len())
                .sum()
        })
    }

    pub fn is_empty() -> bool {
        Self::len() == 0
    }

    /// Drops entries whose source has died, and declarations whose required target has
    /// died. Returns how many declarations were dropped.
    pub fn prune() -> usize {
        Self::with_mut(|map| {
            let mut dropped = 0;
            map.retain(|_, entry| {
                if !entry.source.is_alive() {
                    dropped += entry.declarations.len();
                    return false;
                }
                let before = entry.declarations.len();
                entry.declarations.retain(Declaration::is_live);
                dropped += before - entry.declarations.len();
                !entry.declarations.is_empty()
            });
            dropped
        })
    }

    /// Removes every declaration with `id` as its source or target.
    ///
    /// Components that are torn down call this so that no stale declaration can later
    /// match in a duplicate check and resurrect their models.
    pub fn release(id: ObjectId) -> usize {
        Self::with_mut(|map| {
            let mut dropped = map
                .remove(&id)
                .map(|entry| entry.declarations.len())
                .unwrap_or(0);
            map.retain(|_, entry| {
                let before = entry.declarations.len();
                entry
                    .declarations
                    .retain(|declaration| declaration.target_id() != Some(id));
                dropped += before - entry.declarations.len();
                !entry.declarations.is_empty()
            });
            dropped
        })
    }
}
