use crate::{model::Model, object::ObjectId};
use indexmap::IndexMap;
use std::{
    fmt,
    sync::{Arc, Weak},
};

/// A plot rendered by a plotting backend: one outer container model plus the named
/// internal handles (axis ranges, glyphs, data sources) it was built from.
#[derive(Clone)]
pub struct Plot(Arc<PlotInner>);

struct PlotInner {
    id: ObjectId,
    state: Model,
    handles: IndexMap<String, Model>,
}

impl Plot {
    /// Handles are also registered on `state` so dotted paths such as `x_range.start`
    /// resolve from the container.
    pub fn new(state: Model, handles: IndexMap<String, Model>) -> Self {
        for (name, handle) in &handles {
            state.set_handle(name.clone(), handle);
        }
        Self(Arc::new(PlotInner {
            id: ObjectId::next(),
            state,
            handles,
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn state(&self) -> &Model {
        &self.0.state
    }

    pub fn handle(&self, name: &str) -> Option<&Model> {
        self.0.handles.get(name)
    }

    pub fn handles(&self) -> &IndexMap<String, Model> {
        &self.0.handles
    }

    pub fn downgrade(&self) -> WeakPlot {
        WeakPlot {
            id: self.0.id,
            inner: Arc::downgrade(&self.0),
        }
    }
}

impl PartialEq for Plot {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Plot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plot")
            .field("id", &self.0.id)
            .field("state", &self.0.state)
            .field("handles", &self.0.handles.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Clone)]
pub struct WeakPlot {
    id: ObjectId,
    inner: Weak<PlotInner>,
}

impl WeakPlot {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn upgrade(&self) -> Option<Plot> {
        self.inner.upgrade().map(Plot)
    }
}

impl fmt::Debug for WeakPlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPlot").field("id", &self.id).finish()
    }
}
