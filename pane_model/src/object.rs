//! Identity for every object a link can point at.
//!
//! Registries never hold the objects themselves. They hold an [`ObjectId`] and a
//! [`WeakObjectRef`], and treat a failed [`WeakObjectRef::upgrade`] as "this object is gone".

use crate::{
    component::{Component, WeakComponent},
    model::{Model, WeakModel},
    params::{Parameterized, WeakParameterized},
    plot::{Plot, WeakPlot},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique identity token.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocates a fresh identifier.
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of things that can be the source, target or argument of a link.
#[derive(Clone, Debug)]
pub enum ObjectRef {
    /// A renderer-native visual model, already concrete.
    Model(Model),
    /// A reactive component with one model per rendering root.
    Component(Component),
    /// A plain stateful object that is never rendered itself.
    Params(Parameterized),
    /// A backend-rendered composite plot.
    Plot(Plot),
}

impl ObjectRef {
    pub fn id(&self) -> ObjectId {
        match self {
            ObjectRef::Model(model) => model.id(),
            ObjectRef::Component(component) => component.id(),
            ObjectRef::Params(params) => params.id(),
            ObjectRef::Plot(plot) => plot.id(),
        }
    }

    /// The user-facing type name, used in error messages and fingerprints.
    pub fn type_name(&self) -> String {
        match self {
            ObjectRef::Model(model) => model.type_name().to_string(),
            ObjectRef::Component(component) => component.type_name().to_string(),
            ObjectRef::Params(params) => params.type_name().to_string(),
            ObjectRef::Plot(plot) => plot.state().type_name().to_string(),
        }
    }

    /// Whether this object is observable without being rendered.
    pub fn is_params(&self) -> bool {
        matches!(self, ObjectRef::Params(_))
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            ObjectRef::Component(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            ObjectRef::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn downgrade(&self) -> WeakObjectRef {
        match self {
            ObjectRef::Model(model) => WeakObjectRef::Model(model.downgrade()),
            ObjectRef::Component(component) => {
                WeakObjectRef::Component(component.downgrade())
            }
            ObjectRef::Params(params) => WeakObjectRef::Params(params.downgrade()),
            ObjectRef::Plot(plot) => WeakObjectRef::Plot(plot.downgrade()),
        }
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ObjectRef {}

impl From<Model> for ObjectRef {
    fn from(value: Model) -> Self {
        ObjectRef::Model(value)
    }
}

impl From<&Model> for ObjectRef {
    fn from(value: &Model) -> Self {
        ObjectRef::Model(value.clone())
    }
}

impl From<Component> for ObjectRef {
    fn from(value: Component) -> Self {
        ObjectRef::Component(value)
    }
}

impl From<&Component> for ObjectRef {
    fn from(value: &Component) -> Self {
        ObjectRef::Component(value.clone())
    }
}

impl From<Parameterized> for ObjectRef {
    fn from(value: Parameterized) -> Self {
        ObjectRef::Params(value)
    }
}

impl From<&Parameterized> for ObjectRef {
    fn from(value: &Parameterized) -> Self {
        ObjectRef::Params(value.clone())
    }
}

impl From<Plot> for ObjectRef {
    fn from(value: Plot) -> Self {
        ObjectRef::Plot(value)
    }
}

impl From<&Plot> for ObjectRef {
    fn from(value: &Plot) -> Self {
        ObjectRef::Plot(value.clone())
    }
}

/// A non-owning handle to an [`ObjectRef`].
#[derive(Clone, Debug)]
pub enum WeakObjectRef {
    Model(WeakModel),
    Component(WeakComponent),
    Params(WeakParameterized),
    Plot(WeakPlot),
}

impl WeakObjectRef {
    /// The identity of the referenced object, available even after it was dropped.
    pub fn id(&self) -> ObjectId {
        match self {
            WeakObjectRef::Model(model) => model.id(),
            WeakObjectRef::Component(component) => component.id(),
            WeakObjectRef::Params(params) => params.id(),
            WeakObjectRef::Plot(plot) => plot.id(),
        }
    }

    /// Returns the object if it is still alive.
    pub fn upgrade(&self) -> Option<ObjectRef> {
        match self {
            WeakObjectRef::Model(model) => model.upgrade().map(ObjectRef::Model),
            WeakObjectRef::Component(component) => {
                component.upgrade().map(ObjectRef::Component)
            }
            WeakObjectRef::Params(params) => {
                params.upgrade().map(ObjectRef::Params)
            }
            WeakObjectRef::Plot(plot) => plot.upgrade().map(ObjectRef::Plot),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.upgrade().is_some()
    }
}
