//! Callback and link declarations: registered intents to wire a callback, independent of
//! any particular rendering root.

use crate::{error::LinkError, registry::Registry};
use indexmap::IndexMap;
use pane_model::{ObjectId, ObjectRef, Value, WeakObjectRef};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

static NEXT_DECLARATION: AtomicU64 = AtomicU64::new(1);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationId(u64);

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of declaration kinds. Generators are looked up by exact kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// Scripts run when source properties change or source events fire.
    Callback,
    /// Property-to-property links between a source and a target.
    Link,
    /// A kind defined outside this crate, realized by a generator registered for its tag.
    Custom(&'static str),
}

impl DeclarationKind {
    pub fn requires_target(&self) -> bool {
        matches!(self, DeclarationKind::Link)
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationKind::Callback => f.write_str("Callback"),
            DeclarationKind::Link => f.write_str("Link"),
            DeclarationKind::Custom(tag) => f.write_str(tag),
        }
    }
}

/// An entry of a declaration's `args` map.
#[derive(Clone, Debug)]
pub enum Arg {
    /// A stateful object, resolved to a model for each root.
    Object(WeakObjectRef),
    /// A literal passed through unchanged.
    Value(Value),
}

impl Arg {
    pub fn object(object: impl Into<ObjectRef>) -> Self {
        Arg::Object(object.into().downgrade())
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Arg::Value(value.into())
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arg::Object(a), Arg::Object(b)) => a.id() == b.id(),
            (Arg::Value(a), Arg::Value(b)) => a == b,
            _ => false,
        }
    }
}

/// A registered intent to wire a callback or link.
///
/// Cloning yields another handle to the same declaration.
#[derive(Clone)]
pub struct Declaration(Arc<DeclarationInner>);

struct DeclarationInner {
    id: DeclarationId,
    kind: DeclarationKind,
    source: WeakObjectRef,
    target: Option<WeakObjectRef>,
    requires_target: bool,
    args: IndexMap<String, Arg>,
    code: IndexMap<String, String>,
    properties: IndexMap<String, String>,
    bidirectional: bool,
    params: IndexMap<String, Value>,
}

impl Declaration {
    pub fn id(&self) -> DeclarationId {
        self.0.id
    }

    pub fn kind(&self) -> DeclarationKind {
        self.0.kind
    }

    /// The source, if it is still alive.
    pub fn source(&self) -> Option<ObjectRef> {
        self.0.source.upgrade()
    }

    pub fn source_id(&self) -> ObjectId {
        self.0.source.id()
    }

    /// The target, if there is one and it is still alive.
    pub fn target(&self) -> Option<ObjectRef> {
        self.0.target.as_ref().and_then(WeakObjectRef::upgrade)
    }

    pub fn target_id(&self) -> Option<ObjectId> {
        self.0.target.as_ref().map(WeakObjectRef::id)
    }

    pub fn requires_target(&self) -> bool {
        self.0.requires_target
    }

    /// Whether the source and, when one is required, the target are still alive.
    pub fn is_live(&self) -> bool {
        self.0.source.is_alive() && (!self.0.requires_target || self.target().is_some())
    }

    pub fn args(&self) -> &IndexMap<String, Arg> {
        &self.0.args
    }

    /// Explicit code, keyed by source property spec.
    pub fn code(&self) -> &IndexMap<String, String> {
        &self.0.code
    }

    /// Source property spec to target property spec.
    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.0.properties
    }

    pub fn bidirectional(&self) -> bool {
        self.0.bidirectional
    }

    /// Extra named values made available to generated code, for custom kinds.
    pub fn params(&self) -> &IndexMap<String, Value> {
        &self.0.params
    }

    /// Whether `other` describes the same registration: same kind, same endpoints and
    /// the same parameter values.
    pub fn same_registration(&self, other: &Declaration) -> bool {
        let (a, b) = (&self.0, &other.0);
        a.kind == b.kind
            && a.source.id() == b.source.id()
            && self.target_id() == other.target_id()
            && a.args == b.args
            && a.code == b.code
            && a.properties == b.properties
            && a.bidirectional == b.bidirectional
            && a.params == b.params
    }

    /// Registers this declaration. Returns `false` if an equivalent one already exists.
    pub fn link(&self) -> bool {
        Registry::register(self)
    }

    /// Removes this declaration from the registry. Returns `false` if it was not there.
    pub fn unlink(&self) -> bool {
        Registry::unregister(self)
    }
}

impl PartialEq for Declaration {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .field("source", &self.0.source.id())
            .field("target", &self.target_id())
            .field("properties", &self.0.properties)
            .field("code", &self.0.code)
            .field("bidirectional", &self.0.bidirectional)
            .finish()
    }
}

/// Builds a [`Declaration`], checking it is well formed.
#[derive(Debug)]
pub struct DeclarationBuilder {
    kind: DeclarationKind,
    source: ObjectRef,
    target: Option<ObjectRef>,
    requires_target: bool,
    args: IndexMap<String, Arg>,
    code: IndexMap<String, String>,
    properties: IndexMap<String, String>,
    bidirectional: bool,
    params: IndexMap<String, Value>,
}

impl DeclarationBuilder {
    pub fn new(kind: DeclarationKind, source: impl Into<ObjectRef>) -> Self {
        Self {
            kind,
            source: source.into(),
            target: None,
            requires_target: kind.requires_target(),
            args: IndexMap::new(),
            code: IndexMap::new(),
            properties: IndexMap::new(),
            bidirectional: false,
            params: IndexMap::new(),
        }
    }

    pub fn callback(source: impl Into<ObjectRef>) -> Self {
        Self::new(DeclarationKind::Callback, source)
    }

    pub fn link(source: impl Into<ObjectRef>, target: impl Into<ObjectRef>) -> Self {
        Self::new(DeclarationKind::Link, source).target(target)
    }

    pub fn target(mut self, target: impl Into<ObjectRef>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Allows building without a target even if the kind normally requires one.
    pub fn target_optional(mut self) -> Self {
        self.requires_target = false;
        self
    }

    /// Requires a target even if the kind does not.
    pub fn target_required(mut self) -> Self {
        self.requires_target = true;
        self
    }

    pub fn arg(mut self, name: impl Into<String>, arg: Arg) -> Self {
        self.args.insert(name.into(), arg);
        self
    }

    pub fn code(mut self, spec: impl Into<String>, code: impl Into<String>) -> Self {
        self.code.insert(spec.into(), code.into());
        self
    }

    pub fn property(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.properties.insert(source.into(), target.into());
        self
    }

    pub fn bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Declaration, LinkError> {
        if self.requires_target && self.target.is_none() {
            return Err(LinkError::Configuration(format!(
                "{} from {} requires a target, but none was supplied",
                self.kind,
                self.source.type_name()
            )));
        }
        for name in self.params.keys() {
            if matches!(name.as_str(), "source" | "target") {
                return Err(LinkError::Configuration(format!(
                    "{name:?} is reserved and cannot be used as a {} parameter",
                    self.kind
                )));
            }
        }
        Ok(Declaration(Arc::new(DeclarationInner {
            id: DeclarationId(NEXT_DECLARATION.fetch_add(1, Ordering::Relaxed)),
            kind: self.kind,
            source: self.source.downgrade(),
            target: self.target.as_ref().map(ObjectRef::downgrade),
            requires_target: self.requires_target,
            args: self.args,
            code: self.code,
            properties: self.properties,
            bidirectional: self.bidirectional,
            params: self.params,
        })))
    }

    /// Builds the declaration and registers it. If an equivalent declaration is already
    /// registered, that one is returned instead.
    pub fn register(self) -> Result<Declaration, LinkError> {
        let declaration = self.build()?;
        if declaration.link() {
            return Ok(declaration);
        }
        let existing = declaration.source().and_then(|source| {
            Registry::registered(&source)
                .into_iter()
                .find(|existing| existing.same_registration(&declaration))
        });
        Ok(existing.unwrap_or(declaration))
    }
}
