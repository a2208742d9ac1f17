//! `jslink` and `jscallback`: declaring client-side links straight from a component.

use crate::{
    declaration::{Arg, Declaration, DeclarationBuilder},
    error::LinkError,
};
use indexmap::IndexMap;
use pane_model::{Component, ObjectRef};

pub trait JsLinkExt {
    /// Starts a link from this component to `target`.
    fn jslink(&self, target: impl Into<ObjectRef>) -> JsLink;

    /// Starts a set of scripts run when properties of this component change.
    fn jscallback(&self) -> JsCallback;
}

impl JsLinkExt for Component {
    fn jslink(&self, target: impl Into<ObjectRef>) -> JsLink {
        JsLink {
            source: self.clone(),
            target: target.into(),
            properties: IndexMap::new(),
            code: IndexMap::new(),
            args: IndexMap::new(),
            bidirectional: false,
        }
    }

    fn jscallback(&self) -> JsCallback {
        JsCallback {
            source: self.clone(),
            code: IndexMap::new(),
            args: IndexMap::new(),
        }
    }
}

/// A link being declared with [`JsLinkExt::jslink`].
///
/// Either properties or code must be given, never both.
#[derive(Debug)]
#[must_use = "a link does nothing until it is registered"]
pub struct JsLink {
    source: Component,
    target: ObjectRef,
    properties: IndexMap<String, String>,
    code: IndexMap<String, String>,
    args: IndexMap<String, Arg>,
    bidirectional: bool,
}

impl JsLink {
    /// Links `source` on this component to `target` on the target.
    pub fn property(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.properties.insert(source.into(), target.into());
        self
    }

    /// Runs `code` when `spec` changes, with the target available as `target`.
    pub fn code(mut self, spec: impl Into<String>, code: impl Into<String>) -> Self {
        self.code.insert(spec.into(), code.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, arg: Arg) -> Self {
        self.args.insert(name.into(), arg);
        self
    }

    pub fn bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// Checks the link against both endpoints and registers it.
    pub fn register(self) -> Result<Declaration, LinkError> {
        match (self.properties.is_empty(), self.code.is_empty()) {
            (false, false) => {
                return Err(LinkError::Configuration(
                    "Either supply a set of properties to link or a set of code callbacks, \
                     not both."
                        .to_string(),
                ))
            }
            (true, true) => {
                return Err(LinkError::Configuration(
                    "Declare properties to link or a set of callbacks, neither was defined."
                        .to_string(),
                ))
            }
            _ => {}
        }
        for spec in self.properties.keys().chain(self.code.keys()) {
            check_source(&self.source, spec)?;
        }
        if self.code.is_empty() {
            for (source, target) in &self.properties {
                check_target(&self.source, source, &self.target, target)?;
            }
        }

        let builder = self
            .properties
            .into_iter()
            .fold(
                DeclarationBuilder::link(&self.source, self.target),
                |builder, (source, target)| builder.property(source, target),
            )
            .bidirectional(self.bidirectional);
        let builder = self
            .code
            .into_iter()
            .fold(builder, |builder, (spec, code)| builder.code(spec, code));
        self.args
            .into_iter()
            .fold(builder, |builder, (name, arg)| builder.arg(name, arg))
            .register()
    }
}

/// Scripts being declared with [`JsLinkExt::jscallback`].
#[derive(Debug)]
#[must_use = "a callback does nothing until it is registered"]
pub struct JsCallback {
    source: Component,
    code: IndexMap<String, String>,
    args: IndexMap<String, Arg>,
}

impl JsCallback {
    /// Runs `code` when `spec` (a property or `event:<name>`) fires.
    pub fn on(mut self, spec: impl Into<String>, code: impl Into<String>) -> Self {
        self.code.insert(spec.into(), code.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, arg: Arg) -> Self {
        self.args.insert(name.into(), arg);
        self
    }

    pub fn register(self) -> Result<Declaration, LinkError> {
        if self.code.is_empty() {
            return Err(LinkError::Configuration(
                "Declare at least one callback, none was defined.".to_string(),
            ));
        }
        for spec in self.code.keys() {
            check_source(&self.source, spec)?;
        }
        let builder = self
            .code
            .into_iter()
            .fold(DeclarationBuilder::callback(&self.source), |builder, (spec, code)| {
                builder.code(spec, code)
            });
        self.args
            .into_iter()
            .fold(builder, |builder, (name, arg)| builder.arg(name, arg))
            .register()
    }
}

/// The parameter behind `spec`, given either as a parameter or as a rendered property.
fn param_named<'a>(component: &Component, spec: &'a str) -> Option<&'a str> {
    if component.params().contains(spec) {
        Some(spec)
    } else {
        component.param_for(spec)
    }
}

fn is_plain(spec: &str) -> bool {
    !spec.starts_with("event:") && !spec.contains('.')
}

fn check_source(source: &Component, spec: &str) -> Result<(), LinkError> {
    if !is_plain(spec) {
        return Ok(());
    }
    let Some(param) = param_named(source, spec) else {
        return Err(LinkError::Configuration(format!(
            "Could not jslink {spec:?} parameter (or property) on {} object because it \
             was not found.",
            source.type_name()
        )));
    };
    let ty = source.ty();
    if matches!(ty.source_transform(param), Some(None)) || ty.is_renamed_away(param) {
        return Err(LinkError::Configuration(format!(
            "Cannot jslink {spec:?} parameter on {} object, the parameter requires a live \
             server to have an effect.",
            source.type_name()
        )));
    }
    Ok(())
}

fn check_target(
    source: &Component,
    source_spec: &str,
    target: &ObjectRef,
    spec: &str,
) -> Result<(), LinkError> {
    if spec == "loading" || !is_plain(spec) {
        return Ok(());
    }
    let missing = || {
        LinkError::Configuration(format!(
            "Could not jslink {source_spec:?} on {} object to {spec:?} on {} object \
             because the target parameter (or property) was not found.",
            source.type_name(),
            target.type_name()
        ))
    };
    match target {
        ObjectRef::Component(component) => {
            let param = param_named(component, spec).ok_or_else(missing)?;
            let ty = component.ty();
            if matches!(ty.target_transform(param), Some(None)) || ty.is_renamed_away(param) {
                return Err(LinkError::Configuration(format!(
                    "Cannot jslink {source_spec:?} parameter on {} object to {spec:?} \
                     parameter on {} object. It requires a live server to have an effect.",
                    source.type_name(),
                    component.type_name()
                )));
            }
            Ok(())
        }
        ObjectRef::Model(model) if !model.has_property(spec) => Err(missing()),
        ObjectRef::Params(params) if !params.contains(spec) => Err(missing()),
        _ => Ok(()),
    }
}
