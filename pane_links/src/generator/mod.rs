//! Turning a discovered `(declaration, source, target)` triple into client-side scripts.
//!
//! A generator is a one-shot builder: for every spec entry of the declaration it resolves
//! the concrete models under the root, builds the reference dictionary, pushes the
//! initial value, generates code and attaches it to the source model, plus the mirror
//! script on the target for bidirectional links.

pub mod templates;

use crate::{
    context::LinkContext,
    declaration::{Arg, Declaration},
    error::{LinkError, ResolutionError},
    resolve::{plot_of, resolve_model},
    spec::PropertySpec,
    transform::{transform, Side, Transform},
};
use indexmap::IndexMap;
use pane_model::{CustomJs, JsArg, Model, ObjectRef, ScriptPlan, Value};

/// A declaration paired with its live endpoints.
#[derive(Clone, Debug)]
pub struct LinkTriple {
    pub declaration: Declaration,
    pub source: ObjectRef,
    pub target: Option<ObjectRef>,
}

/// One unit of wiring: a source spec, the target spec it drives and optional explicit code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecEntry {
    pub source: PropertySpec,
    pub target: Option<PropertySpec>,
    pub code: Option<String>,
}

/// Generated code together with what it does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    pub code: String,
    pub plan: ScriptPlan,
}

pub trait CallbackGenerator: Send + Sync {
    /// Checks the triple can be realized at all. An error aborts this triple only.
    fn validate(&self, _triple: &LinkTriple) -> Result<(), LinkError> {
        Ok(())
    }

    /// The ordered spec entries to wire.
    fn specs(&self, triple: &LinkTriple) -> Result<Vec<SpecEntry>, LinkError>;

    /// Pushes the initial value from source to target before the live script is attached.
    fn initialize(
        &self,
        _triple: &LinkTriple,
        _source_model: &Model,
        _source_spec: &PropertySpec,
        _target_model: Option<&Model>,
        _target_spec: Option<&PropertySpec>,
    ) -> Result<(), LinkError> {
        Ok(())
    }

    /// Last adjustment of the reference dictionary before code is generated.
    fn process_references(&self, _references: &mut IndexMap<String, JsArg>) {}

    /// Generates code for an entry without explicit code.
    fn code(
        &self,
        ctx: &LinkContext,
        source: &ObjectRef,
        source_spec: &PropertySpec,
        target: Option<&ObjectRef>,
        target_spec: Option<&PropertySpec>,
    ) -> Result<Script, LinkError>;

    /// Wires every spec entry of `triple` under `root`, returning how many scripts were
    /// attached.
    ///
    /// Failures are caught per entry: they are logged and the remaining entries are still
    /// wired, unless `ctx` is in strict mode.
    fn generate(
        &self,
        ctx: &LinkContext,
        root: &Model,
        triple: &LinkTriple,
    ) -> Result<usize, LinkError> {
        self.validate(triple)?;
        let mut attached = 0;
        for entry in self.specs(triple)? {
            if entry.source.is_event
                && triple.target.is_some()
                && entry.target.is_none()
                && entry.code.is_none()
            {
                tracing::debug!(
                    "skipping {}: an event needs a target property or explicit code",
                    entry.source
                );
                continue;
            }
            match attach_entry(self, ctx, root, triple, &entry) {
                Ok(count) => attached += count,
                Err(error) if ctx.config.strict => return Err(error),
                Err(error) => {
                    tracing::warn!(
                        "could not link {} of {}: {error}",
                        entry.source,
                        triple.source.type_name()
                    );
                }
            }
        }
        Ok(attached)
    }
}

/// The tag identifying the scripts generated for one entry of one declaration.
pub fn script_tag(declaration: &Declaration, entry: &SpecEntry) -> String {
    let target = entry
        .target
        .as_ref()
        .map(PropertySpec::to_string)
        .unwrap_or_default();
    format!("{}:{}:{target}", declaration.id(), entry.source)
}

fn attach_entry<G: CallbackGenerator + ?Sized>(
    generator: &G,
    ctx: &LinkContext,
    root: &Model,
    triple: &LinkTriple,
    entry: &SpecEntry,
) -> Result<usize, LinkError> {
    let declaration = &triple.declaration;
    let source_model = resolve_model(root, &triple.source, &entry.source.handle)?;
    let tag = script_tag(declaration, entry);
    if source_model.has_tagged_callback(&tag) {
        tracing::trace!("{tag} is already attached to {}", source_model.ref_id());
        return Ok(0);
    }

    let mut references: IndexMap<String, JsArg> = declaration
        .params()
        .iter()
        .map(|(name, value)| (name.clone(), JsArg::Value(value.clone())))
        .collect();
    references.insert("source".to_string(), JsArg::model(&source_model));

    let target_model = if declaration.requires_target() {
        let Some(target) = &triple.target else {
            return Err(ResolutionError::UnresolvedReference {
                type_name: format!("target of {}", declaration.kind()),
            }
            .into());
        };
        let handle = entry
            .target
            .as_ref()
            .map(|spec| spec.handle.as_slice())
            .unwrap_or_default();
        let model = resolve_model(root, target, handle)?;
        references.insert("target".to_string(), JsArg::model(&model));
        Some(model)
    } else {
        None
    };

    for (name, arg) in declaration.args() {
        match arg {
            Arg::Value(value) => {
                references.insert(name.clone(), JsArg::Value(value.clone()));
            }
            Arg::Object(object) => match object.upgrade() {
                Some(object) => match resolve_model(root, &object, &[]) {
                    Ok(model) => {
                        references.insert(name.clone(), JsArg::model(&model));
                    }
                    Err(error) => tracing::debug!("dropping argument {name}: {error}"),
                },
                None => tracing::debug!("dropping argument {name}: it is no longer alive"),
            },
        }
    }

    let endpoints = [("source", Some(&triple.source)), ("target", triple.target.as_ref())];
    for (prefix, object) in endpoints {
        let Some(plot) = object.and_then(|object| plot_of(root, object)) else {
            continue;
        };
        for (name, model) in plot.handles() {
            references
                .entry(format!("{prefix}_{name}"))
                .or_insert_with(|| JsArg::model(model));
        }
    }

    generator.initialize(
        triple,
        &source_model,
        &entry.source,
        target_model.as_ref(),
        entry.target.as_ref(),
    )?;
    generator.process_references(&mut references);

    let script = match &entry.code {
        Some(code) => Script {
            code: templates::guard(code),
            plan: ScriptPlan::Opaque,
        },
        None => generator.code(
            ctx,
            &triple.source,
            &entry.source,
            triple.target.as_ref(),
            entry.target.as_ref(),
        )?,
    };
    let callback = CustomJs::new(script.code)
        .with_args(references.clone())
        .with_tag(tag.clone())
        .with_plan(script.plan);
    if entry.source.is_event {
        source_model.js_on_event(&entry.source.name, callback);
    } else {
        source_model.js_on_change(&entry.source.name, callback);
    }
    let mut attached = 1;

    if !declaration.bidirectional() || entry.code.is_some() || entry.source.is_event {
        return Ok(attached);
    }
    let (Some(target), Some(target_model), Some(target_spec)) =
        (&triple.target, &target_model, &entry.target)
    else {
        return Ok(attached);
    };
    if !target_model.has_property(&target_spec.name) {
        return Err(LinkError::Generation(format!(
            "cannot link back from {:?}: the {} model of {} has no such property",
            target_spec.name,
            target_model.type_name(),
            target.type_name()
        )));
    }
    let reverse = generator.code(
        ctx,
        target,
        target_spec,
        Some(&triple.source),
        Some(&entry.source),
    )?;
    let mut reverse_references = references;
    if let (Some(source), Some(target)) = (
        reverse_references.get("source").cloned(),
        reverse_references.get("target").cloned(),
    ) {
        reverse_references.insert("source".to_string(), target);
        reverse_references.insert("target".to_string(), source);
    }
    target_model.js_on_change(
        &target_spec.name,
        CustomJs::new(reverse.code)
            .with_args(reverse_references)
            .with_tag(tag)
            .with_plan(reverse.plan),
    );
    attached += 1;
    Ok(attached)
}

/// Maps a plain semantic property of a component to the model property it renders to.
///
/// Dotted and event specs are left alone, as are properties rendered away entirely.
fn model_spec(object: &ObjectRef, spec: PropertySpec) -> PropertySpec {
    let ObjectRef::Component(component) = object else {
        return spec;
    };
    if spec.is_event || !spec.handle.is_empty() || !component.params().contains(&spec.name)
    {
        return spec;
    }
    match component.property_for(&spec.name) {
        Some(property) => PropertySpec {
            name: property.to_string(),
            ..spec
        },
        None => spec,
    }
}

fn code_specs(triple: &LinkTriple) -> Vec<SpecEntry> {
    triple
        .declaration
        .code()
        .iter()
        .map(|(spec, code)| SpecEntry {
            source: model_spec(&triple.source, PropertySpec::parse(spec)),
            target: None,
            code: Some(code.clone()),
        })
        .collect()
}

fn resolve_transform(
    object: &ObjectRef,
    spec: &PropertySpec,
    side: Side,
) -> Result<String, LinkError> {
    let found = if spec.handle.is_empty() {
        transform(object, &spec.name, side)
    } else {
        Transform::Identity
    };
    match found.expression() {
        Some(expression) => Ok(expression.to_string()),
        None => {
            let side = match side {
                Side::Source => "read from",
                Side::Target => "written to",
            };
            Err(LinkError::Generation(format!(
                "{:?} cannot be {side} {} on the client",
                spec.name,
                object.type_name()
            )))
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Realizes plain callbacks: explicit code attached to source properties and events.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsCallbackGenerator;

impl CallbackGenerator for JsCallbackGenerator {
    fn specs(&self, triple: &LinkTriple) -> Result<Vec<SpecEntry>, LinkError> {
        Ok(code_specs(triple))
    }

    fn code(
        &self,
        _ctx: &LinkContext,
        source: &ObjectRef,
        source_spec: &PropertySpec,
        _target: Option<&ObjectRef>,
        _target_spec: Option<&PropertySpec>,
    ) -> Result<Script, LinkError> {
        Err(LinkError::Generation(format!(
            "no code was supplied for {source_spec} of {}",
            source.type_name()
        )))
    }
}

/// Realizes property links with the client-code templates.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsLinkCallbackGenerator;

impl CallbackGenerator for JsLinkCallbackGenerator {
    fn specs(&self, triple: &LinkTriple) -> Result<Vec<SpecEntry>, LinkError> {
        let mut specs = code_specs(triple);
        for (source, target) in triple.declaration.properties() {
            let target_spec = PropertySpec::parse(target);
            specs.push(SpecEntry {
                source: model_spec(&triple.source, PropertySpec::parse(source)),
                target: Some(match &triple.target {
                    Some(object) => model_spec(object, target_spec),
                    None => target_spec,
                }),
                code: None,
            });
        }
        Ok(specs)
    }

    fn initialize(
        &self,
        triple: &LinkTriple,
        source_model: &Model,
        source_spec: &PropertySpec,
        target_model: Option<&Model>,
        target_spec: Option<&PropertySpec>,
    ) -> Result<(), LinkError> {
        let (Some(target_model), Some(target_spec)) = (target_model, target_spec) else {
            return Ok(());
        };
        if source_spec.is_event
            || target_spec.is_event
            || matches!(target_spec.name.as_str(), "value_throttled" | "loading")
        {
            return Ok(());
        }

        let from_params = match (&triple.source, &triple.target) {
            (ObjectRef::Component(source), Some(ObjectRef::Component(_)))
                if source_spec.handle.is_empty() =>
            {
                source
                    .param_for(&source_spec.name)
                    .and_then(|param| source.get(param))
            }
            _ => None,
        };
        let value = match from_params.or_else(|| source_model.get(&source_spec.name)) {
            Some(value) => value,
            None => {
                return Err(ResolutionError::MissingAttribute {
                    model: source_model.type_name().to_string(),
                    attribute: source_spec.name.clone(),
                }
                .into())
            }
        };
        if !is_truthy(&value) {
            return Ok(());
        }
        if !target_model.has_property(&target_spec.name) {
            tracing::warn!(
                "could not initialize {} on {}: no such property",
                target_spec.name,
                target_model.type_name()
            );
            return Ok(());
        }
        let value = match &triple.target {
            Some(target) if target_spec.handle.is_empty() => {
                transform(target, &target_spec.name, Side::Target).apply(value)
            }
            _ => value,
        };
        target_model.set(&target_spec.name, value)?;
        Ok(())
    }

    fn process_references(&self, references: &mut IndexMap<String, JsArg>) {
        let prefixed: Vec<String> = references
            .keys()
            .filter(|key| key.starts_with("target_"))
            .cloned()
            .collect();
        for key in prefixed {
            let bare = &key["target_".len()..];
            if references.contains_key(bare) {
                continue;
            }
            if let Some(arg) = references.shift_remove(&key) {
                references.insert(bare.to_string(), arg);
            }
        }
    }

    fn code(
        &self,
        ctx: &LinkContext,
        source: &ObjectRef,
        source_spec: &PropertySpec,
        target: Option<&ObjectRef>,
        target_spec: Option<&PropertySpec>,
    ) -> Result<Script, LinkError> {
        let (Some(target), Some(target_spec)) = (target, target_spec) else {
            return Err(LinkError::Generation(format!(
                "{source_spec} of {} is linked to no target property",
                source.type_name()
            )));
        };
        let spinner = ctx.config.loading_spinner.as_str();

        if target_spec.name == "loading" {
            let src_transform = if source_spec.is_event {
                "value".to_string()
            } else {
                resolve_transform(source, source_spec, Side::Source)?
            };
            let src_attr = if source_spec.is_event {
                source_spec.to_string()
            } else {
                source_spec.name.clone()
            };
            let code = templates::render(
                templates::LOADING_LINK_TEMPLATE,
                &[
                    ("src_attr", &src_attr),
                    ("src_transform", &src_transform),
                    ("loading_spinner", spinner),
                ],
            );
            return Ok(Script {
                code,
                plan: ScriptPlan::Loading {
                    source_attr: (!source_spec.is_event).then(|| source_spec.name.clone()),
                    spinner: spinner.to_string(),
                },
            });
        }

        let tgt_transform = resolve_transform(target, target_spec, Side::Target)?;
        if source_spec.is_event {
            return Ok(Script {
                code: templates::render(
                    templates::EVENT_LINK_TEMPLATE,
                    &[("tgt_attr", &target_spec.name)],
                ),
                plan: ScriptPlan::Assign {
                    source_attr: None,
                    target_attr: target_spec.name.clone(),
                    identity: true,
                },
            });
        }

        let src_transform = resolve_transform(source, source_spec, Side::Source)?;
        let identity = src_transform == "value" && tgt_transform == "value";
        let code = templates::render(
            templates::LINK_TEMPLATE,
            &[
                ("src_attr", &source_spec.name),
                ("tgt_attr", &target_spec.name),
                ("src_transform", &src_transform),
                ("tgt_transform", &tgt_transform),
            ],
        );
        Ok(Script {
            code,
            plan: ScriptPlan::Assign {
                source_attr: Some(source_spec.name.clone()),
                target_attr: target_spec.name.clone(),
                identity,
            },
        })
    }
}
