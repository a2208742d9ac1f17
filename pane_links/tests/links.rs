use pane_links::{
    discover, process_callbacks, CallbackGenerator, DeclarationBuilder, DeclarationKind,
    GeneratorTable, JsLinkExt, LinkContext, LinkError, LinkTriple, PropertySpec, Script,
    SpecEntry,
};
use pane_model::{
    client, json, widgets, Component, Document, JsArg, Model, ObjectRef, Parameterized,
    ScriptPlan,
};

fn render(component: &Component) -> (Document, Model) {
    let document = Document::new();
    let root = component.render(&document).unwrap();
    (document, root)
}

fn model_of(component: &Component, root: &Model) -> Model {
    component.model(root.id()).unwrap()
}

#[test]
fn link_code_matches_the_template_exactly() {
    let a = widgets::text_input("");
    let b = widgets::text_input("");
    let declaration = a.jslink(&b).property("value", "value").register().unwrap();
    let layout = widgets::column([a.clone(), b.clone()]);
    let (_document, root) = render(&layout);

    let attachments = process_callbacks(&LinkContext::default(), &layout, &root).unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].declaration, declaration);
    assert_eq!(attachments[0].scripts, 1);

    let callbacks = model_of(&a, &root).property_callbacks("value");
    assert_eq!(callbacks.len(), 1);
    let expected = r#"
var value = source['value'];
value = value;
value = value;
try {
  var property = target.properties['value'];
  if (property !== undefined) { property.validate(value); }
} catch(err) {
  console.log('WARNING: Could not set value on target, raised error: ' + err);
  return;
}
try {
  target['value'] = value;
} catch(err) {
  console.log(err)
}
"#;
    assert_eq!(callbacks[0].code, expected);
    assert_eq!(callbacks[0].arg_model("source"), Some(model_of(&a, &root)));
    assert_eq!(callbacks[0].arg_model("target"), Some(model_of(&b, &root)));
    assert_eq!(
        callbacks[0].tags,
        vec![format!("{}:value:value", declaration.id())]
    );
}

#[test]
fn transforms_are_spliced_into_the_pipeline() {
    let checkbox = widgets::checkbox(false);
    let text = widgets::static_text("");
    checkbox.jslink(&text).property("value", "value").register().unwrap();
    let layout = widgets::column([checkbox.clone(), text.clone()]);
    let (_document, root) = render(&layout);
    process_callbacks(&LinkContext::default(), &layout, &root).unwrap();

    let callbacks = model_of(&checkbox, &root).property_callbacks("active");
    assert_eq!(callbacks.len(), 1);
    assert!(callbacks[0]
        .code
        .starts_with("\nvar value = source['active'];\nvalue = value;\nvalue = String(value);\n"));
    assert!(callbacks[0].code.contains("target['text'] = value;"));
    assert_eq!(
        callbacks[0].plan,
        ScriptPlan::Assign {
            source_attr: Some("active".into()),
            target_attr: "text".into(),
            identity: false,
        }
    );
}

#[test]
fn repeated_discovery_attaches_nothing_new() {
    let a = widgets::text_input("");
    let b = widgets::text_input("");
    a.jslink(&b).property("value", "value").register().unwrap();
    let layout = widgets::column([a.clone(), b.clone()]);
    let (_document, root) = render(&layout);
    let ctx = LinkContext::default();

    assert_eq!(process_callbacks(&ctx, &layout, &root).unwrap().len(), 1);
    assert!(process_callbacks(&ctx, &layout, &root).unwrap().is_empty());
    assert_eq!(model_of(&a, &root).property_callbacks("value").len(), 1);
}

#[test]
fn links_are_wired_per_root() {
    let a = widgets::text_input("");
    let b = widgets::text_input("");
    a.jslink(&b).property("value", "value").register().unwrap();

    let both = widgets::column([a.clone(), b.clone()]);
    let (_first_document, first) = render(&both);
    let only_a = widgets::column([a.clone()]);
    let (_second_document, second) = render(&only_a);

    // b is visible but not rendered under the second root
    let visible = [ObjectRef::from(&a), ObjectRef::from(&b)];
    let attachments = discover(&LinkContext::default(), &second, &visible).unwrap();
    assert!(attachments.is_empty());
    assert!(model_of(&a, &second).js_property_callbacks().is_empty());

    let attachments = process_callbacks(&LinkContext::default(), &both, &first).unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].root, first.id());
    assert!(model_of(&a, &second).js_property_callbacks().is_empty());
}

#[test]
fn bidirectional_links_round_trip() {
    let a = widgets::text_input("");
    let b = widgets::text_input("");
    a.jslink(&b)
        .property("value", "value")
        .bidirectional(true)
        .register()
        .unwrap();
    let layout = widgets::column([a.clone(), b.clone()]);
    let (_document, root) = render(&layout);
    let attachments = process_callbacks(&LinkContext::default(), &layout, &root).unwrap();
    assert_eq!(attachments[0].scripts, 2);

    let (model_a, model_b) = (model_of(&a, &root), model_of(&b, &root));
    let reverse = model_b.property_callbacks("value");
    assert_eq!(reverse.len(), 1);
    assert_eq!(reverse[0].arg_model("source"), Some(model_b.clone()));
    assert_eq!(reverse[0].arg_model("target"), Some(model_a.clone()));

    client::set_property(&model_a, "value", json!("ABC")).unwrap();
    assert_eq!(model_b.get("value"), Some(json!("ABC")));
    assert_eq!(b.get("value"), Some(json!("ABC")));

    client::set_property(&model_b, "value", json!("DEF")).unwrap();
    assert_eq!(model_a.get("value"), Some(json!("DEF")));
    assert_eq!(a.get("value"), Some(json!("DEF")));
}

#[test]
fn initial_values_are_pushed_to_the_target() {
    let slider = widgets::int_slider(0, 10, 4);
    let other = widgets::int_slider(0, 10, 0);
    slider
        .jslink(&other)
        .property("value", "value")
        .property("value_throttled", "value_throttled")
        .register()
        .unwrap();
    let layout = widgets::column([slider.clone(), other.clone()]);
    let (_document, root) = render(&layout);
    process_callbacks(&LinkContext::default(), &layout, &root).unwrap();

    let model = model_of(&other, &root);
    assert_eq!(model.get("value"), Some(json!(4)));
    assert_eq!(other.get("value"), Some(json!(4)));
    assert_eq!(model.get("value_throttled"), Some(json!(0)));
}

#[test]
fn initial_values_follow_the_target_conversion() {
    let slider = widgets::int_slider(0, 10, 4);
    let text = widgets::static_text("");
    slider.jslink(&text).property("value", "value").register().unwrap();
    let layout = widgets::column([slider.clone(), text.clone()]);
    let (_document, root) = render(&layout);
    process_callbacks(&LinkContext::default(), &layout, &root).unwrap();

    assert_eq!(model_of(&text, &root).get("text"), Some(json!("4")));
    assert_eq!(slider.get("value"), Some(json!(4)));
}

#[test]
fn refused_transforms_fail_only_their_entry() {
    let slider = widgets::datetime_slider(0, 100, 50);
    let text = widgets::text_input("");
    DeclarationBuilder::link(&slider, &text)
        .property("value", "value")
        .property("name", "placeholder")
        .register()
        .unwrap();
    let layout = widgets::column([slider.clone(), text.clone()]);
    let (_document, root) = render(&layout);

    let error = process_callbacks(&LinkContext::default().strict(), &layout, &root).unwrap_err();
    assert!(matches!(error, LinkError::Generation(_)));
    assert!(error.to_string().contains("DatetimeSlider"));

    let attachments = process_callbacks(&LinkContext::default(), &layout, &root).unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].scripts, 1);
    let model = model_of(&slider, &root);
    assert!(model.property_callbacks("value").is_empty());
    assert_eq!(model.property_callbacks("title").len(), 1);
}

#[test]
fn missing_target_property_names_both_types() {
    let text = widgets::text_input("");
    let layout = widgets::column([]);
    let error = text.jslink(&layout).property("value", "value").register().unwrap_err();
    assert!(matches!(error, LinkError::Configuration(_)));
    let message = error.to_string();
    assert!(message.contains("TextInput"));
    assert!(message.contains("Column"));
}

#[test]
fn plot_handles_are_merged_into_the_references() {
    let slider = widgets::int_slider(1, 20, 8);
    let pane = widgets::plot_pane("Scatter");
    slider.jslink(&pane).property("value", "glyph.size").register().unwrap();
    let layout = widgets::column([slider.clone(), pane.clone()]);
    let (_document, root) = render(&layout);
    process_callbacks(&LinkContext::default(), &layout, &root).unwrap();

    let plot = pane.plot(root.id()).unwrap();
    let glyph = plot.handle("glyph").unwrap().clone();
    assert_eq!(glyph.get("size"), Some(json!(8)));

    let callbacks = model_of(&slider, &root).property_callbacks("value");
    assert_eq!(callbacks.len(), 1);
    let keys: Vec<&str> = callbacks[0].args.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["source", "target", "target_source", "x_range", "y_range", "glyph"]
    );
    assert_eq!(callbacks[0].arg_model("target"), Some(glyph.clone()));
    assert_eq!(callbacks[0].arg_model("glyph"), Some(glyph.clone()));

    client::set_property(&model_of(&slider, &root), "value", json!(12)).unwrap();
    assert_eq!(glyph.get("size"), Some(json!(12)));
}

#[test]
fn plain_objects_are_linked_through_a_proxy() {
    let settings = Parameterized::new("Settings", [("size", json!(1))]);
    let slider = widgets::int_slider(0, 10, 3);
    slider.jslink(&settings).property("value", "size").register().unwrap();
    let layout = widgets::column([slider.clone()]);
    let (_document, root) = render(&layout);

    let attachments = process_callbacks(&LinkContext::default(), &layout, &root).unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(settings.get("size"), Some(json!(3)));

    let proxy = root
        .references()
        .into_iter()
        .find(|model| model.type_name() == "Settings")
        .unwrap();
    client::set_property(&model_of(&slider, &root), "value", json!(8)).unwrap();
    assert_eq!(proxy.get("size"), Some(json!(8)));
    assert_eq!(settings.get("size"), Some(json!(8)));
}

#[test]
fn events_assign_true_and_toggle_loading() {
    let button = widgets::button("Run");
    let checkbox = widgets::checkbox(false);
    let text = widgets::text_input("");
    button
        .jslink(&checkbox)
        .property("event:button_click", "value")
        .register()
        .unwrap();
    button
        .jslink(&text)
        .property("event:button_click", "loading")
        .register()
        .unwrap();
    let layout = widgets::column([button.clone(), checkbox.clone(), text.clone()]);
    let (_document, root) = render(&layout);
    let ctx = LinkContext::new(pane_config::PaneConfig::builder().loading_spinner("spin").build());
    process_callbacks(&ctx, &layout, &root).unwrap();

    let button_model = model_of(&button, &root);
    let callbacks = button_model.event_callbacks("button_click");
    assert_eq!(callbacks.len(), 2);
    assert!(callbacks[0].code.starts_with("\nvar value = true\n"));
    assert!(callbacks[0].code.contains("target['active'] = value;"));
    assert!(callbacks[1].code.contains("if ('event:button_click'.startsWith('event:')) {"));
    assert!(callbacks[1].code.contains("css_classes.push('spin')"));

    client::trigger_event(&button_model, "button_click");
    assert_eq!(checkbox.get("value"), Some(json!(true)));
    assert_eq!(
        model_of(&text, &root).get("css_classes"),
        Some(json!(["pn-loading", "spin"]))
    );
}

#[test]
fn events_without_a_target_property_are_skipped() {
    let button = widgets::button("Run");
    let text = widgets::text_input("");
    DeclarationBuilder::link(&button, &text)
        .code("event:button_click", "target.value = 'clicked'")
        .register()
        .unwrap();
    let layout = widgets::column([button.clone(), text.clone()]);
    let (_document, root) = render(&layout);
    process_callbacks(&LinkContext::default(), &layout, &root).unwrap();

    let callbacks = model_of(&button, &root).event_callbacks("button_click");
    assert_eq!(callbacks.len(), 1);
    assert_eq!(
        callbacks[0].code,
        "try { target.value = 'clicked' } catch(err) { console.log(err) }"
    );
    assert_eq!(callbacks[0].plan, ScriptPlan::Opaque);
}

#[test]
fn callbacks_receive_their_arguments() {
    let select = widgets::select(&["A", "B"]);
    let text = widgets::static_text("");
    select
        .jscallback()
        .on("value", "target.text = source.value + suffix")
        .arg("target", pane_links::Arg::object(&text))
        .arg("suffix", pane_links::Arg::value("!"))
        .register()
        .unwrap();
    let layout = widgets::column([select.clone(), text.clone()]);
    let (_document, root) = render(&layout);
    process_callbacks(&LinkContext::default(), &layout, &root).unwrap();

    let callbacks = model_of(&select, &root).property_callbacks("value");
    assert_eq!(callbacks.len(), 1);
    assert_eq!(callbacks[0].arg_model("source"), Some(model_of(&select, &root)));
    assert_eq!(callbacks[0].arg_model("target"), Some(model_of(&text, &root)));
    assert!(matches!(callbacks[0].args.get("suffix"), Some(JsArg::Value(value)) if value == "!"));
}

struct ClickCounter;

impl CallbackGenerator for ClickCounter {
    fn specs(&self, _triple: &LinkTriple) -> Result<Vec<SpecEntry>, LinkError> {
        Ok(vec![SpecEntry {
            source: PropertySpec::parse("event:button_click"),
            target: None,
            code: None,
        }])
    }

    fn code(
        &self,
        _ctx: &LinkContext,
        _source: &ObjectRef,
        _source_spec: &PropertySpec,
        _target: Option<&ObjectRef>,
        _target_spec: Option<&PropertySpec>,
    ) -> Result<Script, LinkError> {
        Ok(Script {
            code: "count += 1; console.log(count, limit)".to_string(),
            plan: ScriptPlan::Opaque,
        })
    }
}

#[test]
fn custom_kinds_use_their_registered_generator() {
    let button = widgets::button("Count");
    DeclarationBuilder::new(DeclarationKind::Custom("ClickCounter"), &button)
        .param("limit", json!(3))
        .register()
        .unwrap();
    let layout = widgets::column([button.clone()]);
    let (_document, root) = render(&layout);

    // without a generator the declaration is skipped
    assert!(process_callbacks(&LinkContext::default(), &layout, &root)
        .unwrap()
        .is_empty());

    let mut generators = GeneratorTable::default();
    generators.register_callback(DeclarationKind::Custom("ClickCounter"), ClickCounter);
    let ctx = LinkContext::default().with_generators(generators);
    let attachments = process_callbacks(&ctx, &layout, &root).unwrap();
    assert_eq!(attachments.len(), 1);

    let callbacks = model_of(&button, &root).event_callbacks("button_click");
    assert_eq!(callbacks.len(), 1);
    let keys: Vec<&str> = callbacks[0].args.keys().map(String::as_str).collect();
    assert_eq!(keys, ["limit", "source"]);
}
