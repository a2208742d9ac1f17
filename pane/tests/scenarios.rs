use pane::prelude::*;

fn quiet() -> LinkContext {
    LinkContext::new(
        PaneConfig::builder()
            .embed(EmbedOptions::builder().progress(false).build())
            .build(),
    )
}

#[test]
fn text_inputs_stay_in_sync_in_the_browser() {
    let a = widgets::text_input("");
    let b = widgets::text_input("");
    a.jslink(&b)
        .property("value", "value")
        .bidirectional(true)
        .register()
        .unwrap();
    let app = widgets::column([a.clone(), b.clone()]);
    let document = Document::new();

    let rendered = render(&quiet(), &app, &document).unwrap();
    assert_eq!(rendered.attachments.len(), 1);
    assert_eq!(rendered.attachments[0].root, rendered.root.id());

    let model_a = a.model(rendered.root.id()).unwrap();
    let model_b = b.model(rendered.root.id()).unwrap();
    client::set_property(&model_a, "value", json!("ABC")).unwrap();
    assert_eq!(model_b.get("value"), Some(json!("ABC")));
    client::set_property(&model_b, "value", json!("DEF")).unwrap();
    assert_eq!(model_a.get("value"), Some(json!("DEF")));
    assert_eq!(a.get("value"), Some(json!("DEF")));
}

#[test]
fn each_render_gets_its_own_scripts() {
    let a = widgets::text_input("");
    let b = widgets::text_input("");
    a.jslink(&b).property("value", "value").register().unwrap();
    let app = widgets::column([a.clone(), b.clone()]);

    let first = render(&quiet(), &app, &Document::new()).unwrap();
    let second = render(&quiet(), &app, &Document::new()).unwrap();
    assert_eq!(first.attachments.len(), 1);
    assert_eq!(second.attachments.len(), 1);

    for root in [&first.root, &second.root] {
        let callbacks = a.model(root.id()).unwrap().property_callbacks("value");
        assert_eq!(callbacks.len(), 1);
        assert_eq!(callbacks[0].arg_model("target"), b.model(root.id()));
    }
}

#[test]
fn static_pages_carry_the_recorded_states() {
    let select = widgets::select(&["A", "B", "C"]);
    let text = widgets::static_text("");
    select
        .link_with(&text, &[("value", "value")], |target, event| {
            let shown = event.new.as_str().unwrap_or_default().to_string();
            target
                .set("value", json!(format!("Selected: {shown}")))
                .map(|_| ())
        })
        .unwrap();
    let app = widgets::column([select.clone(), text]);
    let document = Document::new();

    let (rendered, state) =
        render_static(&quiet(), &app, &document, &Samples::default()).unwrap();
    let state = state.unwrap();
    assert!(rendered.attachments.is_empty());
    assert_eq!(
        state.state.keys().map(String::as_str).collect::<Vec<_>>(),
        ["C", "B", "A"]
    );
    assert!(state.state["B"]["content"]
        .as_str()
        .unwrap()
        .contains("Selected: B"));
    assert_eq!(document.roots().len(), 2);
    assert_eq!(select.get("value"), Some(json!("A")));
}

#[test]
fn teardown_releases_links_and_rendered_models() {
    let a = widgets::text_input("");
    let b = widgets::text_input("");
    a.jslink(&b).property("value", "value").register().unwrap();
    let app = widgets::column([a.clone(), b.clone()]);
    let rendered = render(&quiet(), &app, &Document::new()).unwrap();
    assert!(Registry::contains(a.id()));

    assert_eq!(teardown(&app), 1);
    assert!(!Registry::contains(a.id()));
    assert!(!Registry::contains(b.id()));
    assert!(a.model(rendered.root.id()).is_none());
    assert!(app.models().is_empty());
}

#[test]
fn render_errors_surface_through_the_facade() {
    let a = widgets::text_input("");
    let b = widgets::text_input("");
    let error = a.jslink(&b).register().unwrap_err();
    let error = PaneError::from(error);
    assert!(matches!(error, PaneError::Link(LinkError::Configuration(_))));
}
