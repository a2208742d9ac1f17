//! The catalogue of component types the link engine is exercised against.

use crate::{
    component::{Component, ComponentType, Domain, RenameTable, Role},
    model::Model,
    plot::Plot,
};
use indexmap::IndexMap;
use serde_json::{json, Value};

const WIDGET_RENAME: RenameTable = &[("name", Some("title")), ("loading", None)];
const PANE_RENAME: RenameTable = &[("name", None), ("loading", None)];

pub static TEXT_INPUT: ComponentType = ComponentType {
    name: "TextInput",
    model_type: "TextInput",
    defaults: || {
        vec![
            ("value", json!("")),
            ("placeholder", json!("")),
            ("disabled", json!(false)),
        ]
    },
    rename: WIDGET_RENAME,
    source_transforms: &[],
    target_transforms: &[],
    role: Role::Widget(Domain::Unbounded),
    build_plot: None,
};

pub static SELECT: ComponentType = ComponentType {
    name: "Select",
    model_type: "Select",
    defaults: || {
        vec![
            ("options", json!([])),
            ("value", Value::Null),
            ("disabled", json!(false)),
        ]
    },
    rename: WIDGET_RENAME,
    source_transforms: &[],
    target_transforms: &[],
    role: Role::Widget(Domain::Options),
    build_plot: None,
};

pub static INT_SLIDER: ComponentType = ComponentType {
    name: "IntSlider",
    model_type: "Slider",
    defaults: || {
        vec![
            ("start", json!(0)),
            ("end", json!(1)),
            ("step", json!(1)),
            ("value", json!(0)),
            ("value_throttled", json!(0)),
            ("disabled", json!(false)),
        ]
    },
    rename: WIDGET_RENAME,
    source_transforms: &[],
    target_transforms: &[],
    role: Role::Widget(Domain::Range { integer: true }),
    build_plot: None,
};

pub static FLOAT_SLIDER: ComponentType = ComponentType {
    name: "FloatSlider",
    model_type: "Slider",
    defaults: || {
        vec![
            ("start", json!(0.0)),
            ("end", json!(1.0)),
            ("step", json!(0.1)),
            ("value", json!(0.0)),
            ("value_throttled", json!(0.0)),
            ("disabled", json!(false)),
        ]
    },
    rename: WIDGET_RENAME,
    source_transforms: &[],
    target_transforms: &[],
    role: Role::Widget(Domain::Range { integer: false }),
    build_plot: None,
};

/// Values are epoch milliseconds on the server and dates on the client, so none of the
/// value parameters can be linked without the server.
pub static DATETIME_SLIDER: ComponentType = ComponentType {
    name: "DatetimeSlider",
    model_type: "DatetimeSlider",
    defaults: || {
        vec![
            ("start", json!(0)),
            ("end", json!(86_400_000)),
            ("value", json!(0)),
            ("value_throttled", json!(0)),
            ("disabled", json!(false)),
        ]
    },
    rename: WIDGET_RENAME,
    source_transforms: &[
        ("value", None),
        ("value_throttled", None),
        ("start", None),
        ("end", None),
    ],
    target_transforms: &[],
    role: Role::Widget(Domain::Range { integer: true }),
    build_plot: None,
};

pub static CHECKBOX: ComponentType = ComponentType {
    name: "Checkbox",
    model_type: "Checkbox",
    defaults: || vec![("value", json!(false)), ("disabled", json!(false))],
    rename: &[
        ("name", Some("title")),
        ("loading", None),
        ("value", Some("active")),
    ],
    source_transforms: &[],
    target_transforms: &[],
    role: Role::Widget(Domain::Boolean),
    build_plot: None,
};

pub static BUTTON: ComponentType = ComponentType {
    name: "Button",
    model_type: "Button",
    defaults: || {
        vec![
            ("clicks", json!(0)),
            ("button_type", json!("default")),
            ("disabled", json!(false)),
        ]
    },
    rename: &[("name", Some("label")), ("loading", None), ("clicks", None)],
    source_transforms: &[],
    target_transforms: &[],
    role: Role::Widget(Domain::Unbounded),
    build_plot: None,
};

pub static STATIC_TEXT: ComponentType = ComponentType {
    name: "StaticText",
    model_type: "Div",
    defaults: || vec![("value", json!(""))],
    rename: &[("name", None), ("loading", None), ("value", Some("text"))],
    source_transforms: &[],
    target_transforms: &[("value", Some("String(value)"))],
    role: Role::Display,
    build_plot: None,
};

/// Markdown is rendered to HTML on the server.
pub static MARKDOWN: ComponentType = ComponentType {
    name: "Markdown",
    model_type: "Markdown",
    defaults: || vec![("object", json!(""))],
    rename: &[("name", None), ("loading", None), ("object", Some("text"))],
    source_transforms: &[],
    target_transforms: &[("object", None)],
    role: Role::Pane,
    build_plot: None,
};

pub static COLUMN: ComponentType = ComponentType {
    name: "Column",
    model_type: "Column",
    defaults: Vec::new,
    rename: PANE_RENAME,
    source_transforms: &[],
    target_transforms: &[],
    role: Role::Layout,
    build_plot: None,
};

pub static PLOT_PANE: ComponentType = ComponentType {
    name: "PlotPane",
    model_type: "Figure",
    defaults: || vec![("title", json!(""))],
    rename: PANE_RENAME,
    source_transforms: &[],
    target_transforms: &[],
    role: Role::PlotPane,
    build_plot: Some(build_figure),
};

fn build_figure(state: Model) -> Plot {
    let range = || {
        Model::new("Range1d")
            .with_property("start", json!(0.0))
            .with_property("end", json!(1.0))
    };
    let handles: IndexMap<String, Model> = [
        ("x_range", range()),
        ("y_range", range()),
        (
            "glyph",
            Model::new("Scatter")
                .with_property("size", json!(6))
                .with_property("fill_color", json!("#1f77b4")),
        ),
        (
            "source",
            Model::new("ColumnDataSource").with_property("data", json!({})),
        ),
    ]
    .into_iter()
    .map(|(name, model)| (name.to_string(), model))
    .collect();
    Plot::new(state, handles)
}

pub fn text_input(value: &str) -> Component {
    Component::new_with(&TEXT_INPUT, [("value", json!(value))])
}

/// A select whose value starts at the first option.
pub fn select(options: &[&str]) -> Component {
    let value = options.first().map_or(Value::Null, |first| json!(first));
    Component::new_with(&SELECT, [("options", json!(options)), ("value", value)])
}

pub fn int_slider(start: i64, end: i64, value: i64) -> Component {
    Component::new_with(
        &INT_SLIDER,
        [
            ("start", json!(start)),
            ("end", json!(end)),
            ("value", json!(value)),
            ("value_throttled", json!(value)),
        ],
    )
}

pub fn float_slider(start: f64, end: f64, value: f64) -> Component {
    Component::new_with(
        &FLOAT_SLIDER,
        [
            ("start", json!(start)),
            ("end", json!(end)),
            ("value", json!(value)),
            ("value_throttled", json!(value)),
        ],
    )
}

pub fn datetime_slider(start: i64, end: i64, value: i64) -> Component {
    Component::new_with(
        &DATETIME_SLIDER,
        [
            ("start", json!(start)),
            ("end", json!(end)),
            ("value", json!(value)),
            ("value_throttled", json!(value)),
        ],
    )
}

pub fn checkbox(value: bool) -> Component {
    Component::new_with(&CHECKBOX, [("value", json!(value))])
}

pub fn button(label: &str) -> Component {
    Component::new_with(&BUTTON, [("name", json!(label))])
}

pub fn static_text(value: &str) -> Component {
    Component::new_with(&STATIC_TEXT, [("value", json!(value))])
}

pub fn markdown(text: &str) -> Component {
    Component::new_with(&MARKDOWN, [("object", json!(text))])
}

pub fn column(children: impl IntoIterator<Item = Component>) -> Component {
    Component::new(&COLUMN).with_children(children)
}

pub fn plot_pane(title: &str) -> Component {
    Component::new_with(&PLOT_PANE, [("title", json!(title))])
}
