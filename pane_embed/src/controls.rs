//! Turning widgets into explorable controls.

use crate::error::EmbedError;
use indexmap::IndexMap;
use pane_model::{Component, Domain, Model, ObjectId, Value};
use rustc_hash::FxHashMap;
use serde_json::json;

/// Explicit values to explore, per widget.
pub type Samples = FxHashMap<ObjectId, Vec<Value>>;

/// One dimension of the explored state space.
///
/// Widgets sharing a display name are merged into a single control and always take the
/// same value.
#[derive(Clone, Debug)]
pub struct Control {
    pub name: String,
    pub widgets: Vec<Component>,
    /// The models of `widgets` under the explored root, in the same order.
    pub models: Vec<Model>,
    pub values: Vec<Value>,
    /// The model property the `value` parameter is rendered to.
    pub property: String,
    restore: Vec<Value>,
}

impl Control {
    /// The value the control had before exploration started.
    pub fn initial(&self) -> Value {
        self.restore.first().cloned().unwrap_or(Value::Null)
    }

    /// Puts every widget back to its value from before exploration.
    pub fn restore(&self) {
        for (widget, value) in self.widgets.iter().zip(&self.restore) {
            if let Err(error) = widget.params().set("value", value.clone()) {
                tracing::warn!("could not restore {}: {error}", widget.name());
            }
        }
    }
}

/// `count` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

/// The values to explore for `widget`.
///
/// Explicit samples win and are validated against the widget. Otherwise the values come
/// from the widget's domain; `None` means the domain cannot be enumerated.
pub fn sample_values(
    widget: &Component,
    explicit: Option<&Vec<Value>>,
    max_opts: usize,
) -> Result<Option<Vec<Value>>, EmbedError> {
    if let Some(values) = explicit {
        for value in values {
            widget.validate("value", value).map_err(|error| {
                EmbedError::Validation(format!(
                    "invalid sample for {}: {error}",
                    widget.name()
                ))
            })?;
        }
        return Ok(Some(values.clone()));
    }
    let values = match widget.domain() {
        Some(Domain::Options) => widget
            .get("options")
            .and_then(|options| options.as_array().cloned()),
        Some(Domain::Boolean) => Some(vec![json!(false), json!(true)]),
        Some(Domain::Range { integer }) => range_ticks(widget, integer, max_opts),
        Some(Domain::Unbounded) | None => None,
    };
    Ok(values.filter(|values| !values.is_empty()))
}

fn range_ticks(widget: &Component, integer: bool, max_opts: usize) -> Option<Vec<Value>> {
    let bound = |name: &str| widget.get(name).and_then(|value| value.as_f64());
    let ticks = linspace(bound("start")?, bound("end")?, max_opts);
    if !integer {
        return Some(ticks.into_iter().map(|tick| json!(tick)).collect());
    }
    let mut rounded: Vec<i64> = ticks.into_iter().map(|tick| tick.round() as i64).collect();
    rounded.dedup();
    Some(rounded.into_iter().map(|tick| json!(tick)).collect())
}

/// Groups sampled widgets by display name, keeping the first widget's values.
pub fn merge(sampled: Vec<(Component, Vec<Value>)>, root: &Model) -> Vec<Control> {
    let mut controls: IndexMap<String, Control> = IndexMap::new();
    for (widget, values) in sampled {
        let Some(model) = widget.model(root.id()) else {
            continue;
        };
        let initial = widget.get("value").unwrap_or(Value::Null);
        let name = widget.name();
        if let Some(control) = controls.get_mut(&name) {
            control.widgets.push(widget);
            control.models.push(model);
            control.restore.push(initial);
            continue;
        }
        let property = widget.property_for("value").unwrap_or("value").to_string();
        controls.insert(
            name.clone(),
            Control {
                name,
                widgets: vec![widget],
                models: vec![model],
                values,
                property,
                restore: vec![initial],
            },
        );
    }
    controls.into_values().collect()
}

/// The number of full combinations, saturating on overflow.
pub fn state_count(controls: &[Control]) -> usize {
    controls
        .iter()
        .try_fold(1usize, |count, control| count.checked_mul(control.values.len()))
        .unwrap_or(usize::MAX)
}

/// The key a sampled value is recorded under.
pub fn label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{label, linspace, merge, sample_values, state_count};
    use crate::error::EmbedError;
    use pane_model::{json, widgets, Document};

    #[test]
    fn linspace_includes_both_bounds() {
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
        assert_eq!(linspace(2.0, 4.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn domains_are_derived_from_the_widget() {
        let select = widgets::select(&["A", "B", "C"]);
        assert_eq!(
            sample_values(&select, None, 3).unwrap(),
            Some(vec![json!("A"), json!("B"), json!("C")])
        );

        let checkbox = widgets::checkbox(false);
        assert_eq!(
            sample_values(&checkbox, None, 3).unwrap(),
            Some(vec![json!(false), json!(true)])
        );

        let slider = widgets::int_slider(0, 10, 0);
        assert_eq!(
            sample_values(&slider, None, 3).unwrap(),
            Some(vec![json!(0), json!(5), json!(10)])
        );
        let narrow = widgets::int_slider(0, 1, 0);
        assert_eq!(
            sample_values(&narrow, None, 4).unwrap(),
            Some(vec![json!(0), json!(1)])
        );

        let floats = widgets::float_slider(0.0, 1.0, 0.0);
        assert_eq!(
            sample_values(&floats, None, 3).unwrap(),
            Some(vec![json!(0.0), json!(0.5), json!(1.0)])
        );

        assert_eq!(sample_values(&widgets::text_input(""), None, 3).unwrap(), None);
    }

    #[test]
    fn explicit_samples_are_validated() {
        let slider = widgets::int_slider(0, 10, 0);
        let samples = vec![json!(1), json!(2)];
        assert_eq!(
            sample_values(&slider, Some(&samples), 3).unwrap(),
            Some(samples.clone())
        );
        let invalid = vec![json!(1), json!(99)];
        assert!(matches!(
            sample_values(&slider, Some(&invalid), 3),
            Err(EmbedError::Validation(_))
        ));
    }

    #[test]
    fn widgets_with_the_same_name_are_merged() {
        let a = widgets::select(&["x", "y"]).with("name", json!("Pick")).unwrap();
        let b = widgets::select(&["x", "y"]).with("name", json!("Pick")).unwrap();
        let c = widgets::checkbox(false);
        let layout = widgets::column([a.clone(), b.clone(), c.clone()]);
        let root = layout.render(&Document::new()).unwrap();

        let controls = merge(
            vec![
                (a, vec![json!("x"), json!("y")]),
                (b, vec![json!("x")]),
                (c, vec![json!(false), json!(true)]),
            ],
            &root,
        );
        assert_eq!(controls.len(), 2);
        assert_eq!(controls[0].widgets.len(), 2);
        assert_eq!(controls[0].values.len(), 2);
        assert_eq!(controls[1].property, "active");
        assert_eq!(state_count(&controls), 4);
    }

    #[test]
    fn labels() {
        assert_eq!(label(&json!("A")), "A");
        assert_eq!(label(&json!(3)), "3");
        assert_eq!(label(&json!(true)), "true");
    }
}
