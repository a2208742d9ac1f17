use crate::{datamodel::create_linked_datamodel, error::ResolutionError};
use pane_model::{Model, ObjectRef, Plot};

/// Resolves the concrete model of `object` under `root`, then follows `handle`.
///
/// For a plot, the first handle segment may name one of the plot's internal handles;
/// without a handle the plot's outer container is returned. Any remaining segments are
/// followed as named sub-models.
pub fn resolve_model(
    root: &Model,
    object: &ObjectRef,
    handle: &[String],
) -> Result<Model, ResolutionError> {
    let (model, rest) = match object {
        ObjectRef::Model(model) => (model.clone(), handle),
        ObjectRef::Component(component) => match component.model(root.id()) {
            Some(model) => (model, handle),
            None => {
                return Err(ResolutionError::NotRendered {
                    type_name: component.type_name().to_string(),
                    root: root.id(),
                })
            }
        },
        ObjectRef::Params(params) => (create_linked_datamodel(params, root), handle),
        ObjectRef::Plot(plot) => match handle.split_first() {
            Some((first, rest)) => match plot.handle(first) {
                Some(model) => (model.clone(), rest),
                None => (plot.state().clone(), handle),
            },
            None => (plot.state().clone(), handle),
        },
    };
    traverse(model, rest)
}

fn traverse(model: Model, path: &[String]) -> Result<Model, ResolutionError> {
    path.iter().try_fold(model, |model, segment| {
        model
            .handle(segment)
            .ok_or_else(|| ResolutionError::MissingAttribute {
                model: model.type_name().to_string(),
                attribute: segment.clone(),
            })
    })
}

/// The backend plot behind `object` under `root`, if it has one.
pub fn plot_of(root: &Model, object: &ObjectRef) -> Option<Plot> {
    match object {
        ObjectRef::Plot(plot) => Some(plot.clone()),
        ObjectRef::Component(component) => component.plot(root.id()),
        _ => None,
    }
}

/// Whether `object` is present in the tree rendered under `root`.
pub fn is_rendered_under(root: &Model, object: &ObjectRef) -> bool {
    match object {
        ObjectRef::Component(component) => component.is_rendered(root.id()),
        ObjectRef::Model(model) => root.contains(model.id()),
        ObjectRef::Plot(plot) => root.contains(plot.state().id()),
        ObjectRef::Params(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_rendered_under, resolve_model};
    use crate::error::ResolutionError;
    use pane_model::{widgets, Document, Model, ObjectRef};

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn components_resolve_per_root() {
        let text = widgets::text_input("");
        let first = text.render(&Document::new()).unwrap();
        let other_root = Model::new("Column");

        let object = ObjectRef::from(&text);
        assert_eq!(resolve_model(&first, &object, &[]).unwrap(), first);
        assert!(matches!(
            resolve_model(&other_root, &object, &[]),
            Err(ResolutionError::NotRendered { .. })
        ));
        assert!(is_rendered_under(&first, &object));
        assert!(!is_rendered_under(&other_root, &object));
    }

    #[test]
    fn plots_resolve_handles() {
        let pane = widgets::plot_pane("");
        let root = pane.render(&Document::new()).unwrap();
        let plot = pane.plot(root.id()).unwrap();
        let object = ObjectRef::from(&plot);

        assert_eq!(resolve_model(&root, &object, &[]).unwrap(), root);
        let glyph = resolve_model(&root, &object, &path(&["glyph"])).unwrap();
        assert_eq!(glyph.type_name(), "Scatter");
        assert!(matches!(
            resolve_model(&root, &object, &path(&["legend"])),
            Err(ResolutionError::MissingAttribute { .. })
        ));

        // the component resolves to the same container, and dotted paths still work
        let via_pane = resolve_model(&root, &ObjectRef::from(&pane), &path(&["x_range"]));
        assert_eq!(via_pane.unwrap().type_name(), "Range1d");
    }

    #[test]
    fn models_resolve_to_themselves() {
        let root = Model::new("Column");
        let div = Model::new("Div");
        assert_eq!(resolve_model(&root, &ObjectRef::from(&div), &[]).unwrap(), div);
    }
}
