//! Client-side code templates.
//!
//! Placeholders are `{name}`; every other brace is JavaScript.

/// Copies a source property onto a target property through both transforms.
pub const LINK_TEMPLATE: &str = r#"
var value = source['{src_attr}'];
value = {src_transform};
value = {tgt_transform};
try {
  var property = target.properties['{tgt_attr}'];
  if (property !== undefined) { property.validate(value); }
} catch(err) {
  console.log('WARNING: Could not set {tgt_attr} on target, raised error: ' + err);
  return;
}
try {
  target['{tgt_attr}'] = value;
} catch(err) {
  console.log(err)
}
"#;

/// Sets a target property to `true` whenever a source event fires.
pub const EVENT_LINK_TEMPLATE: &str = r#"
var value = true
try {
  var property = target.properties['{tgt_attr}'];
  if (property !== undefined) { property.validate(value); }
} catch(err) {
  console.log('WARNING: Could not set {tgt_attr} on target, raised error: ' + err);
  return;
}
try {
  target['{tgt_attr}'] = value;
} catch(err) {
  console.log(err)
}
"#;

/// Toggles the loading classes on the target instead of assigning a property.
pub const LOADING_LINK_TEMPLATE: &str = r#"
if ('{src_attr}'.startsWith('event:')) {
  var value = true
} else {
  var value = source['{src_attr}'];
  value = {src_transform};
}
if (typeof value !== 'boolean') {
  value = true
}
var css_classes = target.css_classes.slice()
if (value && css_classes.indexOf('pn-loading') === -1) {
  css_classes.push('pn-loading')
  css_classes.push('{loading_spinner}')
} else if (!value && css_classes.indexOf('pn-loading') > -1) {
  var index = css_classes.indexOf('pn-loading')
  css_classes.splice(index, 1)
  var spinner_index = css_classes.indexOf('{loading_spinner}')
  if (spinner_index > -1) {
    css_classes.splice(spinner_index, 1)
  }
}
target['css_classes'] = css_classes
"#;

/// Fills the `{name}` placeholders of `template`.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |code, (name, value)| {
            code.replace(&format!("{{{name}}}"), value)
        })
}

/// Wraps user code so that a failure is logged on the client instead of propagating.
pub fn guard(code: &str) -> String {
    format!("try {{ {code} }} catch(err) {{ console.log(err) }}")
}

#[cfg(test)]
mod tests {
    use super::{guard, render, EVENT_LINK_TEMPLATE};

    #[test]
    fn only_named_placeholders_are_replaced() {
        let code = render(EVENT_LINK_TEMPLATE, &[("tgt_attr", "active")]);
        assert!(code.contains("target['active'] = value;"));
        assert!(code.contains("if (property !== undefined) { property.validate(value); }"));
        assert!(!code.contains("{tgt_attr}"));
    }

    #[test]
    fn guard_wraps_code() {
        assert_eq!(
            guard("target.text = source.value"),
            "try { target.text = source.value } catch(err) { console.log(err) }"
        );
    }
}
