use std::fmt;

/// A parsed property spec: `"prop"`, `"handle.sub.prop"` or `"event:name"`.
///
/// Everything before the last dot is the handle path used to find the model; the last
/// segment is the property (or event) itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertySpec {
    pub handle: Vec<String>,
    pub name: String,
    pub is_event: bool,
}

impl PropertySpec {
    pub fn parse(spec: &str) -> Self {
        if let Some(event) = spec.strip_prefix("event:") {
            return Self {
                handle: Vec::new(),
                name: event.to_string(),
                is_event: true,
            };
        }
        match spec.rsplit_once('.') {
            Some((handle, name)) => Self {
                handle: handle.split('.').map(str::to_string).collect(),
                name: name.to_string(),
                is_event: false,
            },
            None => Self {
                handle: Vec::new(),
                name: spec.to_string(),
                is_event: false,
            },
        }
    }
}

impl fmt::Display for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_event {
            return write!(f, "event:{}", self.name);
        }
        for segment in &self.handle {
            write!(f, "{segment}.")?;
        }
        f.write_str(&self.name)
    }
}

impl From<&str> for PropertySpec {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}
