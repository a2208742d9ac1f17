use crate::{
    declaration::DeclarationKind,
    generator::{CallbackGenerator, JsCallbackGenerator, JsLinkCallbackGenerator},
};
use pane_config::PaneConfig;
use rustc_hash::FxHashMap;
use std::{fmt, sync::Arc};

/// The generators used to realize each kind of declaration.
#[derive(Clone)]
pub struct GeneratorTable {
    generators: FxHashMap<DeclarationKind, Arc<dyn CallbackGenerator>>,
}

impl GeneratorTable {
    /// A table with no generators at all.
    pub fn empty() -> Self {
        Self {
            generators: FxHashMap::default(),
        }
    }

    /// Associates `kind` with `generator`, replacing any previous association.
    pub fn register_callback(
        &mut self,
        kind: DeclarationKind,
        generator: impl CallbackGenerator + 'static,
    ) -> &mut Self {
        self.generators.insert(kind, Arc::new(generator));
        self
    }

    /// The generator registered for exactly `kind`.
    pub fn get(&self, kind: DeclarationKind) -> Option<Arc<dyn CallbackGenerator>> {
        self.generators.get(&kind).cloned()
    }
}

impl Default for GeneratorTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table
            .register_callback(DeclarationKind::Callback, JsCallbackGenerator)
            .register_callback(DeclarationKind::Link, JsLinkCallbackGenerator);
        table
    }
}

impl fmt::Debug for GeneratorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.generators.keys()).finish()
    }
}

/// Everything a discovery pass needs besides the objects themselves.
#[derive(Clone, Debug, Default)]
pub struct LinkContext {
    pub config: PaneConfig,
    pub generators: GeneratorTable,
}

impl LinkContext {
    pub fn new(config: PaneConfig) -> Self {
        Self {
            config,
            generators: GeneratorTable::default(),
        }
    }

    pub fn with_generators(mut self, generators: GeneratorTable) -> Self {
        self.generators = generators;
        self
    }

    /// A context in error mode: generator failures propagate instead of being logged.
    pub fn strict(mut self) -> Self {
        self.config.strict = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::GeneratorTable;
    use crate::{declaration::DeclarationKind, generator::JsCallbackGenerator};

    #[test]
    fn lookup_is_by_exact_kind() {
        let mut table = GeneratorTable::default();
        assert!(table.get(DeclarationKind::Callback).is_some());
        assert!(table.get(DeclarationKind::Link).is_some());
        assert!(table.get(DeclarationKind::Custom("Range")).is_none());

        table.register_callback(DeclarationKind::Custom("Range"), JsCallbackGenerator);
        assert!(table.get(DeclarationKind::Custom("Range")).is_some());
        assert!(table.get(DeclarationKind::Custom("Other")).is_none());
        assert!(GeneratorTable::empty().get(DeclarationKind::Link).is_none());
    }
}
