//! Component registry
//!
//! Maps the type names used by component placeholders to factories.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::component::Behavior;
use crate::{RuntimeError, RuntimeResult};

type Factory = Box<dyn Fn() -> Rc<dyn Behavior>>;

/// Type name → factory table
#[derive(Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, Factory>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `type_name`, replacing any previous one
    pub fn register<B, F>(&mut self, type_name: &str, factory: F)
    where
        B: Behavior + 'static,
        F: Fn() -> B + 'static,
    {
        tracing::debug!(type_name, "registered component type");
        self.factories
            .insert(type_name.to_string(), Box::new(move || Rc::new(factory()) as Rc<dyn Behavior>));
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate a behavior
    pub fn create(&self, type_name: &str) -> RuntimeResult<Rc<dyn Behavior>> {
        self.factories
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| RuntimeError::UnknownComponentType(type_name.to_string()))
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ComponentRegistry").field("types", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::State;
    use tessera_vdom::{Input, RenderOut};

    struct Label;

    impl Behavior for Label {
        fn render(&self, input: &Input, _: &State, out: &mut RenderOut) -> anyhow::Result<()> {
            let text = input.get("text").and_then(|v| v.as_str()).unwrap_or_default();
            out.text(text)?;
            Ok(())
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = ComponentRegistry::new();
        registry.register("label", || Label);
        assert!(registry.contains("label"));
        assert!(registry.create("label").is_ok());
    }

    #[test]
    fn test_unknown_type() {
        let registry = ComponentRegistry::new();
        let err = registry.create("missing").err().unwrap();
        assert!(matches!(err, RuntimeError::UnknownComponentType(name) if name == "missing"));
    }
}
