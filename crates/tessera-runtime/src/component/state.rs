//! Dirty-tracked component state

use serde_json::{Map, Value};

/// State map a component renders from
pub type State = Map<String, Value>;

/// Component state with the snapshot taken on the first change after a flush
#[derive(Debug, Clone, Default)]
pub struct ComponentState {
    data: State,
    old: Option<State>,
    dirty: Vec<String>,
}

impl ComponentState {
    pub fn new(data: State) -> Self {
        Self {
            data,
            old: None,
            dirty: Vec::new(),
        }
    }

    pub fn data(&self) -> &State {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Set `key`; returns whether the value changed
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        if self.data.get(key) == Some(&value) {
            return false;
        }
        if self.old.is_none() {
            self.old = Some(self.data.clone());
        }
        self.data.insert(key.to_string(), value);
        if !self.dirty.iter().any(|k| k == key) {
            self.dirty.push(key.to_string());
        }
        true
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Keys changed since the last flush, in change order
    pub fn dirty_keys(&self) -> &[String] {
        &self.dirty
    }

    /// Value of `key` before the first change since the last flush
    pub fn old_value(&self, key: &str) -> Option<&Value> {
        match &self.old {
            Some(old) => old.get(key),
            None => self.data.get(key),
        }
    }

    /// Forget the snapshot and dirty keys
    pub fn clean(&mut self) {
        self.old = None;
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_on_first_change() {
        let mut state = ComponentState::new(State::from_iter([("count".to_string(), json!(0))]));
        assert!(state.set("count", json!(1)));
        assert!(state.set("count", json!(2)));
        assert_eq!(state.old_value("count"), Some(&json!(0)));
        assert_eq!(state.get("count"), Some(&json!(2)));
        assert_eq!(state.dirty_keys(), ["count".to_string()]);

        state.clean();
        assert!(!state.is_dirty());
        assert_eq!(state.old_value("count"), Some(&json!(2)));
    }

    #[test]
    fn test_same_value_is_not_a_change() {
        let mut state = ComponentState::default();
        assert!(state.set("a", json!("x")));
        state.clean();
        assert!(!state.set("a", json!("x")));
        assert!(!state.is_dirty());
    }
}
