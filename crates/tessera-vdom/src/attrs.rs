//! Attribute maps for virtual elements

use serde::{Deserialize, Serialize};

/// Primitive attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl AttrValue {
    /// String written to the DOM, or `None` when the attribute must be absent
    pub fn to_dom_value(&self) -> Option<String> {
        match self {
            Self::Null | Self::Bool(false) => None,
            Self::Bool(true) => Some(String::new()),
            Self::Number(n) => Some(format_number(*n)),
            Self::Str(s) => Some(s.clone()),
        }
    }

    /// Whether the attribute is present when rendered
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Null | Self::Bool(false))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<usize> for AttrValue {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Ordered attribute map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attrs {
    entries: Vec<(String, AttrValue)>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an attribute
    pub fn insert(&mut self, name: &str, value: impl Into<AttrValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether the attribute is set to something other than null/false
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some_and(AttrValue::is_present)
    }

    /// Rendered string of an attribute
    pub fn dom_value(&self, name: &str) -> Option<String> {
        self.get(name).and_then(AttrValue::to_dom_value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<AttrValue>, const N: usize> From<[(K, V); N]> for Attrs {
    fn from(pairs: [(K, V); N]) -> Self {
        let mut attrs = Attrs::new();
        for (k, v) in pairs {
            attrs.insert(k.as_ref(), v);
        }
        attrs
    }
}

impl<K: AsRef<str>, V: Into<AttrValue>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attrs::new();
        for (k, v) in iter {
            attrs.insert(k.as_ref(), v);
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dom_value_conversion() {
        assert_eq!(AttrValue::from("x").to_dom_value(), Some("x".into()));
        assert_eq!(AttrValue::from(true).to_dom_value(), Some(String::new()));
        assert_eq!(AttrValue::from(false).to_dom_value(), None);
        assert_eq!(AttrValue::Null.to_dom_value(), None);
        assert_eq!(AttrValue::from(3).to_dom_value(), Some("3".into()));
        assert_eq!(AttrValue::from(1.5).to_dom_value(), Some("1.5".into()));
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut attrs = Attrs::from([("class", "a"), ("id", "b")]);
        attrs.insert("class", "c");
        let names: Vec<&str> = attrs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["class", "id"]);
        assert_eq!(attrs.dom_value("class"), Some("c".into()));
    }

    #[test]
    fn test_presence() {
        let attrs = Attrs::new().with("disabled", false).with("checked", true);
        assert!(attrs.contains("disabled"));
        assert!(!attrs.is_present("disabled"));
        assert!(attrs.is_present("checked"));
    }

    #[test]
    fn test_deserialize_untagged() {
        let attrs: Attrs = serde_json::from_str(r#"{"entries":[["a","x"],["b",true],["c",2.0],["d",null]]}"#).unwrap();
        assert_eq!(attrs.get("b"), Some(&AttrValue::Bool(true)));
        assert_eq!(attrs.get("d"), Some(&AttrValue::Null));
    }
}
