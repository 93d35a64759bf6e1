//! DOM Node - Compact representation
//!
//! Links are stored as [`NodeId`] indices instead of pointers; the node
//! payload is a closed enum over the node kinds the runtime renders.

use crate::{Namespace, NodeId};

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(tag: &str, namespace: Namespace) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(tag, namespace)))
    }

    /// Create a new text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::with_data(NodeData::Text(content.into()))
    }

    /// Create a new comment node
    pub fn comment(content: impl Into<String>) -> Self {
        Self::with_data(NodeData::Comment(content.into()))
    }

    /// Create a document fragment
    pub fn document_fragment() -> Self {
        Self::with_data(NodeData::DocumentFragment)
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Node kind
    #[inline]
    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document => NodeType::Document,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Character data of a text or comment node
    #[inline]
    pub fn char_data(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) | NodeData::Comment(t) => Some(t),
            _ => None,
        }
    }
}

/// Node kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    DocumentFragment,
    Element,
    Text,
    Comment,
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root
    Document,
    /// Container whose children move out when it is inserted
    DocumentFragment,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name as rendered
    pub tag: String,
    /// Namespace the element was created in
    pub namespace: Namespace,
    /// Attributes in insertion order
    pub attrs: Vec<Attribute>,
    /// Live form-control state, distinct from the attributes
    pub form: FormState,
}

impl ElementData {
    pub fn new(tag: &str, namespace: Namespace) -> Self {
        Self {
            tag: tag.to_string(),
            namespace,
            attrs: Vec::new(),
            form: FormState::default(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, returning the previous value
    pub fn set_attr(&mut self, name: &str, namespace: Option<&'static str>, value: String) -> Option<String> {
        for attr in self.attrs.iter_mut() {
            if attr.name == name {
                attr.namespace = namespace;
                return Some(std::mem::replace(&mut attr.value, value));
            }
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            namespace,
            value,
        });
        None
    }

    /// Remove an attribute, returning its value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(index).value)
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub namespace: Option<&'static str>,
    pub value: String,
}

/// Live properties of form controls.
///
/// Browsers keep these apart from the attributes once the control has been
/// rendered: typing into an input changes `value` but not the `value`
/// attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub value: Option<String>,
    pub checked: bool,
    pub selected: bool,
    pub disabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut el = ElementData::new("div", Namespace::Html);
        assert_eq!(el.set_attr("class", None, "a".into()), None);
        el.set_attr("id", None, "main".into());
        assert_eq!(el.set_attr("class", None, "b".into()), Some("a".into()));

        assert_eq!(el.attrs.len(), 2);
        assert_eq!(el.attrs[0].name, "class");
        assert_eq!(el.get_attr("class"), Some("b"));
    }

    #[test]
    fn test_remove_attr() {
        let mut el = ElementData::new("input", Namespace::Html);
        el.set_attr("value", None, "x".into());
        assert_eq!(el.remove_attr("value"), Some("x".into()));
        assert_eq!(el.remove_attr("value"), None);
    }

    #[test]
    fn test_node_type() {
        assert_eq!(Node::text("hi").node_type(), NodeType::Text);
        assert_eq!(Node::comment("c").char_data(), Some("c"));
        assert!(Node::element("p", Namespace::Html).is_element());
    }
}
