//! Element namespaces

/// XLink namespace, used for `xlink:href` on SVG elements
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Namespace an element is created in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    /// Namespace URI
    pub fn uri(self) -> &'static str {
        match self {
            Self::Html => "http://www.w3.org/1999/xhtml",
            Self::Svg => "http://www.w3.org/2000/svg",
            Self::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }

    /// Resolve the namespace for `tag` created under a parent element.
    ///
    /// `svg` and `math` open their namespaces; everything else inherits the
    /// parent's, except that children of `foreignObject` are back in XHTML.
    pub fn resolve(tag: &str, parent: Option<(Namespace, &str)>) -> Namespace {
        match tag {
            "svg" => Self::Svg,
            "math" => Self::MathMl,
            _ => match parent {
                Some((Self::Svg, "foreignObject")) => Self::Html,
                Some((ns, _)) => ns,
                None => Self::Html,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_to_html() {
        assert_eq!(Namespace::resolve("div", None), Namespace::Html);
        assert_eq!(Namespace::resolve("span", Some((Namespace::Html, "div"))), Namespace::Html);
    }

    #[test]
    fn test_resolve_svg_and_math() {
        assert_eq!(Namespace::resolve("svg", None), Namespace::Svg);
        assert_eq!(Namespace::resolve("circle", Some((Namespace::Svg, "svg"))), Namespace::Svg);
        assert_eq!(Namespace::resolve("math", Some((Namespace::Html, "p"))), Namespace::MathMl);
        assert_eq!(Namespace::MathMl.uri(), "http://www.w3.org/1998/Math/MathML");
    }

    #[test]
    fn test_foreign_object_children_are_html() {
        let ns = Namespace::resolve("div", Some((Namespace::Svg, "foreignObject")));
        assert_eq!(ns, Namespace::Html);
    }
}
