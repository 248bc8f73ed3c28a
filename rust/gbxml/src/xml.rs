// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal XML element tree and deterministic writer
//!
//! Attributes keep insertion order, children are indented by two spaces and
//! numbers go through [`format_number`], so equal trees always serialize to
//! equal bytes.

/// An XML element with ordered attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: Option<String>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Element holding only text
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).with_text(text)
    }

    /// Element holding a formatted number
    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Self::leaf(name, format_number(value))
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Six-decimal fixed notation without a negative zero
pub fn format_number(value: f64) -> String {
    let s = format!("{:.6}", value);
    if s == "-0.000000" {
        "0.000000".to_string()
    } else {
        s
    }
}

pub fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Serialize a document with an XML declaration
pub fn write_document(root: &XmlElement) -> String {
    let mut out = String::with_capacity(64 * 1024);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, element: &XmlElement, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push_str(&format!(" {}=\"{}\"", key, xml_escape(value)));
    }

    match (&element.text, element.children.is_empty()) {
        (None, true) => out.push_str("/>\n"),
        (Some(text), true) => {
            out.push_str(&format!(">{}</{}>\n", xml_escape(text), element.name));
        }
        (text, false) => {
            out.push_str(">\n");
            if let Some(text) = text {
                for _ in 0..=depth {
                    out.push_str("  ");
                }
                out.push_str(&xml_escape(text));
                out.push('\n');
            }
            for child in &element.children {
                write_element(out, child, depth + 1);
            }
            for _ in 0..depth {
                out.push_str("  ");
            }
            out.push_str(&format!("</{}>\n", element.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_nested_document() {
        let root = XmlElement::new("gbXML")
            .with_attr("version", "6.01")
            .with_child(
                XmlElement::new("Campus")
                    .with_attr("id", "campus-1")
                    .with_child(XmlElement::leaf("Name", "A & B"))
                    .with_child(XmlElement::new("Empty")),
            );

        let xml = write_document(&root);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <gbXML version=\"6.01\">\n\
             \x20\x20<Campus id=\"campus-1\">\n\
             \x20\x20\x20\x20<Name>A &amp; B</Name>\n\
             \x20\x20\x20\x20<Empty/>\n\
             \x20\x20</Campus>\n\
             </gbXML>\n"
        );
    }

    #[test]
    fn test_attribute_escaping_and_lookup() {
        let element = XmlElement::new("Space").with_attr("id", "a\"<b>");
        assert_eq!(element.attr("id"), Some("a\"<b>"));
        assert!(write_document(&element).contains("id=\"a&quot;&lt;b&gt;\""));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(-0.0), "0.000000");
        assert_eq!(format_number(-0.0000004), "0.000000");
        assert_eq!(format_number(3.25), "3.250000");
        assert_eq!(XmlElement::number("Area", 80.0).text.as_deref(), Some("80.000000"));
    }
}
