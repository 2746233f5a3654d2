//! MEI Document
//! A read-only view of a parsed MEI document. Everything else navigates the tree through here.
//! Elements are matched on local name so namespaced and un-namespaced MEI both work.

use crate::error::{Error, Result};
use roxmltree::{Document, Node, ParsingOptions};

pub struct MeiDocument<'input> {
    xml: Document<'input>,
}

impl<'input> MeiDocument<'input> {
    /// Parse MEI text. The text must outlive the document.
    pub fn parse(text: &'input str) -> Result<MeiDocument<'input>> {
        // Plenty of MEI in the wild still carries a DOCTYPE.
        let mut options = ParsingOptions::default();
        options.allow_dtd = true;

        let xml = Document::parse_with_options(text, options)?;

        Ok(MeiDocument { xml })
    }

    /// The one and only `music` element.
    pub fn music(&self) -> Result<Node<'_, 'input>> {
        let mut found = self.xml.descendants().filter(|n| is_element(n, "music"));

        match (found.next(), found.next()) {
            (Some(music), None) => Ok(music),
            _ => Err(Error::StructuralError(
                "MEI document must have one and only one music element".to_string(),
            )),
        }
    }

    /// All measures in document order.
    pub fn measures(&self) -> Result<Vec<Node<'_, 'input>>> {
        Ok(descendants_named(self.music()?, "measure").collect())
    }

    /// The `@n` of every measure, empty where there isn't one.
    pub fn measure_labels(&self) -> Result<Vec<String>> {
        Ok(self.measures()?.iter().map(|m| measure_label(*m)).collect())
    }
}

pub fn is_element(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

pub fn measure_label(measure: Node) -> String {
    measure.attribute("n").unwrap_or("").to_string()
}

/// Direct children with this name.
pub fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| is_element(n, name))
}

/// Descendants with this name, in document order, not including the node itself.
pub fn descendants_named<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.descendants()
        .skip(1)
        .filter(move |n| is_element(n, name))
}

/// Every text node under this node, in document order.
pub fn descendant_text<'a, 'input>(node: Node<'a, 'input>) -> Vec<&'a str> {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}
