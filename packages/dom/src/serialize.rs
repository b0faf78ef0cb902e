//! HTML serialisation of document subtrees.

use crate::document::{Document, NodeId, NodeType};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Document {
    /// Serialise a node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    /// Serialise only the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let raw = self
            .tag_name(id)
            .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag.as_str()));
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(child, raw, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match self.node_type(id) {
            NodeType::Text => {
                let text = self.text(id).unwrap_or_default();
                if raw_text {
                    out.push_str(&text);
                } else {
                    out.push_str(&escape_text(&text));
                }
            }
            NodeType::Comment => {
                out.push_str("<!--");
                out.push_str(&self.text(id).unwrap_or_default());
                out.push_str("-->");
            }
            NodeType::Document | NodeType::Fragment => out.push_str(&self.inner_html(id)),
            NodeType::Element => {
                let tag = self.tag_name(id).unwrap_or_default();
                out.push('<');
                out.push_str(&tag);
                for (name, value) in self.attributes(id) {
                    out.push(' ');
                    out.push_str(&name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attribute(&value));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                out.push_str(&self.inner_html(id));
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
