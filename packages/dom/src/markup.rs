//! HTML parsing into the host document, using html5ever.

use crate::document::{Document, NodeId};
use crate::error::MarkupResult;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Parse `markup` into a new detached fragment.
///
/// The parser always builds a full document; the implied `html`, `head` and
/// `body` wrappers are flattened away so only the authored nodes remain.
pub fn parse_fragment(doc: &Document, markup: &str) -> MarkupResult<NodeId> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut markup.as_bytes())?;

    let fragment = doc.create_fragment();
    for child in dom.document.children.borrow().iter() {
        import(doc, fragment, child, true);
    }
    Ok(fragment)
}

/// Replace the children of `node` with parsed `markup`.
pub fn set_inner_html(doc: &Document, node: NodeId, markup: &str) -> MarkupResult<()> {
    let fragment = parse_fragment(doc, markup)?;
    doc.clear_children(node);
    doc.append_child(node, fragment);
    Ok(())
}

fn import(doc: &Document, parent: NodeId, handle: &Handle, flatten: bool) {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            if flatten && matches!(tag.as_str(), "html" | "head" | "body") {
                for child in handle.children.borrow().iter() {
                    import(doc, parent, child, true);
                }
                return;
            }

            let element = doc.create_element(&tag);
            for attr in attrs.borrow().iter() {
                doc.set_attribute(element, &attr.name.local, &attr.value);
            }
            for child in handle.children.borrow().iter() {
                import(doc, element, child, false);
            }
            doc.append_child(parent, element);
        }
        NodeData::Text { contents } => {
            let text = doc.create_text(&contents.borrow());
            doc.append_child(parent, text);
        }
        NodeData::Comment { contents } => {
            let comment = doc.create_comment(contents);
            doc.append_child(parent, comment);
        }
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                import(doc, parent, child, flatten);
            }
        }
        NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NodeType;

    #[test]
    fn test_parse_flattens_document_wrappers() {
        let doc = Document::new();
        let fragment = parse_fragment(&doc, r#"<div class="a">Hi <b>there</b></div><p>x</p>"#).unwrap();
        let children = doc.children(fragment);
        assert_eq!(children.len(), 2);
        assert_eq!(doc.tag_name(children[0]).as_deref(), Some("div"));
        assert_eq!(doc.attribute(children[0], "class").as_deref(), Some("a"));
        assert_eq!(doc.text_content(children[0]), "Hi there");
        assert_eq!(doc.tag_name(children[1]).as_deref(), Some("p"));
    }

    #[test]
    fn test_custom_elements_and_slots_survive_parsing() {
        let doc = Document::new();
        let fragment = parse_fragment(
            &doc,
            r#"<x-card bind-property-title="label"><slot name="header">fallback</slot><slot></slot></x-card>"#,
        )
        .unwrap();
        let card = doc.children(fragment)[0];
        assert_eq!(doc.tag_name(card).as_deref(), Some("x-card"));
        assert_eq!(doc.attribute(card, "bind-property-title").as_deref(), Some("label"));
        let slots = doc.children(card);
        assert_eq!(slots.len(), 2);
        assert_eq!(doc.attribute(slots[0], "name").as_deref(), Some("header"));
    }

    #[test]
    fn test_template_scripts_keep_raw_text() {
        let doc = Document::new();
        let fragment = parse_fragment(
            &doc,
            r#"<div><script type="text/template"><li bind-on-click="x()">${item}</li></script></div>"#,
        )
        .unwrap();
        let div = doc.children(fragment)[0];
        let script = doc.children(div)[0];
        let raw = doc.children(script);
        assert_eq!(raw.len(), 1);
        assert_eq!(doc.node_type(raw[0]), NodeType::Text);
        assert_eq!(doc.text_content(script), r#"<li bind-on-click="x()">${item}</li>"#);
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let doc = Document::new();
        let host = doc.create_element("div");
        doc.append_child(host, doc.create_text("old"));
        set_inner_html(&doc, host, "<span>new</span>").unwrap();
        assert_eq!(doc.inner_html(host), "<span>new</span>");
    }
}
