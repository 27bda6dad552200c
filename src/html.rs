//! Thin helpers over the html5ever / rcdom tree.
//!
//! html5ever's tree builder is tolerant: it accepts fragments, stray end
//! tags and missing skeletons. Mutation goes through the [`TreeSink`] methods
//! of [`RcDom`]; [`detach`] must precede re-insertion of a node that still
//! has a parent.

use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, TreeSink};
use html5ever::{parse_document, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::rc::Rc;

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Parse a (possibly partial) HTML document.
pub fn parse(markup: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(markup)
}

/// Parse bytes of unknown encoding; invalid UTF-8 is replaced.
pub fn parse_bytes(bytes: &[u8]) -> RcDom {
    parse(&String::from_utf8_lossy(bytes))
}

/// Serialise the children of the document node.
pub fn serialize_document(dom: &RcDom) -> std::io::Result<String> {
    let mut out = Vec::new();
    let document: SerializableHandle = dom.document.clone().into();
    serialize(&mut out, &document, SerializeOpts::default())?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Lower-case local name when `node` is an element.
pub fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref().to_ascii_lowercase()),
        _ => None,
    }
}

pub fn is_element(node: &Handle, local: &str) -> bool {
    matches!(&node.data, NodeData::Element { name, .. } if name.local.as_ref().eq_ignore_ascii_case(local))
}

pub fn attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(attr_name))
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn children(node: &Handle) -> Vec<Handle> {
    node.children.borrow().clone()
}

/// First direct child element named `local`.
pub fn child_element(node: &Handle, local: &str) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|c| is_element(c, local))
        .cloned()
}

/// All descendants of `node` in document order, excluding `node` itself.
pub fn descendants(node: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut stack: Vec<Handle> = node.children.borrow().iter().rev().cloned().collect();
    while let Some(h) = stack.pop() {
        stack.extend(h.children.borrow().iter().rev().cloned());
        out.push(h);
    }
    out
}

/// Every element named `local` below `node`, in document order.
pub fn find_all(node: &Handle, local: &str) -> Vec<Handle> {
    descendants(node)
        .into_iter()
        .filter(|h| is_element(h, local))
        .collect()
}

/// Concatenated text of every text node below `node`.
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    for h in descendants(node) {
        if let NodeData::Text { contents } = &h.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}

pub fn same_node(a: &Handle, b: &Handle) -> bool {
    Rc::ptr_eq(a, b)
}

/// Create a detached HTML element with the given attributes.
pub fn create_element(dom: &RcDom, local: &str, attrs: &[(&str, &str)]) -> Handle {
    let name = QualName::new(None, Namespace::from(HTML_NS), LocalName::from(local));
    let attrs = attrs
        .iter()
        .map(|(k, v)| Attribute {
            name: QualName::new(None, Namespace::from(""), LocalName::from(*k)),
            value: StrTendril::from(*v),
        })
        .collect();
    dom.create_element(name, attrs, ElementFlags::default())
}

/// Detach `node` from its parent, if it has one.
pub fn detach(dom: &RcDom, node: &Handle) {
    dom.remove_from_parent(node);
}

/// Append `child` as the last child of `parent`, moving it if attached.
pub fn append_child(dom: &RcDom, parent: &Handle, child: &Handle) {
    detach(dom, child);
    dom.append(parent, NodeOrText::AppendNode(child.clone()));
}

/// Insert `child` as the first child of `parent`, moving it if attached.
pub fn prepend_child(dom: &RcDom, parent: &Handle, child: &Handle) {
    detach(dom, child);
    let first = parent.children.borrow().first().cloned();
    match first {
        Some(first) => dom.append_before_sibling(&first, NodeOrText::AppendNode(child.clone())),
        None => dom.append(parent, NodeOrText::AppendNode(child.clone())),
    }
}

pub fn append_text(dom: &RcDom, parent: &Handle, text: &str) {
    dom.append(parent, NodeOrText::AppendText(StrTendril::from(text)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_tolerant_and_synthesises_skeleton() {
        let dom = parse("<p>unclosed <b>bold");
        let html = child_element(&dom.document, "html").unwrap();
        assert!(child_element(&html, "head").is_some());
        assert!(child_element(&html, "body").is_some());
    }

    #[test]
    fn find_all_is_in_document_order() {
        let dom = parse(r#"<img src="1.png"><div><img src="2.png"></div><img src="3.png">"#);
        let srcs: Vec<_> = find_all(&dom.document, "img")
            .iter()
            .filter_map(|h| attr(h, "src"))
            .collect();
        assert_eq!(srcs, ["1.png", "2.png", "3.png"]);
    }

    #[test]
    fn prepend_and_serialise() {
        let dom = parse("<p>b</p>");
        let body = find_all(&dom.document, "body").remove(0);
        let p = create_element(&dom, "p", &[("class", "first")]);
        append_text(&dom, &p, "a < c");
        prepend_child(&dom, &body, &p);
        let out = serialize_document(&dom).unwrap();
        assert!(
            out.contains(r#"<body><p class="first">a &lt; c</p><p>b</p></body>"#),
            "got: {out}"
        );
    }

    #[test]
    fn moving_an_attached_node_does_not_duplicate_it() {
        let dom = parse("<div id=a><span>x</span></div><div id=b></div>");
        let divs = find_all(&dom.document, "div");
        let span = find_all(&dom.document, "span").remove(0);
        append_child(&dom, &divs[1], &span);
        assert!(children(&divs[0]).is_empty());
        assert_eq!(text_content(&divs[1]), "x");
    }

    #[test]
    fn names_match_case_insensitively() {
        let dom = parse(r#"<DIV DATA-Kind="x"></DIV>"#);
        let div = find_all(&dom.document, "DIV").remove(0);
        assert_eq!(element_name(&div).as_deref(), Some("div"));
        assert!(is_element(&div, "Div"));
        assert_eq!(attr(&div, "data-KIND").as_deref(), Some("x"));
    }
}
