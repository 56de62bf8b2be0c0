//! Markup fragment parsing.
//!
//! Fragments run through html5ever's tree builder into an `RcDom`; the
//! body's subtree is then lifted into owned [`FragmentNode`]s that
//! [`Document::insert_markup`](crate::Document::insert_markup) grafts into
//! the arena. Entity decoding, implied end tags and stray end tags all follow
//! the HTML parsing algorithm. Comments and whitespace-only text are dropped.

use html5ever::tendril::TendrilSink as _;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// A parsed node, detached from any document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentNode {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<FragmentNode>,
    },
    Text(String),
}

fn child_element(handle: &Handle, tag: &str) -> Option<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, NodeData::Element { name, .. } if &*name.local == tag))
        .cloned()
}

fn lift(handle: &Handle, out: &mut Vec<FragmentNode>) {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            let mut children = Vec::new();
            for child in handle.children.borrow().iter() {
                lift(child, &mut children);
            }
            out.push(FragmentNode::Element {
                name: name.local.to_string(),
                attrs,
                children,
            });
        }
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            if !text.trim().is_empty() {
                out.push(FragmentNode::Text(text));
            }
        }
        _ => {}
    }
}

/// Parse `src` as body content.
pub fn parse_fragment(src: &str) -> Vec<FragmentNode> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let dom = parse_document(RcDom::default(), opts).one(src);

    let mut nodes = Vec::new();
    if let Some(body) = child_element(&dom.document, "html").and_then(|html| child_element(&html, "body")) {
        for child in body.children.borrow().iter() {
            lift(child, &mut nodes);
        }
    }
    nodes
}
