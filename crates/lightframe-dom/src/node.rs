//! Node payloads stored in the document arena.

use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::media::MediaState;

/// Tags that never have children.
pub(crate) const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "source", "meta", "link"];

/// Layout box of an element in client coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// What a node in the arena is.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document root.
    Document,
    /// An element.
    Element(Box<Element>),
    /// A run of character data.
    Text(String),
}

impl NodeKind {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// Element payload.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) classes: SmallVec<[String; 4]>,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) style: BTreeMap<String, String>,
    pub(crate) value: String,
    pub(crate) rect: Rect,
    pub(crate) media: Option<MediaState>,
}

impl Element {
    pub(crate) fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let media = matches!(tag.as_str(), "video" | "audio").then(MediaState::default);
        Self {
            tag,
            media,
            ..Default::default()
        }
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match name {
            "class" => None,
            _ => self
                .attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag.as_str())
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: &str) {
        match name {
            "class" => self.set_class_name(value),
            "style" => {
                self.style.clear();
                for decl in value.split(';') {
                    if let Some((prop, val)) = decl.split_once(':') {
                        let prop = prop.trim();
                        if !prop.is_empty() {
                            self.style.insert(prop.to_string(), val.trim().to_string());
                        }
                    }
                }
            }
            _ => {
                if name == "value" {
                    self.value = value.to_string();
                }
                if name == "src" {
                    if let Some(media) = self.media.as_mut() {
                        media.src = value.to_string();
                    }
                }
                match self.attrs.iter_mut().find(|(k, _)| k == name) {
                    Some((_, v)) => *v = value.to_string(),
                    None => self.attrs.push((name.to_string(), value.to_string())),
                }
            }
        }
    }

    pub(crate) fn set_class_name(&mut self, value: &str) {
        self.classes = value.split_whitespace().map(str::to_string).collect();
    }
}
