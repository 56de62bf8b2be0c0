//! A headless lightbox widget.
//!
//! Behaves like the third-party carousel the pages embed: it is built from
//! the anchors matching a selector, owns the slide DOM it creates under its
//! own container, builds each slide lazily the first time it is shown and
//! destroys all of it on close. Callers observe it only through
//! [`LightboxEvent`] handlers and the public slide nodes.
//!
//! Slide markup:
//!
//! ```text
//! .gslide
//!   .gslide-inner-content
//!     .ginner-container
//!       .gslide-media.gslide-image > img
//!       .gslide-description > .gdesc-inner > (.gslide-title, .gslide-desc)
//! ```

use std::rc::Rc;

use indextree::NodeId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::selector::Selector;

/// Construction options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightboxOptions {
    pub selector: String,
    pub touch_navigation: bool,
    #[serde(rename = "loop")]
    pub loop_slides: bool,
    pub zoomable: bool,
}

impl Default for LightboxOptions {
    fn default() -> Self {
        Self {
            selector: "a.glightbox".to_string(),
            touch_navigation: true,
            loop_slides: false,
            zoomable: false,
        }
    }
}

/// Slide lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightboxEvent {
    /// A slide's content was built for the first time since opening.
    SlideAfterLoad,
    /// A slide became the current one.
    SlideChanged,
}

/// Payload passed to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideEvent {
    pub index: usize,
    pub slide: NodeId,
    pub previous: Option<usize>,
}

/// Handler signature.
pub type SlideHandler = Rc<dyn Fn(&mut Document, &SlideEvent) -> DomResult<()>>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SlideSource {
    href: String,
    title: String,
    description: String,
}

/// The widget instance.
pub struct Lightbox {
    options: LightboxOptions,
    selector: Selector,
    sources: Vec<SlideSource>,
    container: Option<NodeId>,
    slides: Vec<Option<NodeId>>,
    current: Option<usize>,
    handlers: Vec<(LightboxEvent, SlideHandler)>,
    destroyed: bool,
}

impl std::fmt::Debug for Lightbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lightbox")
            .field("options", &self.options)
            .field("slides", &self.sources.len())
            .field("current", &self.current)
            .field("handlers", &self.handlers.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Lightbox {
    /// Build an instance over the anchors currently matching the selector.
    pub fn new(doc: &Document, options: LightboxOptions) -> DomResult<Self> {
        let selector = Selector::parse(&options.selector)?;
        let mut lightbox = Self {
            options,
            selector,
            sources: Vec::new(),
            container: None,
            slides: Vec::new(),
            current: None,
            handlers: Vec::new(),
            destroyed: false,
        };
        lightbox.scan(doc);
        Ok(lightbox)
    }

    fn scan(&mut self, doc: &Document) {
        self.sources = doc
            .query_all_parsed(doc.root(), &self.selector)
            .into_iter()
            .map(|anchor| SlideSource {
                href: doc.attr(anchor, "href").unwrap_or_default(),
                title: doc.attr(anchor, "data-title").unwrap_or_default(),
                description: doc.attr(anchor, "data-description").unwrap_or_default(),
            })
            .collect();
        self.slides = vec![None; self.sources.len()];
        debug!(
            selector = %self.options.selector,
            slides = self.sources.len(),
            "lightbox elements collected"
        );
    }

    pub fn options(&self) -> &LightboxOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.container.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The built slide node for `index`, if it exists.
    pub fn slide_node(&self, index: usize) -> Option<NodeId> {
        self.slides.get(index).copied().flatten()
    }

    pub fn current_slide(&self) -> Option<NodeId> {
        self.current.and_then(|index| self.slide_node(index))
    }

    /// The widget's root container while open.
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    /// Subscribe to slide events.
    pub fn on(&mut self, event: LightboxEvent, handler: SlideHandler) {
        self.handlers.push((event, handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn ensure_live(&self) -> DomResult<()> {
        if self.destroyed {
            return Err(DomError::NotSupported("lightbox has been destroyed".into()));
        }
        Ok(())
    }

    /// Open at `index`.
    pub fn open(&mut self, doc: &mut Document, index: usize) -> DomResult<()> {
        self.ensure_live()?;
        if index >= self.sources.len() {
            return Err(DomError::OutOfRange {
                what: "slide index",
                value: index as f64,
            });
        }
        if self.container.is_none() {
            let created = doc.insert_markup(
                doc.body(),
                r#"<div class="glightbox-container"><div class="gslider"></div></div>"#,
            )?;
            self.container = created.first().copied();
        }
        self.show(doc, index)
    }

    /// Move to `index`.
    pub fn goto(&mut self, doc: &mut Document, index: usize) -> DomResult<()> {
        if !self.is_open() {
            return self.open(doc, index);
        }
        if index >= self.sources.len() {
            return Err(DomError::OutOfRange {
                what: "slide index",
                value: index as f64,
            });
        }
        self.show(doc, index)
    }

    /// Next slide; returns whether it moved.
    pub fn next(&mut self, doc: &mut Document) -> DomResult<bool> {
        let Some(current) = self.current else {
            return Ok(false);
        };
        let target = if current + 1 < self.sources.len() {
            current + 1
        } else if self.options.loop_slides {
            0
        } else {
            return Ok(false);
        };
        self.show(doc, target)?;
        Ok(target != current)
    }

    /// Previous slide; returns whether it moved.
    pub fn prev(&mut self, doc: &mut Document) -> DomResult<bool> {
        let Some(current) = self.current else {
            return Ok(false);
        };
        let target = if current > 0 {
            current - 1
        } else if self.options.loop_slides {
            self.sources.len() - 1
        } else {
            return Ok(false);
        };
        self.show(doc, target)?;
        Ok(target != current)
    }

    fn show(&mut self, doc: &mut Document, index: usize) -> DomResult<()> {
        let previous = self.current;
        let (slide, built) = match self.slide_node(index).filter(|&n| doc.is_alive(n)) {
            Some(slide) => (slide, false),
            None => (self.build_slide(doc, index)?, true),
        };

        if let Some(prev) = previous.and_then(|p| self.slide_node(p)) {
            doc.remove_class(prev, "current").ok();
        }
        doc.add_class(slide, "current")?;
        self.current = Some(index);

        let event = SlideEvent {
            index,
            slide,
            previous,
        };
        if built {
            self.emit(doc, LightboxEvent::SlideAfterLoad, &event);
        }
        self.emit(doc, LightboxEvent::SlideChanged, &event);
        Ok(())
    }

    fn build_slide(&mut self, doc: &mut Document, index: usize) -> DomResult<NodeId> {
        let container = self
            .container
            .ok_or_else(|| DomError::NotSupported("lightbox is not open".into()))?;
        let slider = doc.query(container, ".gslider")?.unwrap_or(container);
        let source = self.sources[index].clone();

        let slide = element(doc, "div", "gslide")?;
        let inner = element(doc, "div", "gslide-inner-content")?;
        let inner_container = element(doc, "div", "ginner-container")?;
        let media = element(doc, "div", "gslide-media gslide-image")?;
        let img = doc.create_element("img");
        doc.set_attr(img, "src", &source.href)?;
        doc.set_attr(img, "alt", "")?;

        doc.append_child(slider, slide)?;
        doc.append_child(slide, inner)?;
        doc.append_child(inner, inner_container)?;
        doc.append_child(inner_container, media)?;
        doc.append_child(media, img)?;

        if !source.title.trim().is_empty() || !source.description.trim().is_empty() {
            let panel = element(doc, "div", "gslide-description description-bottom")?;
            let desc_inner = element(doc, "div", "gdesc-inner")?;
            doc.append_child(inner_container, panel)?;
            doc.append_child(panel, desc_inner)?;
            if !source.title.trim().is_empty() {
                let title = element(doc, "h4", "gslide-title")?;
                doc.append_child(desc_inner, title)?;
                doc.insert_markup(title, &source.title)?;
            }
            if !source.description.trim().is_empty() {
                let desc = element(doc, "div", "gslide-desc")?;
                doc.append_child(desc_inner, desc)?;
                doc.insert_markup(desc, &source.description)?;
            }
        }

        self.slides[index] = Some(slide);
        debug!(index, "lightbox slide built");
        Ok(slide)
    }

    fn emit(&self, doc: &mut Document, kind: LightboxEvent, event: &SlideEvent) {
        let handlers: Vec<SlideHandler> = self
            .handlers
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            if let Err(e) = handler(doc, event) {
                warn!(event = ?kind, index = event.index, error = %e, "lightbox handler failed");
            }
        }
    }

    /// Close, destroying every slide node.
    pub fn close(&mut self, doc: &mut Document) {
        if let Some(container) = self.container.take() {
            if doc.is_alive(container) {
                doc.remove_node(container).ok();
            }
        }
        self.slides = vec![None; self.sources.len()];
        self.current = None;
    }

    /// Re-collect the matching anchors, closing first if open.
    pub fn reload(&mut self, doc: &mut Document) -> DomResult<usize> {
        self.ensure_live()?;
        self.close(doc);
        self.scan(doc);
        Ok(self.sources.len())
    }

    /// Tear down the instance. Further use fails.
    pub fn destroy(&mut self, doc: &mut Document) {
        self.close(doc);
        self.handlers.clear();
        self.sources.clear();
        self.slides.clear();
        self.destroyed = true;
        debug!("lightbox destroyed");
    }
}

fn element(doc: &mut Document, tag: &str, class: &str) -> DomResult<NodeId> {
    let node = doc.create_element(tag);
    doc.set_class_name(node, class)?;
    Ok(node)
}
