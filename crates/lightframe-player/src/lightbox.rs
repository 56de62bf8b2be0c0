//! Lightbox adapter.
//!
//! Page modules talk to the carousel widget only through
//! [`LightboxAdapter`]; the reconciler hooks its slide events through the
//! same trait instead of patching widget internals.

use lightframe_dom::{Document, Lightbox, LightboxEvent, LightboxOptions, NodeId, SlideHandler};
use tracing::debug;

use crate::error::Result;

/// The operations page code needs from a lightbox widget.
pub trait LightboxAdapter {
    /// Show slide `index`, opening the widget if needed.
    fn open(&mut self, doc: &mut Document, index: usize) -> Result<()>;

    fn close(&mut self, doc: &mut Document);

    /// Next slide; `false` at the end of a non-looping gallery.
    fn next(&mut self, doc: &mut Document) -> Result<bool>;

    /// Previous slide; `false` at the start of a non-looping gallery.
    fn prev(&mut self, doc: &mut Document) -> Result<bool>;

    /// Called after a slide's content has been built.
    fn on_slide_loaded(&mut self, handler: SlideHandler);

    /// Called whenever a slide becomes current.
    fn on_slide_changed(&mut self, handler: SlideHandler);

    /// Re-collect gallery anchors after the page re-rendered them.
    fn reload(&mut self, doc: &mut Document) -> Result<usize>;

    /// Tear the widget down for good.
    fn destroy(&mut self, doc: &mut Document);

    fn slide_count(&self) -> usize;

    fn current_slide(&self) -> Option<NodeId>;
}

/// Adapter over the headless [`Lightbox`] widget.
#[derive(Debug)]
pub struct GLightbox {
    inner: Lightbox,
}

impl GLightbox {
    /// Construct over the anchors currently in `doc`.
    pub fn create(doc: &Document, options: LightboxOptions) -> Result<Self> {
        let inner = Lightbox::new(doc, options)?;
        debug!(slides = inner.len(), "lightbox created");
        Ok(Self { inner })
    }

    pub fn widget(&self) -> &Lightbox {
        &self.inner
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }
}

impl LightboxAdapter for GLightbox {
    fn open(&mut self, doc: &mut Document, index: usize) -> Result<()> {
        Ok(self.inner.goto(doc, index)?)
    }

    fn close(&mut self, doc: &mut Document) {
        self.inner.close(doc);
    }

    fn next(&mut self, doc: &mut Document) -> Result<bool> {
        Ok(self.inner.next(doc)?)
    }

    fn prev(&mut self, doc: &mut Document) -> Result<bool> {
        Ok(self.inner.prev(doc)?)
    }

    fn on_slide_loaded(&mut self, handler: SlideHandler) {
        self.inner.on(LightboxEvent::SlideAfterLoad, handler);
    }

    fn on_slide_changed(&mut self, handler: SlideHandler) {
        self.inner.on(LightboxEvent::SlideChanged, handler);
    }

    fn reload(&mut self, doc: &mut Document) -> Result<usize> {
        Ok(self.inner.reload(doc)?)
    }

    fn destroy(&mut self, doc: &mut Document) {
        self.inner.destroy(doc);
    }

    fn slide_count(&self) -> usize {
        self.inner.len()
    }

    fn current_slide(&self) -> Option<NodeId> {
        self.inner.current_slide()
    }
}
