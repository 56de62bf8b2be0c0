//! Caption overlay reconciler.
//!
//! The lightbox owns and rebuilds its slide DOM on its own schedule. Each
//! time a slide is loaded or becomes current, [`reconcile_slide`] inspects
//! that slide and makes sure its media container holds exactly one
//! `.glightbox-custom-caption` overlay, hiding the default caption panel.
//! Nothing is cached between calls; the DOM is the only state.

use std::cell::RefCell;
use std::rc::Rc;

use lightframe_caption::split_caption;
use lightframe_dom::{Document, DomResult, LightboxEvent, NodeId, SlideEvent};
use serde::Serialize;
use tracing::debug;

use crate::lightbox::LightboxAdapter;

/// Media container inside a slide.
pub const MEDIA_SELECTOR: &str = ".gslide-image, .gslide-media";
/// Default caption panel inside a slide.
pub const PANEL_SELECTOR: &str = ".gslide-description";
/// Class of the custom overlay.
pub const OVERLAY_CLASS: &str = "glightbox-custom-caption";

const OVERLAY_SELECTOR: &str = ".glightbox-custom-caption";

/// What one reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OverlayOutcome {
    /// The slide has no media container yet.
    NotReady,
    /// An overlay was already mounted; the panel was (re)hidden.
    AlreadyMounted,
    /// A pre-authored overlay was moved from the panel into the media.
    Moved,
    /// An overlay was built from the panel text.
    Built {
        title: Option<String>,
        meta: Option<String>,
    },
    /// The panel had nothing to show; it was hidden.
    Empty,
}

impl OverlayOutcome {
    /// Whether this call mounted a new overlay.
    pub fn mounted(&self) -> bool {
        matches!(self, OverlayOutcome::Moved | OverlayOutcome::Built { .. })
    }
}

fn hide_panel(doc: &mut Document, panel: Option<NodeId>) -> DomResult<()> {
    match panel {
        Some(panel) => doc.set_style(panel, "display", "none"),
        None => Ok(()),
    }
}

fn text_of(doc: &Document, scope: Option<NodeId>, selector: &str) -> DomResult<String> {
    let Some(scope) = scope else {
        return Ok(String::new());
    };
    Ok(doc
        .query(scope, selector)?
        .map(|node| doc.text_content(node).trim().to_string())
        .unwrap_or_default())
}

/// Ensure `slide` carries exactly one caption overlay inside its media.
pub fn reconcile_slide(doc: &mut Document, slide: NodeId) -> DomResult<OverlayOutcome> {
    if !doc.is_alive(slide) {
        return Ok(OverlayOutcome::NotReady);
    }
    let Some(media) = doc.query(slide, MEDIA_SELECTOR)? else {
        debug!(slide = ?slide, "slide has no media container yet");
        return Ok(OverlayOutcome::NotReady);
    };
    let panel = doc.query(slide, PANEL_SELECTOR)?;

    if doc.query(media, OVERLAY_SELECTOR)?.is_some() {
        hide_panel(doc, panel)?;
        return Ok(OverlayOutcome::AlreadyMounted);
    }

    let authored = match panel {
        Some(panel) => doc.query(panel, OVERLAY_SELECTOR)?,
        None => None,
    };
    if let Some(authored) = authored {
        doc.append_child(media, authored)?;
        hide_panel(doc, panel)?;
        debug!(slide = ?slide, "moved pre-authored caption overlay");
        return Ok(OverlayOutcome::Moved);
    }

    let raw_title = text_of(doc, panel, ".gslide-title")?;
    let raw_body = text_of(doc, panel, ".gslide-desc")?;
    let caption = split_caption(&raw_title, &raw_body);
    if caption.is_empty() {
        hide_panel(doc, panel)?;
        return Ok(OverlayOutcome::Empty);
    }

    let overlay = doc.create_element("div");
    doc.set_class_name(overlay, OVERLAY_CLASS)?;
    if let Some(title) = &caption.title {
        let h5 = doc.create_element("h5");
        doc.set_text(h5, title)?;
        doc.append_child(overlay, h5)?;
    }
    if let Some(meta) = &caption.meta {
        let p = doc.create_element("p");
        doc.set_text(p, meta)?;
        doc.append_child(overlay, p)?;
    }
    doc.append_child(media, overlay)?;
    hide_panel(doc, panel)?;

    debug!(slide = ?slide, kind = ?caption.kind, "built caption overlay");
    Ok(OverlayOutcome::Built {
        title: caption.title,
        meta: caption.meta,
    })
}

/// One recorded reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideOutcome {
    pub index: usize,
    #[serde(serialize_with = "serialize_signal")]
    pub signal: LightboxEvent,
    #[serde(flatten)]
    pub outcome: OverlayOutcome,
}

fn serialize_signal<S: serde::Serializer>(signal: &LightboxEvent, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(match signal {
        LightboxEvent::SlideAfterLoad => "slide_after_load",
        LightboxEvent::SlideChanged => "slide_changed",
    })
}

/// Hooks [`reconcile_slide`] to a lightbox's slide events and keeps a log
/// of what each call did.
#[derive(Debug, Clone, Default)]
pub struct OverlayReconciler {
    log: Rc<RefCell<Vec<SlideOutcome>>>,
}

impl OverlayReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to both slide signals. Either one re-runs the full check.
    pub fn attach(&self, lightbox: &mut dyn LightboxAdapter) {
        for signal in [LightboxEvent::SlideAfterLoad, LightboxEvent::SlideChanged] {
            let log = Rc::clone(&self.log);
            let handler = Rc::new(move |doc: &mut Document, event: &SlideEvent| -> DomResult<()> {
                let outcome = reconcile_slide(doc, event.slide)?;
                log.borrow_mut().push(SlideOutcome {
                    index: event.index,
                    signal,
                    outcome,
                });
                Ok(())
            });
            match signal {
                LightboxEvent::SlideAfterLoad => lightbox.on_slide_loaded(handler),
                LightboxEvent::SlideChanged => lightbox.on_slide_changed(handler),
            }
        }
    }

    pub fn outcomes(&self) -> Vec<SlideOutcome> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

/// Overlays currently mounted under `slide`'s media container.
pub fn overlay_count(doc: &Document, slide: NodeId) -> usize {
    doc.query(slide, MEDIA_SELECTOR)
        .ok()
        .flatten()
        .map(|media| doc.query_all(media, OVERLAY_SELECTOR).map(|v| v.len()).unwrap_or(0))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn slide(doc: &mut Document, panel: &str) -> NodeId {
        let markup = format!(
            r#"<div class="gslide"><div class="gslide-inner-content"><div class="ginner-container">
                <div class="gslide-media gslide-image"><img src="full.jpg"></div>
                {panel}
            </div></div></div>"#
        );
        doc.insert_markup(doc.body(), &markup).unwrap()[0]
    }

    fn panel_hidden(doc: &Document, slide: NodeId) -> bool {
        let panel = doc.query(slide, PANEL_SELECTOR).unwrap().unwrap();
        doc.style(panel, "display").as_deref() == Some("none")
    }

    fn overlay_text(doc: &Document, slide: NodeId) -> (String, String) {
        let overlay = doc.query(slide, ".gslide-media .glightbox-custom-caption").unwrap().unwrap();
        let h5 = doc.query(overlay, "h5").unwrap().map(|n| doc.text_content(n)).unwrap_or_default();
        let p = doc.query(overlay, "p").unwrap().map(|n| doc.text_content(n)).unwrap_or_default();
        (h5, p)
    }

    #[test]
    fn test_no_media_container_is_not_ready() {
        let mut doc = Document::new();
        let node = doc.insert_markup(doc.body(), r#"<div class="gslide"></div>"#).unwrap()[0];
        assert_eq!(reconcile_slide(&mut doc, node).unwrap(), OverlayOutcome::NotReady);
    }

    #[test]
    fn test_builds_from_title_and_description() {
        let mut doc = Document::new();
        let s = slide(
            &mut doc,
            r#"<div class="gslide-description"><div class="gdesc-inner">
                 <h4 class="gslide-title">Harbor at dusk</h4>
                 <div class="gslide-desc">June 1, 2023 • Pier</div></div></div>"#,
        );
        let outcome = reconcile_slide(&mut doc, s).unwrap();
        assert_eq!(
            outcome,
            OverlayOutcome::Built {
                title: Some("Harbor at dusk".into()),
                meta: Some("June 1, 2023 • Pier".into()),
            }
        );
        assert!(panel_hidden(&doc, s));
        assert_eq!(
            overlay_text(&doc, s),
            ("Harbor at dusk".into(), "June 1, 2023 • Pier".into())
        );
    }

    #[test]
    fn test_reconciling_twice_yields_one_overlay() {
        let mut doc = Document::new();
        let s = slide(
            &mut doc,
            r#"<div class="gslide-description"><div class="gslide-desc">Storm clouds gathering May 2, 2022 • Lakefront</div></div>"#,
        );
        assert!(reconcile_slide(&mut doc, s).unwrap().mounted());
        assert_eq!(reconcile_slide(&mut doc, s).unwrap(), OverlayOutcome::AlreadyMounted);
        assert_eq!(overlay_count(&doc, s), 1);
        assert_eq!(
            overlay_text(&doc, s),
            ("Storm clouds gathering".into(), "May 2, 2022 • Lakefront".into())
        );
    }

    #[test]
    fn test_line_break_split() {
        let mut doc = Document::new();
        let s = slide(
            &mut doc,
            "<div class=\"gslide-description\"><div class=\"gslide-desc\">Sunset over the bay\nJuly 4, 2021 • Harbor</div></div>",
        );
        reconcile_slide(&mut doc, s).unwrap();
        assert_eq!(
            overlay_text(&doc, s),
            ("Sunset over the bay".into(), "July 4, 2021 • Harbor".into())
        );
    }

    #[test]
    fn test_moves_pre_authored_overlay() {
        let mut doc = Document::new();
        let s = slide(
            &mut doc,
            r#"<div class="gslide-description"><div class="gslide-desc">
                 <div class="glightbox-custom-caption"><h5>Miso</h5><p>March 3, 2024</p></div>
               </div></div>"#,
        );
        assert_eq!(reconcile_slide(&mut doc, s).unwrap(), OverlayOutcome::Moved);
        let panel = doc.query(s, PANEL_SELECTOR).unwrap().unwrap();
        assert_eq!(doc.query(panel, OVERLAY_SELECTOR).unwrap(), None);
        assert_eq!(overlay_count(&doc, s), 1);
        assert_eq!(overlay_text(&doc, s), ("Miso".into(), "March 3, 2024".into()));
        assert!(panel_hidden(&doc, s));
    }

    #[test]
    fn test_unsplittable_text_becomes_meta() {
        let mut doc = Document::new();
        let s = slide(
            &mut doc,
            r#"<div class="gslide-description"><div class="gslide-desc">Just a note</div></div>"#,
        );
        assert_matches!(
            reconcile_slide(&mut doc, s).unwrap(),
            OverlayOutcome::Built { title: None, meta: Some(ref m) } if m == "Just a note"
        );
        let overlay = doc.query(s, OVERLAY_SELECTOR).unwrap().unwrap();
        assert_eq!(doc.query(overlay, "h5").unwrap(), None);
    }

    #[test]
    fn test_empty_panel_is_hidden() {
        let mut doc = Document::new();
        let s = slide(
            &mut doc,
            r#"<div class="gslide-description"><div class="gslide-desc">   </div></div>"#,
        );
        assert_eq!(reconcile_slide(&mut doc, s).unwrap(), OverlayOutcome::Empty);
        assert!(panel_hidden(&doc, s));
        assert_eq!(overlay_count(&doc, s), 0);
    }

    #[test]
    fn test_slide_without_panel() {
        let mut doc = Document::new();
        let s = slide(&mut doc, "");
        assert_eq!(reconcile_slide(&mut doc, s).unwrap(), OverlayOutcome::Empty);
    }

    #[test]
    fn test_caption_text_is_not_markup() {
        let mut doc = Document::new();
        let s = slide(
            &mut doc,
            r#"<div class="gslide-description"><h4 class="gslide-title">&lt;b&gt;bold&lt;/b&gt;</h4></div>"#,
        );
        reconcile_slide(&mut doc, s).unwrap();
        let overlay = doc.query(s, OVERLAY_SELECTOR).unwrap().unwrap();
        assert_eq!(doc.query(overlay, "b").unwrap(), None);
        assert_eq!(overlay_text(&doc, s).0, "<b>bold</b>");
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = SlideOutcome {
            index: 2,
            signal: LightboxEvent::SlideChanged,
            outcome: OverlayOutcome::AlreadyMounted,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["index"], 2);
        assert_eq!(json["signal"], "slide_changed");
        assert_eq!(json["outcome"], "already_mounted");
    }
}
