use lightframe_common::{Error, ModuleState};
use lightframe_dom::{Document, DomResult, NodeId};
use lightframe_player::{CleanupReport, PageModule, PlayerError, Result};
use tracing::{debug, info, warn};

use super::{begin, element, escape, LightboxHost, PageRender};
use crate::config::LightboxConfig;
use crate::models::Photo;

/// Body markup of the photo gallery page.
pub const GALLERY_PAGE_MARKUP: &str = r#"<main class="container"><div id="galleryGrid" class="row"></div></main>"#;

const LOADING: &str = r#"<div class="col-12 text-center"><div class="alert alert-info" role="alert"><i class="fas fa-spinner fa-spin"></i> Loading photo gallery...</div></div>"#;

/// User-facing text for a failed gallery load.
fn failure_message(error: &Error) -> &'static str {
    match error {
        Error::NotFound(_) => "Gallery data file not found. Please contact the site administrator.",
        Error::Json(_) => "Gallery data is corrupted or in an invalid format.",
        Error::InvalidInput(_) => {
            "There was a problem processing the gallery data. The images may be in an unexpected format."
        }
        Error::Io(_) => "Unable to connect to the server. Please check your internet connection.",
    }
}

/// The photo gallery grid with its lightbox.
#[derive(Debug)]
pub struct GalleryPage {
    grid: NodeId,
    state: ModuleState,
    lightbox: LightboxHost,
}

impl GalleryPage {
    const NAME: &'static str = "gallery";

    /// Attach to the `#galleryGrid` container.
    pub fn new(doc: &Document, lightbox: LightboxConfig) -> Result<Self> {
        let grid = doc
            .get_element_by_id("galleryGrid")
            .ok_or(PlayerError::missing("#galleryGrid"))?;
        Ok(Self {
            grid,
            state: ModuleState::Uninitialized,
            lightbox: LightboxHost::new(lightbox),
        })
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Show the loading panel and start accepting data.
    pub fn init(&mut self, doc: &mut Document) -> Result<()> {
        begin(&mut self.state, Self::NAME)?;
        doc.set_inner_markup(self.grid, LOADING)?;
        Ok(())
    }

    /// Render the loaded photos, or an error panel.
    pub fn render(&mut self, doc: &mut Document, photos: lightframe_common::Result<Vec<Photo>>) -> Result<PageRender> {
        if !self.state.is_active() {
            debug!(state = %self.state, "gallery data arrived after teardown, ignored");
            return Ok(PageRender::Ignored);
        }

        let photos = match photos {
            Ok(photos) => photos,
            Err(e) => {
                warn!(error = %e, "failed to load gallery");
                let message = failure_message(&e);
                self.show_error(doc, message)?;
                return Ok(PageRender::Failed {
                    message: message.to_string(),
                });
            }
        };

        doc.clear_children(self.grid)?;
        let mut items = 0;
        for photo in photos.iter().filter(|p| p.is_valid()) {
            match self.append_item(doc, photo) {
                Ok(()) => items += 1,
                Err(e) => warn!(thumb = %photo.thumb, error = %e, "skipping gallery item"),
            }
        }
        if items == 0 {
            let message = failure_message(&Error::validation("No gallery items could be created"));
            self.show_error(doc, message)?;
            return Ok(PageRender::Failed {
                message: message.to_string(),
            });
        }

        self.lightbox.mount(doc)?;
        info!(items, "gallery rendered");
        Ok(PageRender::Rendered { items })
    }

    fn append_item(&self, doc: &mut Document, photo: &Photo) -> DomResult<()> {
        let col = element(doc, "div", "col-6 col-md-4 col-lg-3 mb-4 gallery-item")?;

        let anchor = element(doc, "a", "glightbox")?;
        doc.set_attr(anchor, "href", &photo.full)?;
        doc.set_attr(anchor, "data-gallery", "gallery")?;
        doc.set_attr(anchor, "data-title", &escape(&photo.caption))?;
        doc.set_attr(anchor, "data-description", &escape(&photo.meta_line()))?;

        let pic = element(doc, "div", "gallery-pic")?;
        let img = element(doc, "img", "img-fluid rounded shadow-sm")?;
        doc.set_attr(img, "src", &photo.thumb)?;
        doc.set_attr(img, "alt", &photo.caption)?;
        doc.set_attr(img, "loading", "lazy")?;

        let heading = element(doc, "h5", "mt-2")?;
        let strong = doc.create_element("strong");
        doc.set_text(strong, &photo.caption)?;

        doc.append_child(pic, img)?;
        doc.append_child(anchor, pic)?;
        doc.append_child(col, anchor)?;
        doc.append_child(heading, strong)?;
        doc.append_child(col, heading)?;
        let rule = doc.create_element("hr");
        doc.append_child(col, rule)?;
        doc.append_child(self.grid, col)
    }

    fn show_error(&self, doc: &mut Document, message: &str) -> DomResult<()> {
        doc.set_inner_markup(
            self.grid,
            &format!(
                r#"<div class="col-12 text-center"><div class="alert alert-warning" role="alert"><h5><i class="fas fa-exclamation-triangle"></i> Gallery Loading Issue</h5><p>{}</p></div></div>"#,
                escape(message)
            ),
        )?;
        Ok(())
    }

    pub fn lightbox(&mut self) -> &mut LightboxHost {
        &mut self.lightbox
    }
}

impl PageModule for GalleryPage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn cleanup(&mut self, doc: &mut Document) -> CleanupReport {
        if self.lightbox.destroy(doc) {
            debug!("gallery lightbox destroyed");
        }
        if self.state.is_active() {
            info!("gallery torn down");
        }
        self.state = ModuleState::TornDown;
        CleanupReport::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use lightframe_player::{LightboxAdapter, OverlayOutcome};

    fn photo(caption: &str) -> Photo {
        Photo {
            thumb: format!("thumbs/{caption}.webp"),
            full: format!("full/{caption}.jpg"),
            caption: caption.to_string(),
            date: "June 1, 2023".into(),
            location: Some("Harbor".into()),
            camera: Some("X100V".into()),
            ..Photo::default()
        }
    }

    fn page() -> (Document, GalleryPage) {
        let mut doc = Document::new();
        doc.insert_markup(doc.body(), GALLERY_PAGE_MARKUP).unwrap();
        let mut page = GalleryPage::new(&doc, LightboxConfig::default()).unwrap();
        page.init(&mut doc).unwrap();
        (doc, page)
    }

    #[test]
    fn test_render_builds_anchors_and_lightbox() {
        let (mut doc, mut page) = page();
        let render = page.render(&mut doc, Ok(vec![photo("Pier"), photo("Dunes")])).unwrap();
        assert_eq!(render, PageRender::Rendered { items: 2 });

        let anchors = doc.query_all(doc.root(), "a.glightbox").unwrap();
        assert_eq!(anchors.len(), 2);
        assert_eq!(doc.attr(anchors[0], "data-title").as_deref(), Some("Pier"));
        assert_eq!(
            doc.attr(anchors[0], "data-description").as_deref(),
            Some("June 1, 2023 • Harbor • X100V")
        );

        let widget = page.lightbox().widget_mut().unwrap();
        assert_eq!(widget.slide_count(), 2);
        widget.open(&mut doc, 0).unwrap();
        let outcomes = page.lightbox().reconciler().outcomes();
        assert_eq!(
            outcomes[0].outcome,
            OverlayOutcome::Built {
                title: Some("Pier".into()),
                meta: Some("June 1, 2023 • Harbor • X100V".into()),
            }
        );
    }

    #[test]
    fn test_failures_show_error_panel() {
        let (mut doc, mut page) = page();
        let render = page
            .render(&mut doc, Err(Error::not_found("gallery.json")))
            .unwrap();
        assert_matches!(render, PageRender::Failed { ref message } if message.contains("not found"));
        let alert = doc.query(doc.root(), "#galleryGrid .alert-warning p").unwrap().unwrap();
        assert!(doc.text_content(alert).contains("Gallery data file not found"));
        assert!(page.lightbox().widget_mut().is_none());
    }

    #[test]
    fn test_late_data_after_teardown_is_ignored() {
        let (mut doc, mut page) = page();
        page.cleanup(&mut doc);
        let render = page.render(&mut doc, Ok(vec![photo("Pier")])).unwrap();
        assert_eq!(render, PageRender::Ignored);
        assert!(doc.query(doc.root(), "a.glightbox").unwrap().is_none());
    }

    #[test]
    fn test_cleanup_destroys_lightbox_and_allows_reinit() {
        let (mut doc, mut page) = page();
        page.render(&mut doc, Ok(vec![photo("Pier")])).unwrap();
        page.lightbox().widget_mut().unwrap().open(&mut doc, 0).unwrap();
        assert!(doc.query(doc.root(), ".glightbox-container").unwrap().is_some());

        page.cleanup(&mut doc);
        assert!(doc.query(doc.root(), ".glightbox-container").unwrap().is_none());
        assert_eq!(page.state(), ModuleState::TornDown);
        page.cleanup(&mut doc);

        page.init(&mut doc).unwrap();
        assert!(page.init(&mut doc).is_err());
    }

    #[test]
    fn test_caption_markup_is_escaped() {
        let (mut doc, mut page) = page();
        page.render(&mut doc, Ok(vec![photo("<b>Pier</b>")])).unwrap();
        let widget = page.lightbox().widget_mut().unwrap();
        widget.open(&mut doc, 0).unwrap();
        let slide = widget.current_slide().unwrap();
        let h5 = doc.query(slide, ".glightbox-custom-caption h5").unwrap().unwrap();
        assert_eq!(doc.text_content(h5), "<b>Pier</b>");
    }
}
