//! Scripted page views, end to end through the library.

use std::path::PathBuf;

use lightframe::config::Config;
use lightframe::pages::PageRender;
use lightframe::session::{browse_gallery, play_project, Step};
use lightframe_common::TerminationSignal;
use lightframe_player::OverlayOutcome;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/data")
        .join(name)
}

fn step<'a>(steps: &'a [Step], action: &str) -> &'a Step {
    steps
        .iter()
        .find(|s| s.action == action)
        .unwrap_or_else(|| panic!("no {action} step"))
}

#[tokio::test]
async fn project_playback_then_unload() {
    let config = Config::default();
    let session = play_project(&config, &data("projects.json"), "harbor-reel", 90.0)
        .await
        .unwrap();

    assert_eq!(session.render, PageRender::Scheduled);
    let actions: Vec<&str> = session.steps.iter().map(|s| s.action).collect();
    assert_eq!(
        actions,
        ["metadata", "play", "pointer", "idle", "seek", "rewind", "volume", "mute", "ended", "replay"]
    );

    let metadata = step(&session.steps, "metadata");
    assert_eq!(metadata.at_ms, 500);
    assert_eq!(metadata.player.duration, Some(90.0));
    assert!(metadata.player.paused);

    assert!(!step(&session.steps, "play").player.paused);
    assert!(!step(&session.steps, "idle").player.controls_visible);
    assert_eq!(step(&session.steps, "seek").player.current_time, 45.0);
    assert_eq!(step(&session.steps, "rewind").player.current_time, 35.0);
    assert_eq!(step(&session.steps, "volume").player.volume, 0.3);
    assert!(step(&session.steps, "mute").player.muted);

    let ended = step(&session.steps, "ended");
    assert!(ended.player.ended);
    let replay = step(&session.steps, "replay");
    assert!(!replay.player.paused);
    assert_eq!(replay.player.current_time, 0.0);

    let signals: Vec<TerminationSignal> = session.teardowns.iter().map(|t| t.signal).collect();
    assert_eq!(signals, [TerminationSignal::BeforeUnload, TerminationSignal::PageHide]);
    let first = &session.teardowns[0];
    assert_eq!(first.modules, 1);
    assert!(first.report.removed > 0);
    assert_eq!(first.media_released, 1);
    assert_eq!(session.teardowns[1].report.removed, 0);

    assert_eq!(session.listeners_left, 0);
    assert_eq!(session.media_src_after.as_deref(), Some(""));
}

#[tokio::test]
async fn embedded_project_has_no_player_steps() {
    let session = play_project(&Config::default(), &data("projects.json"), "trailer", 90.0)
        .await
        .unwrap();
    assert_eq!(session.render, PageRender::Scheduled);
    assert!(session.steps.is_empty());
    assert_eq!(session.media_src_after, None);
    assert_eq!(session.listeners_left, 0);
}

#[tokio::test]
async fn unknown_project_and_missing_data() {
    let config = Config::default();
    let session = play_project(&config, &data("projects.json"), "nope", 90.0)
        .await
        .unwrap();
    assert_eq!(
        session.render,
        PageRender::Failed {
            message: "Project not found.".into()
        }
    );

    let session = play_project(&config, &data("absent.json"), "harbor-reel", 90.0)
        .await
        .unwrap();
    assert_eq!(
        session.render,
        PageRender::Failed {
            message: "Error loading project details.".into()
        }
    );
}

#[tokio::test]
async fn invalid_duration_is_rejected() {
    let result = play_project(&Config::default(), &data("projects.json"), "harbor-reel", f64::NAN).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn gallery_walk_keeps_one_overlay_per_slide() {
    let session = browse_gallery(&Config::default(), &data("gallery.json"), false)
        .await
        .unwrap();

    assert_eq!(session.render, PageRender::Rendered { items: 3 });
    let indices: Vec<usize> = session.slides.iter().map(|s| s.index).collect();
    assert_eq!(indices, [0, 1, 2, 1, 0]);
    assert!(session.slides.iter().all(|s| s.overlays == 1));

    assert_eq!(session.slides[0].title.as_deref(), Some("Pier at dawn"));
    assert_eq!(
        session.slides[0].meta.as_deref(),
        Some("June 1, 2023 • Harbor • X100V")
    );
    assert_eq!(session.slides[1].meta.as_deref(), Some("August 20, 2022 • Coast"));

    let built = session.outcomes.iter().filter(|o| o.outcome.mounted()).count();
    assert_eq!(built, 3);
    assert!(session
        .outcomes
        .iter()
        .filter(|o| !o.outcome.mounted())
        .all(|o| o.outcome == OverlayOutcome::AlreadyMounted));

    assert!(!session.lightbox_left);
    assert_eq!(session.teardowns[0].modules, 1);
}

#[tokio::test]
async fn looping_gallery_walk_terminates() {
    let mut config = Config::default();
    config.lightbox.loop_slides = true;
    let session = browse_gallery(&config, &data("gallery.json"), false)
        .await
        .unwrap();
    assert_eq!(session.slides.len(), 5);
}

#[tokio::test]
async fn gallery_without_widget_still_renders() {
    let mut config = Config::default();
    config.lightbox.available = false;
    let session = browse_gallery(&config, &data("gallery.json"), false)
        .await
        .unwrap();
    assert_eq!(session.render, PageRender::Rendered { items: 3 });
    assert!(session.slides.is_empty());
    assert!(session.outcomes.is_empty());
}

#[tokio::test]
async fn cat_gallery_uses_authored_captions() {
    let session = browse_gallery(&Config::default(), &data("cats/miso.json"), true)
        .await
        .unwrap();

    assert_eq!(session.page, "cat");
    assert_eq!(session.render, PageRender::Rendered { items: 3 });
    // Grouped by year, oldest first.
    assert_eq!(session.slides[0].title.as_deref(), Some("Box"));
    assert_eq!(session.slides[0].meta.as_deref(), Some("May 2, 2022"));
    assert_eq!(session.slides[1].title.as_deref(), Some("Nap"));
    assert!(session
        .outcomes
        .iter()
        .filter(|o| o.outcome.mounted())
        .all(|o| o.outcome == OverlayOutcome::Moved));
    assert!(!session.lightbox_left);
}

#[tokio::test]
async fn cat_load_failures() {
    let config = Config::default();
    let session = browse_gallery(&config, &data("cats/broken.json"), true)
        .await
        .unwrap();
    assert_eq!(
        session.render,
        PageRender::Failed {
            message: "Cat data is corrupted. Please contact the site administrator.".into()
        }
    );
    assert!(session.slides.is_empty());

    let session = browse_gallery(&config, &data("cats/ghost.json"), true)
        .await
        .unwrap();
    assert_eq!(
        session.render,
        PageRender::Failed {
            message: "Cat information not found. Please check the URL or try again.".into()
        }
    );
}
