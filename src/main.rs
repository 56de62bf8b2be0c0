mod cli;

use lightframe::{config, session};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use lightframe_caption::split_caption;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "lightframe=trace,lightframe_player=trace,lightframe_dom=debug,lightframe_common=debug".to_string()
        } else {
            "lightframe=info,lightframe_player=info,lightframe_dom=warn".to_string()
        }
    });

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Caption { body, title, json } => caption(&title, &body, json),
        Commands::Play {
            projects,
            id,
            duration,
            json,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            let projects = config::resolve_data_path(&config, &projects);
            let session = rt.block_on(session::play_project(&config, &projects, &id, duration))?;
            print_play(&session, json)
        }
        Commands::Gallery { file, cat, json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            let file = config::resolve_data_path(&config, &file);
            let session = rt.block_on(session::browse_gallery(&config, &file, cat))?;
            print_browse(&session, json)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("lightframe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn caption(title: &str, body: &str, json: bool) -> Result<()> {
    let caption = split_caption(title, body);

    if json {
        println!("{}", serde_json::to_string_pretty(&caption)?);
    } else {
        println!("Title: {}", caption.title.as_deref().unwrap_or("-"));
        println!("Meta:  {}", caption.meta.as_deref().unwrap_or("-"));
        println!("Rule:  {:?}", caption.kind);
    }

    Ok(())
}

fn print_teardowns(teardowns: &[lightframe_player::Teardown]) {
    println!("\nTeardowns: {}", teardowns.len());
    for teardown in teardowns {
        println!(
            "  {}: {} module(s), {} listener(s) removed, {} media released, {} timer(s) cleared",
            teardown.signal,
            teardown.modules,
            teardown.report.removed,
            teardown.media_released,
            teardown.timers_cleared
        );
    }
}

fn print_play(session: &session::PlaySession, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(session)?);
        return Ok(());
    }

    println!("Page view: {}", session.page_view);
    println!("Project: {}", session.project);
    match &session.render {
        lightframe::pages::PageRender::Failed { message } => println!("Render: failed ({})", message),
        other => println!("Render: {:?}", other),
    }

    if !session.steps.is_empty() {
        println!("\n{:>7}  {:<9} {:<7} {:>7}  {:<13} {}", "t(ms)", "action", "state", "time", "clock", "controls");
    }
    for step in &session.steps {
        let player = &step.player;
        let state = if player.ended {
            "ended"
        } else if player.paused {
            "paused"
        } else {
            "playing"
        };
        println!(
            "{:>7}  {:<9} {:<7} {:>7.1}  {:<13} {}",
            step.at_ms,
            step.action,
            state,
            player.current_time,
            player.clock,
            if player.controls_visible { "shown" } else { "hidden" }
        );
    }

    print_teardowns(&session.teardowns);
    println!("Listeners left: {}", session.listeners_left);
    if let Some(src) = &session.media_src_after {
        println!("Media source after teardown: {:?}", src);
    }

    Ok(())
}

fn print_browse(session: &session::BrowseSession, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(session)?);
        return Ok(());
    }

    println!("Page view: {}", session.page_view);
    println!("Page: {}", session.page);
    match &session.render {
        lightframe::pages::PageRender::Failed { message } => println!("Render: failed ({})", message),
        other => println!("Render: {:?}", other),
    }

    println!("\nSlides visited: {}", session.slides.len());
    for slide in &session.slides {
        println!(
            "  [{}] {} | {} ({} overlay)",
            slide.index,
            slide.title.as_deref().unwrap_or("-"),
            slide.meta.as_deref().unwrap_or("-"),
            slide.overlays
        );
    }

    print_teardowns(&session.teardowns);
    println!("Lightbox left: {}", if session.lightbox_left { "yes" } else { "no" });

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Controls idle hide: {} ms", config.player.controls_idle_hide_ms);
            println!("  Wiring delay: {} ms", config.player.wiring_delay_ms);
            println!("  Lightbox selector: {}", config.lightbox.selector);
            println!("  Lightbox loop: {}", config.lightbox.loop_slides);
            println!("  Release media: {}", config.lifecycle.release_media);
            println!("  Data dir: {}", config.data.dir.display());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Controls idle hide: {} ms", config.player.controls_idle_hide_ms);
            println!("  Lightbox selector: {}", config.lightbox.selector);
        }
    }

    Ok(())
}
