//! Lifecycle coordinator.
//!
//! Binds page-module cleanup to the page termination signals
//! (`beforeunload`, `pagehide`, `popstate`, `hashchange`, and
//! `visibilitychange` when the page becomes hidden). Each signal drains every
//! registered module, releases live media sources, and on the unload path
//! cancels pending timers. Every step is isolated: a failing module or media
//! element is logged and the rest still run.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use lightframe_common::TerminationSignal;
use lightframe_dom::{Document, DomResult, EventTarget, EventType, NodeId, Visibility};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LifecycleConfig;
use crate::error::{PlayerError, Result};
use crate::registry::{CleanupReport, ListenerRegistry};

/// A page-view module whose bindings the coordinator tears down.
pub trait PageModule {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Remove everything the module installed. Must be idempotent.
    fn cleanup(&mut self, doc: &mut Document) -> CleanupReport;
}

/// Shared handle to a registered module.
pub type ModuleHandle = Rc<RefCell<dyn PageModule>>;

/// What one termination signal did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Teardown {
    pub signal: TerminationSignal,
    /// Listener removals summed over every module.
    pub report: CleanupReport,
    /// Modules that ran their cleanup.
    pub modules: usize,
    /// Modules skipped because they were busy.
    pub skipped: usize,
    pub media_released: usize,
    pub timers_cleared: usize,
}

struct State {
    config: LifecycleConfig,
    modules: Vec<ModuleHandle>,
    teardowns: Vec<Teardown>,
}

/// Owns the termination-signal listeners and the registered modules.
pub struct LifecycleCoordinator {
    state: Rc<RefCell<State>>,
    registry: ListenerRegistry,
}

impl fmt::Debug for LifecycleCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("LifecycleCoordinator")
            .field("modules", &state.modules.len())
            .field("teardowns", &state.teardowns.len())
            .field("listeners", &self.registry.len())
            .finish()
    }
}

impl LifecycleCoordinator {
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                config,
                modules: Vec::new(),
                teardowns: Vec::new(),
            })),
            registry: ListenerRegistry::new(),
        }
    }

    /// Hand a module to the coordinator. Modules stay registered across
    /// teardowns; their cleanup is idempotent.
    pub fn register(&self, module: ModuleHandle) {
        let name = module.borrow().name().to_string();
        debug!(module = %name, "page module registered");
        self.state.borrow_mut().modules.push(module);
    }

    pub fn module_count(&self) -> usize {
        self.state.borrow().modules.len()
    }

    pub fn is_installed(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Listen for every termination signal.
    pub fn install(&mut self, doc: &mut Document) -> Result<()> {
        if self.is_installed() {
            return Err(PlayerError::already_active("lifecycle coordinator"));
        }
        for signal in TerminationSignal::ALL {
            let (target, kind) = signal_source(signal);
            let weak = Rc::downgrade(&self.state);
            self.registry.on(doc, target, kind, move |doc: &mut Document, _| {
                on_signal(&weak, doc, signal)
            })?;
        }
        info!(signals = TerminationSignal::ALL.len(), "lifecycle coordinator installed");
        Ok(())
    }

    /// Run a teardown directly, as if `signal` had fired.
    pub fn teardown(&self, doc: &mut Document, signal: TerminationSignal) -> Teardown {
        run_teardown(&self.state, doc, signal)
    }

    pub fn teardowns(&self) -> Vec<Teardown> {
        self.state.borrow().teardowns.clone()
    }

    /// Remove the coordinator's own signal listeners.
    pub fn uninstall(&mut self, doc: &mut Document) -> CleanupReport {
        let report = self.registry.cleanup(doc);
        debug!(removed = report.removed, "lifecycle coordinator uninstalled");
        report
    }
}

fn signal_source(signal: TerminationSignal) -> (EventTarget, EventType) {
    match signal {
        TerminationSignal::BeforeUnload => (EventTarget::Window, EventType::BeforeUnload),
        TerminationSignal::PageHide => (EventTarget::Window, EventType::PageHide),
        TerminationSignal::PopState => (EventTarget::Window, EventType::PopState),
        TerminationSignal::HashChange => (EventTarget::Window, EventType::HashChange),
        TerminationSignal::VisibilityHidden => (EventTarget::Document, EventType::VisibilityChange),
    }
}

fn on_signal(state: &Weak<RefCell<State>>, doc: &mut Document, signal: TerminationSignal) -> DomResult<()> {
    if signal == TerminationSignal::VisibilityHidden && doc.visibility() != Visibility::Hidden {
        return Ok(());
    }
    if let Some(state) = state.upgrade() {
        run_teardown(&state, doc, signal);
    }
    Ok(())
}

fn run_teardown(state: &Rc<RefCell<State>>, doc: &mut Document, signal: TerminationSignal) -> Teardown {
    // Modules may re-enter the coordinator, so no borrow is held across calls.
    let (modules, config) = {
        let state = state.borrow();
        (state.modules.clone(), state.config.clone())
    };

    let mut teardown = Teardown {
        signal,
        report: CleanupReport::default(),
        modules: 0,
        skipped: 0,
        media_released: 0,
        timers_cleared: 0,
    };

    for module in &modules {
        match module.try_borrow_mut() {
            Ok(mut module) => {
                let report = module.cleanup(doc);
                debug!(module = %module.name(), removed = report.removed, failed = report.failed, "module cleaned up");
                teardown.report += report;
                teardown.modules += 1;
            }
            Err(_) => {
                warn!(%signal, "page module busy during teardown, skipped");
                teardown.skipped += 1;
            }
        }
    }

    if config.release_media {
        for node in doc.media_elements() {
            if release_media(doc, node) {
                teardown.media_released += 1;
            }
        }
    }

    if signal.is_unload() && config.cancel_timers_on_unload {
        teardown.timers_cleared = doc.clear_all_timers();
    }

    info!(
        %signal,
        modules = teardown.modules,
        removed = teardown.report.removed,
        failed = teardown.report.failed,
        media = teardown.media_released,
        timers = teardown.timers_cleared,
        "page view torn down"
    );
    state.borrow_mut().teardowns.push(teardown.clone());
    teardown
}

/// Pause the element and detach its source. Returns whether every step
/// succeeded.
fn release_media(doc: &mut Document, node: NodeId) -> bool {
    let mut clean = true;
    let mut step = |what: &str, result: DomResult<()>| {
        if let Err(e) = result {
            warn!(node = ?node, step = what, error = %e, "media release step failed (non-critical)");
            clean = false;
        }
    };

    step("pause", doc.pause(node));
    step("clear src", doc.set_media_src(node, ""));
    let sources: Vec<NodeId> = doc
        .element_children(node)
        .into_iter()
        .filter(|&child| doc.tag(child).is_ok_and(|tag| tag == "source"))
        .collect();
    for source in sources {
        step("detach source", doc.detach(source));
    }
    step("load", doc.load_media(node));
    clean
}
