use log::{debug, info, warn};

use crate::behaviors;
use crate::config::ThemeConfig;
use crate::dom::{self, Page};
use crate::logging;

/// When the behaviors can be installed, given `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    Now,
    AfterDomReady,
}

pub fn startup(ready_state: &str) -> Startup {
    if ready_state == "loading" {
        Startup::AfterDomReady
    } else {
        Startup::Now
    }
}

/// Boot sequence. Call once from the start hook.
/// Waits until the document has been parsed, then loads configuration
/// (the page settings block may sit anywhere in the markup) and installs
/// the behaviors.
pub fn run() {
    let Some(page) = Page::current() else {
        warn!("[boot] no window/document, behaviors not installed");
        return;
    };

    // ── 1. Wait for the DOM ────────────────────────────
    match startup(&page.document.ready_state()) {
        Startup::Now => install(&page),
        Startup::AfterDomReady => {
            debug!("[boot] document still loading, waiting for DOMContentLoaded");
            let target = page.document.clone();
            let mut pending = Some(page);
            dom::listen(&target, "DOMContentLoaded", move |_| {
                if let Some(page) = pending.take() {
                    install(&page);
                }
            });
        }
    }
}

fn install(page: &Page) {
    // ── 2. Configuration ───────────────────────────────
    let config = ThemeConfig::for_page(&page.document);
    logging::init(config.level_filter());
    debug!("[boot] configuration loaded");

    // ── 3. Behaviors ───────────────────────────────────
    info!("[boot] installing theme behaviors");
    let attached = behaviors::install_all(page, &config);
    info!("[boot] {} behaviors attached", attached);
}
