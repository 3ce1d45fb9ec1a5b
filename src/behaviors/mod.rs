//! The page behaviors. Each `install` function looks up its own anchors,
//! returns `Wiring::Skipped` when they are missing, and otherwise attaches
//! listeners that live as long as the page.

pub mod anchors;
pub mod back_to_top;
pub mod header;
pub mod lightbox;
pub mod menu;
pub mod progress;
pub mod share;
pub mod slider;
pub mod theme;
pub mod toc;
pub mod video;

use crate::config::ThemeConfig;
use crate::dom::Page;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wiring {
    Attached,
    Skipped(&'static str),
}

type Install = fn(&Page, &ThemeConfig) -> Result<Wiring>;

const BEHAVIORS: &[(&str, Install)] = &[
    ("menu", menu::install),
    ("theme", theme::install),
    ("header", header::install),
    ("progress", progress::install),
    ("toc", toc::install),
    ("back-to-top", back_to_top::install),
    ("slider", slider::install),
    ("share", share::install),
    ("video", video::install),
    ("lightbox", lightbox::install),
    ("anchors", anchors::install),
];

/// Install every behavior. One failing never stops the rest.
pub fn install_all(page: &Page, config: &ThemeConfig) -> usize {
    let mut attached = 0;
    for (name, install) in BEHAVIORS {
        match install(page, config) {
            Ok(Wiring::Attached) => {
                log::debug!("[{}] attached", name);
                attached += 1;
            }
            Ok(Wiring::Skipped(reason)) => log::debug!("[{}] skipped: {}", name, reason),
            Err(e) => log::warn!("[{}] setup failed: {}", name, e),
        }
    }
    attached
}
