//! Interactive behaviors for the Enjin publication theme.
//!
//! Compiled to WebAssembly and loaded by the theme's pages. On start it
//! wires navigation, theme switching, scroll-driven header/progress/ToC
//! state, the hero slider, copy-link buttons, an optional image lightbox,
//! smooth anchor scrolling and fluid video embeds. Every behavior is
//! optional: if its markup is missing it simply stays off.

pub mod behaviors;
pub mod boot;
pub mod config;
pub mod dom;
pub mod error;
pub mod logging;
pub mod media;
pub mod schedule;


use log::LevelFilter;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    logging::init(LevelFilter::Warn);
    boot::run();
}

/// Wrap the embedded players inside `container` so they scale with its
/// width. For content inserted after the page booted. Returns how many
/// elements were wrapped.
#[wasm_bindgen(js_name = fitMedia)]
pub fn fit_media(container: &web_sys::Element) -> usize {
    let config = match web_sys::window().and_then(|w| w.document()) {
        Some(document) => config::ThemeConfig::for_page(&document),
        None => config::ThemeConfig::bundled(),
    };
    match media::shared(&config.media) {
        Ok(embedder) => embedder.fit(container),
        Err(e) => {
            log::warn!("[media] {}", e);
            0
        }
    }
}
