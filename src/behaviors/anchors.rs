use wasm_bindgen::JsCast;
use web_sys::{Element, Event};

use super::Wiring;
use crate::config::{AnchorConfig, ThemeConfig};
use crate::dom::{self, Page};
use crate::error::Result;

const FRAGMENT_LINKS: &str = "a[href^=\"#\"]";

/// Element id a same-page link should scroll to, or `None` when the click
/// belongs to the browser (bare `#`) or to the members portal.
pub fn fragment_target<'a>(href: &'a str, config: &AnchorConfig) -> Option<&'a str> {
    if href == "#" || href == config.portal_route {
        return None;
    }
    if !config.portal_marker.is_empty() && href.contains(config.portal_marker.as_str()) {
        return None;
    }
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

/// Document offset to scroll to so the target clears the fixed header.
pub fn scroll_destination(target_top: f64, scroll_y: f64, header_offset: f64) -> f64 {
    target_top + scroll_y - header_offset
}

fn find_target(page: &Page, id: &str) -> Option<Element> {
    if let Some(el) = page.by_id(id) {
        return Some(el);
    }
    let decoded = js_sys::decode_uri_component(id).ok()?;
    page.by_id(&String::from(decoded))
}

pub fn install(page: &Page, config: &ThemeConfig) -> Result<Wiring> {
    let links = page.query_all(FRAGMENT_LINKS);
    if links.is_empty() {
        return Ok(Wiring::Skipped("no fragment links"));
    }

    for link in links {
        let page = page.clone();
        let config = config.anchors.clone();
        dom::listen_active(&link, "click", move |event: &Event| {
            let Some(href) = event
                .current_target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.get_attribute("href"))
            else {
                return;
            };
            let Some(id) = fragment_target(&href, &config) else {
                return;
            };
            // Unknown targets keep the browser's default jump.
            let Some(target) = find_target(&page, id) else {
                return;
            };
            event.prevent_default();
            let top = scroll_destination(
                target.get_bounding_client_rect().top(),
                page.scroll_y(),
                config.header_offset,
            );
            page.smooth_scroll_to(top);
        });
    }

    Ok(Wiring::Attached)
}
