use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use super::Wiring;
use crate::config::ThemeConfig;
use crate::dom::{self, Page};
use crate::error::Result;
use crate::schedule::{BrowserFrames, FrameThrottle};

const BAR: &str = ".reading-progress-bar";
const ARTICLE: &str = ".article";

/// Live geometry needed to place the reader within the article.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingGeometry {
    pub scroll_y: f64,
    /// Article top in document coordinates.
    pub article_top: f64,
    pub article_height: f64,
    pub viewport_height: f64,
}

/// Percentage of the article read, clamped to 0..=100. Reaches 0 when the
/// article top enters the bottom of the viewport and 100 when its bottom
/// leaves the top.
pub fn reading_progress(g: &ReadingGeometry) -> f64 {
    let span = g.article_height + g.viewport_height;
    if span <= 0.0 {
        return 0.0;
    }
    let pct = (g.scroll_y - g.article_top + g.viewport_height) / span * 100.0;
    if pct.is_nan() {
        return 0.0;
    }
    pct.clamp(0.0, 100.0)
}

pub fn install(page: &Page, _config: &ThemeConfig) -> Result<Wiring> {
    let Some(bar) = page.query(BAR) else {
        return Ok(Wiring::Skipped("no progress bar"));
    };
    let Some(article) = page.query(ARTICLE) else {
        return Ok(Wiring::Skipped("no .article"));
    };

    let reader = page.clone();
    let update: Rc<dyn Fn()> = Rc::new(move || {
        let scroll_y = reader.scroll_y();
        let rect = article.get_bounding_client_rect();
        let article_height = article
            .dyn_ref::<HtmlElement>()
            .map(|el| el.offset_height() as f64)
            .unwrap_or_else(|| rect.height());
        let geometry = ReadingGeometry {
            scroll_y,
            article_top: rect.top() + scroll_y,
            article_height,
            viewport_height: reader.viewport_height(),
        };
        let pct = reading_progress(&geometry);
        dom::set_style(&bar, "width", &format!("{}%", pct));
    });
    let throttle = FrameThrottle::new(BrowserFrames, update);
    throttle.run_now();
    dom::listen(&page.window, "scroll", move |_| {
        throttle.poke();
    });

    Ok(Wiring::Attached)
}
