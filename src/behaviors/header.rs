use std::rc::Rc;

use super::Wiring;
use crate::config::ThemeConfig;
use crate::dom::{self, Page};
use crate::error::Result;
use crate::schedule::{BrowserFrames, FrameThrottle};

const HEADER_ID: &str = "gh-head";
const SCROLLED_CLASS: &str = "scrolled";

pub fn is_scrolled(scroll_y: f64, offset: f64) -> bool {
    scroll_y > offset
}

pub fn install(page: &Page, config: &ThemeConfig) -> Result<Wiring> {
    let Some(header) = page.by_id(HEADER_ID) else {
        return Ok(Wiring::Skipped("no #gh-head"));
    };

    let offset = config.header.scrolled_offset;
    let reader = page.clone();
    let update: Rc<dyn Fn()> = Rc::new(move || {
        dom::set_class(&header, SCROLLED_CLASS, is_scrolled(reader.scroll_y(), offset));
    });
    let throttle = FrameThrottle::new(BrowserFrames, update);
    dom::listen(&page.window, "scroll", move |_| {
        throttle.poke();
    });

    Ok(Wiring::Attached)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(!is_scrolled(0.0, 100.0));
        assert!(!is_scrolled(100.0, 100.0));
        assert!(is_scrolled(100.5, 100.0));
        assert!(is_scrolled(2400.0, 100.0));
    }
}
