use std::rc::Rc;

use super::Wiring;
use crate::config::ThemeConfig;
use crate::dom::{self, Page};
use crate::error::Result;
use crate::schedule::{BrowserFrames, FrameThrottle};

const BUTTON_ID: &str = "back-to-top";
const VISIBLE_CLASS: &str = "visible";

pub fn is_visible(scroll_y: f64, offset: f64) -> bool {
    scroll_y > offset
}

pub fn install(page: &Page, config: &ThemeConfig) -> Result<Wiring> {
    let Some(button) = page.by_id(BUTTON_ID) else {
        return Ok(Wiring::Skipped("no #back-to-top"));
    };

    let offset = config.back_to_top.visible_offset;
    let reader = page.clone();
    let target = button.clone();
    let update: Rc<dyn Fn()> = Rc::new(move || {
        dom::set_class(&target, VISIBLE_CLASS, is_visible(reader.scroll_y(), offset));
    });
    let throttle = FrameThrottle::new(BrowserFrames, update);
    dom::listen(&page.window, "scroll", move |_| {
        throttle.poke();
    });

    let scroller = page.clone();
    dom::listen(&button, "click", move |_| scroller.smooth_scroll_to(0.0));

    Ok(Wiring::Attached)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_threshold() {
        assert!(!is_visible(0.0, 500.0));
        assert!(!is_visible(500.0, 500.0));
        assert!(is_visible(501.0, 500.0));
    }
}
