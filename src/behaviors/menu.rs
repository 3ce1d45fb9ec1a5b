use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, KeyboardEvent};

use super::Wiring;
use crate::config::ThemeConfig;
use crate::dom::{self, Page};
use crate::error::Result;

const BURGER: &str = ".gh-burger";
const MENU_ID: &str = "mobile-menu";
const OPEN_CLASS: &str = "menu-open";

/// Open/closed state of the mobile navigation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    open: bool,
}

impl MenuState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Close the menu. Returns true if it was open.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    /// Escape only matters while the menu is open.
    pub fn on_key(&mut self, key: &str) -> bool {
        key == "Escape" && self.close()
    }
}

struct MenuView {
    body: HtmlElement,
    burger: Element,
}

impl MenuView {
    fn render(&self, open: bool) {
        dom::set_class(&self.body, OPEN_CLASS, open);
        let _ = self
            .burger
            .set_attribute("aria-expanded", if open { "true" } else { "false" });
    }
}

pub fn install(page: &Page, _config: &ThemeConfig) -> Result<Wiring> {
    let (Some(burger), Some(menu)) = (page.query(BURGER), page.by_id(MENU_ID)) else {
        return Ok(Wiring::Skipped("no burger or #mobile-menu"));
    };
    let Some(body) = page.body() else {
        return Ok(Wiring::Skipped("no <body>"));
    };

    let state = Rc::new(RefCell::new(MenuState {
        open: dom::has_class(&body, OPEN_CLASS),
    }));
    let view = Rc::new(MenuView {
        body,
        burger: burger.clone(),
    });

    {
        let state = Rc::clone(&state);
        let view = Rc::clone(&view);
        dom::listen(&burger, "click", move |_| {
            let open = state.borrow_mut().toggle();
            view.render(open);
        });
    }

    for link in dom::query_all_in(&menu, "a") {
        let state = Rc::clone(&state);
        let view = Rc::clone(&view);
        dom::listen(&link, "click", move |_| {
            state.borrow_mut().close();
            view.render(false);
        });
    }

    dom::listen(&page.document, "keydown", move |event| {
        let Some(key) = event.dyn_ref::<KeyboardEvent>().map(|e| e.key()) else {
            return;
        };
        if state.borrow_mut().on_key(&key) {
            view.render(false);
        }
    });

    Ok(Wiring::Attached)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips() {
        let mut m = MenuState::default();
        assert!(m.toggle());
        assert!(m.is_open());
        assert!(!m.toggle());
        assert!(!m.is_open());
    }

    #[test]
    fn test_escape_closes_only_when_open() {
        let mut m = MenuState::default();
        assert!(!m.on_key("Escape"));
        m.toggle();
        assert!(!m.on_key("Enter"));
        assert!(m.is_open());
        assert!(m.on_key("Escape"));
        assert!(!m.is_open());
    }

    #[test]
    fn test_close_reports_change() {
        let mut m = MenuState::default();
        assert!(!m.close());
        m.toggle();
        assert!(m.close());
    }
}
