use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use url::{ParseError, Url};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Element, Window};

use super::Wiring;
use crate::config::{ShareConfig, ThemeConfig};
use crate::dom::{self, Page};
use crate::error::{Result, ThemeError};
use crate::schedule::{BrowserTimers, Timers};

const BUTTONS: &str = ".share-copy";
const COPIED_CLASS: &str = "copied";

/// The URL a copy button shares: its `data-url` if set, otherwise the page
/// itself. Absolute overrides are copied as written; only relative ones are
/// resolved against the page.
pub fn share_target(data_url: Option<&str>, page_url: &str) -> String {
    let Some(raw) = data_url.map(str::trim).filter(|s| !s.is_empty()) else {
        return page_url.to_string();
    };
    match Url::parse(raw) {
        Err(ParseError::RelativeUrlWithoutBase) => Url::parse(page_url)
            .and_then(|base| base.join(raw))
            .map(|resolved| resolved.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        _ => raw.to_string(),
    }
}

/// Visual "copied" acknowledgment of one button.
pub trait CopyIndicator {
    fn set_copied(&self, copied: bool);
}

/// Shows the acknowledgment after a successful copy and clears it after a
/// fixed delay. A second success inside the window restarts the delay.
pub struct CopyFeedback<T: Timers> {
    timers: T,
    reset_ms: u32,
    indicator: Rc<dyn CopyIndicator>,
    pending: RefCell<Option<T::Handle>>,
}

impl<T: Timers> CopyFeedback<T> {
    pub fn new(timers: T, reset_ms: u32, indicator: Rc<dyn CopyIndicator>) -> Self {
        CopyFeedback {
            timers,
            reset_ms,
            indicator,
            pending: RefCell::new(None),
        }
    }

    pub fn acknowledge(&self) {
        self.pending.borrow_mut().take();
        self.indicator.set_copied(true);
        let indicator = Rc::clone(&self.indicator);
        let handle = self
            .timers
            .timeout(self.reset_ms, Box::new(move || indicator.set_copied(false)));
        *self.pending.borrow_mut() = Some(handle);
    }

    /// Outcome of a clipboard write. Failures are logged and change nothing
    /// on screen.
    pub fn finish(&self, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.acknowledge(),
            Err(e) => log::error!("[share] failed to copy: {}", e),
        }
    }
}

/// Label swap on the button's first `span` plus the `copied` class.
struct ButtonIndicator {
    button: Element,
    label: Option<Element>,
    copied_label: String,
    idle_label: String,
}

impl CopyIndicator for ButtonIndicator {
    fn set_copied(&self, copied: bool) {
        if let Some(label) = &self.label {
            let text = if copied {
                &self.copied_label
            } else {
                &self.idle_label
            };
            label.set_text_content(Some(text));
        }
        dom::set_class(&self.button, COPIED_CLASS, copied);
    }
}

async fn write_clipboard(window: Window, text: String) -> Result<()> {
    let navigator = window.navigator();
    let clipboard = Reflect::get(&navigator, &JsValue::from_str("clipboard"))?;
    if clipboard.is_undefined() || clipboard.is_null() {
        return Err(ThemeError::new("clipboard API unavailable"));
    }
    let write = Reflect::get(&clipboard, &JsValue::from_str("writeText"))?
        .dyn_into::<Function>()
        .map_err(|_| ThemeError::new("clipboard.writeText is not a function"))?;
    let promise = write
        .call1(&clipboard, &JsValue::from_str(&text))?
        .dyn_into::<Promise>()
        .map_err(|_| ThemeError::new("clipboard.writeText did not return a promise"))?;
    JsFuture::from(promise).await?;
    Ok(())
}

fn wire_button(page: &Page, button: Element, config: &ShareConfig) {
    let label = button.query_selector("span").ok().flatten();
    let indicator: Rc<dyn CopyIndicator> = Rc::new(ButtonIndicator {
        button: button.clone(),
        label,
        copied_label: config.copied_label.clone(),
        idle_label: config.idle_label.clone(),
    });
    let feedback = Rc::new(CopyFeedback::new(BrowserTimers, config.reset_ms, indicator));

    let page = page.clone();
    let target = button.clone();
    dom::listen(&button, "click", move |_| {
        let page_url = page.location_href().unwrap_or_default();
        let url = share_target(target.get_attribute("data-url").as_deref(), &page_url);
        let feedback = Rc::clone(&feedback);
        let window = page.window.clone();
        spawn_local(async move {
            let outcome = write_clipboard(window, url).await;
            feedback.finish(outcome);
        });
    });
}

pub fn install(page: &Page, config: &ThemeConfig) -> Result<Wiring> {
    let buttons = page.query_all(BUTTONS);
    if buttons.is_empty() {
        return Ok(Wiring::Skipped("no .share-copy buttons"));
    }
    for button in buttons {
        wire_button(page, button, &config.share);
    }
    Ok(Wiring::Attached)
}
