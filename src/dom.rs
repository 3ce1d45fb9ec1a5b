use gloo::events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, ScrollBehavior, ScrollToOptions, Window,
};

/// The window/document pair every behavior works against.
#[derive(Clone)]
pub struct Page {
    pub window: Window,
    pub document: Document,
}

impl Page {
    pub fn current() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Page { window, document })
    }

    pub fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    /// First element matching `selector`. An invalid selector counts as absent.
    pub fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    pub fn query_all(&self, selector: &str) -> Vec<Element> {
        match self.document.query_selector_all(selector) {
            Ok(list) => collect_nodes(&list),
            Err(_) => Vec::new(),
        }
    }

    pub fn root(&self) -> Option<Element> {
        self.document.document_element()
    }

    pub fn body(&self) -> Option<HtmlElement> {
        self.document.body()
    }

    pub fn scroll_y(&self) -> f64 {
        self.window.page_y_offset().unwrap_or(0.0)
    }

    pub fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    pub fn smooth_scroll_to(&self, top: f64) {
        let opts = ScrollToOptions::new();
        opts.set_top(top);
        opts.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&opts);
    }

    pub fn location_href(&self) -> Option<String> {
        self.window.location().href().ok()
    }
}

pub fn query_all_in(scope: &Element, selector: &str) -> Vec<Element> {
    match scope.query_selector_all(selector) {
        Ok(list) => collect_nodes(&list),
        Err(_) => Vec::new(),
    }
}

fn collect_nodes(list: &web_sys::NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn set_class(el: &Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}

pub fn has_class(el: &Element, class: &str) -> bool {
    el.class_list().contains(class)
}

pub fn set_style(el: &Element, property: &str, value: &str) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let _ = html.style().set_property(property, value);
    }
}

/// Inline style value for `property`, if one is declared.
pub fn inline_style(el: &Element, property: &str) -> Option<String> {
    let html = el.dyn_ref::<HtmlElement>()?;
    let value = html.style().get_property_value(property).ok()?;
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub fn remove_style(el: &Element, property: &str) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let _ = html.style().remove_property(property);
    }
}

// ── Listeners ─────────────────────────────────────────
// Listeners live for the lifetime of the page, so they are leaked on purpose.

/// Passive listener; the callback cannot cancel the default action.
pub fn listen<F>(target: &EventTarget, event: &'static str, callback: F)
where
    F: FnMut(&Event) + 'static,
{
    EventListener::new(target, event, callback).forget();
}

/// Listener allowed to call `prevent_default`.
pub fn listen_active<F>(target: &EventTarget, event: &'static str, callback: F)
where
    F: FnMut(&Event) + 'static,
{
    EventListener::new_with_options(
        target,
        event,
        EventListenerOptions::enable_prevent_default(),
        callback,
    )
    .forget();
}

// ── Attribute parsing ─────────────────────────────────

/// Leading base-10 integer of an attribute value ("640px" -> 640), the way
/// browsers read legacy dimension attributes. `None` if there are no digits.
pub fn parse_int_prefix(value: &str) -> Option<i64> {
    let s = value.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let n: i64 = digits[..end].parse().ok()?;
    Some(if negative { -n } else { n })
}

/// Whether an attribute value reads as a number as a whole (an empty or
/// blank value reads as zero). Missing attributes are never numeric.
pub fn is_numeric(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) => {
            let t = v.trim();
            t.is_empty() || t.parse::<f64>().map(|n| !n.is_nan()).unwrap_or(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("640"), Some(640));
        assert_eq!(parse_int_prefix("  480px"), Some(480));
        assert_eq!(parse_int_prefix("-12"), Some(-12));
        assert_eq!(parse_int_prefix("12.9"), Some(12));
        assert_eq!(parse_int_prefix("100%"), Some(100));
        assert_eq!(parse_int_prefix("auto"), None);
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric(Some("480")));
        assert!(is_numeric(Some(" 3.5 ")));
        assert!(is_numeric(Some("")));
        assert!(!is_numeric(Some("100%")));
        assert!(!is_numeric(Some("auto")));
        assert!(!is_numeric(None));
    }
}
