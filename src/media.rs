//! Fluid media embedding.
//!
//! Third-party players (YouTube, Vimeo, Kickstarter iframes and plugin
//! `object`/`embed` elements) are wrapped in an intrinsic-ratio box: a
//! full-width container whose `padding-top` is the element's height/width
//! ratio, with the player absolutely positioned inside it. The player then
//! keeps its aspect ratio at any container width.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use regex::RegexSet;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element};

use crate::config::MediaConfig;
use crate::dom;
use crate::error::Result;

pub const WRAPPER_CLASS: &str = "fluid-width-video-wrapper";
pub const IGNORE_CLASS: &str = "fitvidsignore";
const STYLE_ID: &str = "fit-vids-style";
const WRAPPER_CSS: &str = ".fluid-width-video-wrapper{width:100%;position:relative;padding:0;}\
.fluid-width-video-wrapper iframe,.fluid-width-video-wrapper object,.fluid-width-video-wrapper embed \
{position:absolute;top:0;left:0;width:100%;height:100%;}";

/// Iframe sources we know how to scale.
const PROVIDERS: &[&str] = &[
    r"player\.vimeo\.com",
    r"youtube\.com",
    r"youtube-nocookie\.com",
    r"kickstarter\.com.*video\.html|video\.html.*kickstarter\.com",
];

/// Used only to derive a ratio when an element declares no usable size.
const FALLBACK_WIDTH: i64 = 16;
const FALLBACK_HEIGHT: i64 = 9;

// ── Model ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Iframe,
    Object,
    Embed,
    /// Anything brought in by the configured custom selector.
    Custom,
}

impl MediaKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "iframe" => MediaKind::Iframe,
            "object" => MediaKind::Object,
            "embed" => MediaKind::Embed,
            _ => MediaKind::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    Wrapper,
    Object,
    Other,
}

/// Everything the embedder needs to know about one element, read from the
/// DOM up front so the decision itself is pure.
#[derive(Debug, Clone)]
pub struct MediaCandidate {
    pub kind: MediaKind,
    pub src: Option<String>,
    /// Matched through the custom selector rather than the built-in list.
    pub custom_match: bool,
    pub attr_width: Option<String>,
    pub attr_height: Option<String>,
    pub styled_width: bool,
    pub styled_height: bool,
    pub rendered_width: f64,
    pub rendered_height: f64,
    pub ignored: bool,
    pub parent: ParentKind,
    pub inside_object: bool,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedPlan {
    /// Height divided by width.
    pub ratio: f64,
    /// `padding-top` for the wrapper, e.g. `"75%"`.
    pub padding_top: String,
    /// Name to assign when the element has none.
    pub assign_name: Option<String>,
}

// ── Embedder ──────────────────────────────────────────

pub struct FluidEmbedder {
    providers: RegexSet,
    custom_selector: RefCell<Option<String>>,
    custom_checked: Cell<bool>,
    ignore_selector: String,
    named: Cell<u32>,
}

impl FluidEmbedder {
    pub fn new(config: &MediaConfig) -> Result<Self> {
        let patterns = PROVIDERS
            .iter()
            .map(|p| p.to_string())
            .chain(config.extra_providers.iter().cloned());
        let providers = RegexSet::new(patterns)?;
        let mut ignore_selector = format!(".{}", IGNORE_CLASS);
        if let Some(extra) = config.ignore.as_deref().filter(|s| !s.trim().is_empty()) {
            ignore_selector.push_str(", ");
            ignore_selector.push_str(extra);
        }
        Ok(FluidEmbedder {
            providers,
            custom_selector: RefCell::new(
                config
                    .custom_selector
                    .clone()
                    .filter(|s| !s.trim().is_empty()),
            ),
            custom_checked: Cell::new(false),
            ignore_selector,
            named: Cell::new(0),
        })
    }

    pub fn is_provider(&self, src: &str) -> bool {
        self.providers.is_match(src)
    }

    /// Decide how to wrap one element, or `None` if it must be left alone.
    pub fn plan(&self, c: &MediaCandidate) -> Option<EmbedPlan> {
        if c.ignored || c.parent == ParentKind::Wrapper {
            return None;
        }
        if c.kind == MediaKind::Object && c.inside_object {
            return None;
        }
        if c.kind == MediaKind::Embed && c.parent == ParentKind::Object {
            return None;
        }
        if c.kind == MediaKind::Iframe && !c.custom_match {
            let src = c.src.as_deref().unwrap_or("");
            if !self.is_provider(src) {
                return None;
            }
        }

        let (width, height) = declared_size(c);
        let ratio = height / width;
        if !ratio.is_finite() || ratio <= 0.0 {
            log::debug!(
                "[media] skipping element without a usable ratio ({}x{})",
                width,
                height
            );
            return None;
        }

        let assign_name = match c.name.as_deref() {
            Some(n) if !n.is_empty() => None,
            _ => {
                let n = self.named.get();
                self.named.set(n + 1);
                Some(format!("fitvid{}", n))
            }
        };

        Some(EmbedPlan {
            ratio,
            padding_top: format!("{}%", ratio * 100.0),
            assign_name,
        })
    }

    /// Drop the configured custom selector if the browser rejects it, so a
    /// typo does not stop the built-in providers from being wrapped. Returns
    /// false when it was dropped.
    pub fn check_custom_selector(&self, is_valid: impl Fn(&str) -> bool) -> bool {
        let mut custom = self.custom_selector.borrow_mut();
        if custom.as_deref().map_or(true, |sel| is_valid(sel)) {
            return true;
        }
        if let Some(rejected) = custom.take() {
            log::warn!("[media] ignoring invalid custom selector {:?}", rejected);
        }
        false
    }

    /// Selector for every element the embedder considers in a container.
    pub fn selector(&self) -> String {
        let mut sel = String::from("iframe, object, embed");
        if let Some(custom) = self.custom_selector.borrow().as_deref() {
            sel.push_str(", ");
            sel.push_str(custom);
        }
        sel
    }

    /// Wrap every eligible media element inside `container`. Returns the
    /// number of elements wrapped; running it again on the same container
    /// wraps nothing new.
    pub fn fit(&self, container: &Element) -> usize {
        let Some(document) = container.owner_document() else {
            return 0;
        };
        ensure_stylesheet(&document);
        if !self.custom_checked.replace(true) {
            self.check_custom_selector(|sel| document.query_selector(sel).is_ok());
        }

        let mut wrapped = 0;
        for el in dom::query_all_in(container, &self.selector()) {
            let candidate = self.inspect(&el);
            let Some(plan) = self.plan(&candidate) else {
                continue;
            };
            match apply(&document, &el, &plan) {
                Ok(()) => wrapped += 1,
                Err(e) => log::warn!("[media] could not wrap element: {}", e),
            }
        }
        wrapped
    }

    fn inspect(&self, el: &Element) -> MediaCandidate {
        let kind = MediaKind::from_tag(&el.tag_name());
        let custom_match = match self.custom_selector.borrow().as_deref() {
            Some(sel) => el.matches(sel).unwrap_or(false),
            None => false,
        };
        let parent = el.parent_element();
        let parent_kind = match &parent {
            Some(p) if dom::has_class(p, WRAPPER_CLASS) => ParentKind::Wrapper,
            Some(p) if p.tag_name().eq_ignore_ascii_case("object") => ParentKind::Object,
            _ => ParentKind::Other,
        };
        let inside_object = parent
            .and_then(|p| p.closest("object").ok().flatten())
            .is_some();
        let rect = el.get_bounding_client_rect();
        MediaCandidate {
            kind,
            src: el.get_attribute("src"),
            custom_match,
            attr_width: el.get_attribute("width"),
            attr_height: el.get_attribute("height"),
            styled_width: dom::inline_style(el, "width").is_some(),
            styled_height: dom::inline_style(el, "height").is_some(),
            rendered_width: rect.width(),
            rendered_height: rect.height(),
            ignored: el.closest(&self.ignore_selector).ok().flatten().is_some(),
            parent: parent_kind,
            inside_object,
            name: el.get_attribute("name"),
        }
    }
}

thread_local! {
    static SHARED: RefCell<Option<Rc<FluidEmbedder>>> = const { RefCell::new(None) };
}

/// The page-wide embedder, built on first use. Sharing it keeps generated
/// element names unique across boot and later `fitMedia` calls.
pub fn shared(config: &MediaConfig) -> Result<Rc<FluidEmbedder>> {
    if let Some(existing) = SHARED.with(|s| s.borrow().clone()) {
        return Ok(existing);
    }
    let embedder = Rc::new(FluidEmbedder::new(config)?);
    SHARED.with(|s| *s.borrow_mut() = Some(Rc::clone(&embedder)));
    Ok(embedder)
}

/// Width and height used for the ratio. Declared attributes win over the
/// rendered box; with nothing declared at all a 16:9 placeholder is used.
fn declared_size(c: &MediaCandidate) -> (f64, f64) {
    let no_declared_size = !c.styled_width
        && !c.styled_height
        && (!dom::is_numeric(c.attr_height.as_deref()) || !dom::is_numeric(c.attr_width.as_deref()));
    let (attr_w, attr_h) = if no_declared_size {
        (Some(FALLBACK_WIDTH), Some(FALLBACK_HEIGHT))
    } else {
        (
            c.attr_width.as_deref().and_then(dom::parse_int_prefix),
            c.attr_height.as_deref().and_then(dom::parse_int_prefix),
        )
    };

    let height = match attr_h {
        Some(h) => h as f64,
        None if c.kind == MediaKind::Object => f64::NAN,
        None => c.rendered_height,
    };
    let width = match attr_w {
        Some(w) => w as f64,
        None => c.rendered_width,
    };
    (width, height)
}

// ── DOM application ───────────────────────────────────

fn ensure_stylesheet(document: &Document) {
    if document.get_element_by_id(STYLE_ID).is_some() {
        return;
    }
    let Some(head) = document.head() else {
        return;
    };
    let Ok(style) = document.create_element("style") else {
        return;
    };
    style.set_id(STYLE_ID);
    style.set_text_content(Some(WRAPPER_CSS));
    let _ = head.append_child(&style);
}

fn apply(document: &Document, el: &Element, plan: &EmbedPlan) -> Result<()> {
    if let Some(name) = &plan.assign_name {
        el.set_attribute("name", name)?;
    }
    let parent = el
        .parent_node()
        .ok_or_else(|| crate::error::ThemeError::new("media element is detached"))?;
    let wrapper = document.create_element("div")?;
    wrapper.set_class_name(WRAPPER_CLASS);
    dom::set_style(&wrapper, "padding-top", &plan.padding_top);
    parent.insert_before(&wrapper, Some(el.unchecked_ref()))?;
    wrapper.append_child(el)?;

    el.remove_attribute("height")?;
    el.remove_attribute("width")?;
    dom::remove_style(el, "height");
    dom::remove_style(el, "width");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> FluidEmbedder {
        FluidEmbedder::new(&MediaConfig::default()).unwrap()
    }

    fn youtube(width: Option<&str>, height: Option<&str>) -> MediaCandidate {
        MediaCandidate {
            kind: MediaKind::Iframe,
            src: Some("https://www.youtube.com/embed/abc".into()),
            custom_match: false,
            attr_width: width.map(String::from),
            attr_height: height.map(String::from),
            styled_width: false,
            styled_height: false,
            rendered_width: 300.0,
            rendered_height: 150.0,
            ignored: false,
            parent: ParentKind::Other,
            inside_object: false,
            name: None,
        }
    }

    #[test]
    fn test_declared_attributes_give_ratio() {
        let plan = embedder().plan(&youtube(Some("640"), Some("480"))).unwrap();
        assert_eq!(plan.padding_top, "75%");
        assert_eq!(plan.ratio, 0.75);
    }

    #[test]
    fn test_missing_size_uses_sixteen_by_nine() {
        let plan = embedder().plan(&youtube(None, None)).unwrap();
        assert_eq!(plan.padding_top, "56.25%");
    }

    #[test]
    fn test_one_missing_attribute_uses_placeholder() {
        let plan = embedder().plan(&youtube(Some("640"), None)).unwrap();
        assert_eq!(plan.padding_top, "56.25%");
    }

    #[test]
    fn test_styled_element_falls_back_to_rendered_size() {
        let mut c = youtube(None, None);
        c.styled_width = true;
        let plan = embedder().plan(&c).unwrap();
        assert_eq!(plan.padding_top, "50%");
    }

    #[test]
    fn test_px_suffixed_attributes() {
        let mut c = youtube(Some("640px"), Some("360px"));
        c.styled_height = true;
        let plan = embedder().plan(&c).unwrap();
        assert_eq!(plan.padding_top, "56.25%");
    }

    #[test]
    fn test_already_wrapped_is_skipped() {
        let mut c = youtube(Some("640"), Some("480"));
        c.parent = ParentKind::Wrapper;
        assert!(embedder().plan(&c).is_none());
    }

    #[test]
    fn test_ignored_is_skipped() {
        let mut c = youtube(Some("640"), Some("480"));
        c.ignored = true;
        assert!(embedder().plan(&c).is_none());
    }

    #[test]
    fn test_unknown_iframe_provider_is_skipped() {
        let mut c = youtube(Some("640"), Some("480"));
        c.src = Some("https://maps.example.com/embed".into());
        assert!(embedder().plan(&c).is_none());
    }

    #[test]
    fn test_kickstarter_needs_video_page() {
        let e = embedder();
        assert!(e.is_provider("https://www.kickstarter.com/projects/x/video.html"));
        assert!(!e.is_provider("https://www.kickstarter.com/projects/x/widget/card.html"));
        assert!(e.is_provider("https://player.vimeo.com/video/1"));
        assert!(e.is_provider("https://www.youtube-nocookie.com/embed/1"));
    }

    #[test]
    fn test_extra_provider_pattern() {
        let config = MediaConfig {
            extra_providers: vec![r"dailymotion\.com/embed".into()],
            ..MediaConfig::default()
        };
        let e = FluidEmbedder::new(&config).unwrap();
        assert!(e.is_provider("https://www.dailymotion.com/embed/video/x1"));
    }

    #[test]
    fn test_bad_extra_provider_is_error() {
        let config = MediaConfig {
            extra_providers: vec!["(".into()],
            ..MediaConfig::default()
        };
        assert!(FluidEmbedder::new(&config).is_err());
    }

    #[test]
    fn test_embed_inside_object_is_skipped() {
        let mut c = youtube(Some("640"), Some("480"));
        c.kind = MediaKind::Embed;
        c.src = Some("movie.swf".into());
        c.parent = ParentKind::Object;
        assert!(embedder().plan(&c).is_none());
        c.parent = ParentKind::Other;
        assert!(embedder().plan(&c).is_some());
    }

    #[test]
    fn test_nested_object_is_skipped() {
        let mut c = youtube(Some("640"), Some("480"));
        c.kind = MediaKind::Object;
        c.inside_object = true;
        assert!(embedder().plan(&c).is_none());
    }

    #[test]
    fn test_object_without_height_attribute_is_left_alone() {
        let mut c = youtube(Some("640"), None);
        c.kind = MediaKind::Object;
        c.styled_height = true;
        assert!(embedder().plan(&c).is_none());
    }

    #[test]
    fn test_names_are_sequential_across_calls() {
        let e = embedder();
        let first = e.plan(&youtube(None, None)).unwrap();
        let mut named = youtube(None, None);
        named.name = Some("intro".into());
        let kept = e.plan(&named).unwrap();
        let second = e.plan(&youtube(None, None)).unwrap();
        assert_eq!(first.assign_name.as_deref(), Some("fitvid0"));
        assert_eq!(kept.assign_name, None);
        assert_eq!(second.assign_name.as_deref(), Some("fitvid1"));
    }

    #[test]
    fn test_selector_includes_custom() {
        let config = MediaConfig {
            custom_selector: Some("video.fluid".into()),
            ..MediaConfig::default()
        };
        let e = FluidEmbedder::new(&config).unwrap();
        assert_eq!(e.selector(), "iframe, object, embed, video.fluid");
        assert_eq!(embedder().selector(), "iframe, object, embed");
    }

    #[test]
    fn test_invalid_custom_selector_is_dropped() {
        let config = MediaConfig {
            custom_selector: Some("iframe[".into()),
            ..MediaConfig::default()
        };
        let e = FluidEmbedder::new(&config).unwrap();
        assert!(!e.check_custom_selector(|sel| !sel.ends_with('[')));
        assert_eq!(e.selector(), "iframe, object, embed");
    }

    #[test]
    fn test_valid_custom_selector_is_kept() {
        let config = MediaConfig {
            custom_selector: Some("video.fluid".into()),
            ..MediaConfig::default()
        };
        let e = FluidEmbedder::new(&config).unwrap();
        assert!(e.check_custom_selector(|_| true));
        assert_eq!(e.selector(), "iframe, object, embed, video.fluid");
    }

    #[test]
    fn test_custom_match_bypasses_provider_list() {
        let mut c = youtube(Some("400"), Some("300"));
        c.src = Some("https://videos.example.org/e/1".into());
        c.custom_match = true;
        assert_eq!(embedder().plan(&c).unwrap().padding_top, "75%");
    }
}
