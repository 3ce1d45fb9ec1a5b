use std::cell::Cell;
use std::rc::Rc;

use web_sys::Element;

use super::Wiring;
use crate::config::ThemeConfig;
use crate::dom::{self, Page};
use crate::error::Result;
use crate::schedule::{BrowserFrames, FrameThrottle};

const NAV_ID: &str = "toc-nav";
const WRAPPER_ID: &str = "post-toc";
const CONTENT: &str = ".post-content";
const HEADINGS: &str = "h2, h3";
const ACTIVE_CLASS: &str = "active";

/// A heading as found in the content.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub id: String,
    pub level: u8,
    pub text: String,
    /// The id was generated and must be written back to the heading.
    pub generated: bool,
}

impl TocEntry {
    pub fn href(&self) -> String {
        format!("#{}", self.id)
    }
}

/// One entry per heading, in document order. Headings without an id get
/// `<prefix><position>`, so the result only depends on the document.
pub fn build_entries(headings: &[Heading], id_prefix: &str) -> Vec<TocEntry> {
    headings
        .iter()
        .enumerate()
        .map(|(i, h)| match h.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => TocEntry {
                id: id.to_string(),
                level: h.level,
                text: h.text.clone(),
                generated: false,
            },
            None => TocEntry {
                id: format!("{}{}", id_prefix, i),
                level: h.level,
                text: h.text.clone(),
                generated: true,
            },
        })
        .collect()
}

/// What the ToC region shows for a given set of headings.
#[derive(Debug, Clone, PartialEq)]
pub enum TocPlan {
    /// No headings: the whole ToC wrapper is hidden and nothing rendered.
    Hide,
    Render(Vec<TocEntry>),
}

pub fn plan(headings: &[Heading], id_prefix: &str) -> TocPlan {
    if headings.is_empty() {
        return TocPlan::Hide;
    }
    TocPlan::Render(build_entries(headings, id_prefix))
}

/// Index of the last heading whose top is at or above `offset` from the
/// viewport top, i.e. the one most recently scrolled past.
pub fn active_index(tops: &[f64], offset: f64) -> Option<usize> {
    tops.iter().rposition(|top| *top <= offset)
}

fn heading_level(tag: &str) -> u8 {
    tag.get(1..)
        .and_then(|n| n.parse().ok())
        .unwrap_or(2)
}

struct TocView {
    headings: Vec<Element>,
    links: Vec<Element>,
    active: Cell<Option<usize>>,
}

impl TocView {
    fn highlight(&self, offset: f64) {
        let tops: Vec<f64> = self
            .headings
            .iter()
            .map(|h| h.get_bounding_client_rect().top())
            .collect();
        let next = active_index(&tops, offset);
        let prev = self.active.replace(next);
        if prev == next {
            return;
        }
        if let Some(link) = prev.and_then(|i| self.links.get(i)) {
            dom::set_class(link, ACTIVE_CLASS, false);
        }
        if let Some(link) = next.and_then(|i| self.links.get(i)) {
            dom::set_class(link, ACTIVE_CLASS, true);
        }
    }
}

pub fn install(page: &Page, config: &ThemeConfig) -> Result<Wiring> {
    let (Some(nav), Some(content)) = (page.by_id(NAV_ID), page.query(CONTENT)) else {
        return Ok(Wiring::Skipped("no #toc-nav or content"));
    };

    let elements = dom::query_all_in(&content, HEADINGS);
    let headings: Vec<Heading> = elements
        .iter()
        .map(|el| Heading {
            level: heading_level(&el.tag_name()),
            id: Some(el.id()),
            text: el.text_content().unwrap_or_default(),
        })
        .collect();
    let entries = match plan(&headings, &config.toc.id_prefix) {
        TocPlan::Render(entries) => entries,
        TocPlan::Hide => {
            if let Some(wrapper) = page.by_id(WRAPPER_ID) {
                dom::set_style(&wrapper, "display", "none");
            }
            return Ok(Wiring::Skipped("no headings"));
        }
    };

    nav.set_inner_html("");
    let mut links = Vec::with_capacity(entries.len());
    for (el, entry) in elements.iter().zip(&entries) {
        if entry.generated {
            el.set_id(&entry.id);
        }
        let link = page.document.create_element("a")?;
        link.set_attribute("href", &entry.href())?;
        link.set_attribute("data-level", &entry.level.to_string())?;
        link.set_text_content(Some(&entry.text));
        nav.append_child(&link)?;
        links.push(link);
    }

    let view = Rc::new(TocView {
        headings: elements,
        links,
        active: Cell::new(None),
    });
    let offset = config.toc.active_offset;
    let update: Rc<dyn Fn()> = Rc::new(move || view.highlight(offset));
    let throttle = FrameThrottle::new(BrowserFrames, update);
    throttle.run_now();
    dom::listen(&page.window, "scroll", move |_| {
        throttle.poke();
    });

    Ok(Wiring::Attached)
}
