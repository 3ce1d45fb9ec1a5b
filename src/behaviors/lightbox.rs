//! Click-to-zoom for content images, backed by PhotoSwipe when the page
//! happens to load it. Without the library this behavior does nothing.

use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, HtmlImageElement, Window};

use super::Wiring;
use crate::config::{LightboxConfig, ThemeConfig};
use crate::dom::{self, Page};
use crate::error::{Result, ThemeError};

const VIEWER_GLOBAL: &str = "PhotoSwipe";
const VIEWER_UI_GLOBAL: &str = "PhotoSwipeUI_Default";
const IMAGES: &str = ".post-content img, .gh-content img";
const MOUNT: &str = ".pswp";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerItem {
    pub src: String,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerOptions {
    pub index: u32,
    #[serde(rename = "bgOpacity")]
    pub background_opacity: f64,
    #[serde(rename = "showHideOpacity")]
    pub fade_transition: bool,
    #[serde(rename = "history")]
    pub browser_history_integration: bool,
}

impl ViewerOptions {
    pub fn single(config: &LightboxConfig) -> Self {
        ViewerOptions {
            index: 0,
            background_opacity: config.background_opacity,
            fade_transition: true,
            browser_history_integration: false,
        }
    }
}

/// One dimension of an image: natural size if the image has decoded,
/// else the integer prefix of its attribute, else the default.
pub fn dimension(natural: u32, attr: Option<&str>, default: u32) -> u32 {
    if natural > 0 {
        return natural;
    }
    attr.and_then(dom::parse_int_prefix)
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(default)
}

/// Both viewer globals must be present for the behavior to activate.
pub fn viewer_available(window: &Window) -> bool {
    [VIEWER_GLOBAL, VIEWER_UI_GLOBAL].iter().all(|name| {
        Reflect::get(window, &JsValue::from_str(name))
            .map(|v| v.is_function())
            .unwrap_or(false)
    })
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue> {
    let json = serde_json::to_string(value)?;
    Ok(js_sys::JSON::parse(&json)?)
}

fn global_fn(window: &Window, name: &str) -> Result<Function> {
    Reflect::get(window, &JsValue::from_str(name))?
        .dyn_into::<Function>()
        .map_err(|_| ThemeError(format!("{} is not a constructor", name)))
}

fn open_viewer(page: &Page, item: &ViewerItem, config: &LightboxConfig) -> Result<()> {
    let Some(mount) = page.query(MOUNT) else {
        log::debug!("[lightbox] no {} mount point", MOUNT);
        return Ok(());
    };
    let viewer = global_fn(&page.window, VIEWER_GLOBAL)?;
    let ui = global_fn(&page.window, VIEWER_UI_GLOBAL)?;
    let items = Array::of1(&to_js(item)?);
    let options = to_js(&ViewerOptions::single(config))?;

    let args = Array::of4(&mount, &ui, &items, &options);
    let gallery = Reflect::construct(&viewer, &args)?;
    let init = Reflect::get(&gallery, &JsValue::from_str("init"))?
        .dyn_into::<Function>()
        .map_err(|_| ThemeError::new("gallery has no init()"))?;
    init.call0(&gallery)?;
    Ok(())
}

pub fn install(page: &Page, config: &ThemeConfig) -> Result<Wiring> {
    if !viewer_available(&page.window) {
        return Ok(Wiring::Skipped("image viewer not loaded"));
    }
    let images = page.query_all(IMAGES);
    if images.is_empty() {
        return Ok(Wiring::Skipped("no content images"));
    }

    let mut wired = 0;
    for el in images {
        if el.closest("a").ok().flatten().is_some() {
            continue;
        }
        let Ok(img) = el.dyn_into::<HtmlImageElement>() else {
            continue;
        };
        dom::set_style(&img, "cursor", "zoom-in");

        let page = page.clone();
        let config = config.lightbox.clone();
        let target = img.clone();
        dom::listen_active(&img, "click", move |event: &Event| {
            event.prevent_default();
            let item = ViewerItem {
                src: target.src(),
                width: dimension(
                    target.natural_width(),
                    target.get_attribute("width").as_deref(),
                    config.default_width,
                ),
                height: dimension(
                    target.natural_height(),
                    target.get_attribute("height").as_deref(),
                    config.default_height,
                ),
            };
            if let Err(e) = open_viewer(&page, &item, &config) {
                log::warn!("[lightbox] could not open viewer: {}", e);
            }
        });
        wired += 1;
    }

    if wired == 0 {
        return Ok(Wiring::Skipped("every image is already linked"));
    }
    Ok(Wiring::Attached)
}
