use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{Element, MediaQueryListEvent, Storage};

use super::Wiring;
use crate::config::ThemeConfig;
use crate::dom::{self, Page};
use crate::error::{Result, ThemeError};

const TOGGLE_ID: &str = "theme-toggle";
const DARK_CLASS: &str = "dark-mode";
const AUTO_CLASS: &str = "auto-color";
const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn from_dark(dark: bool) -> Self {
        if dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Stored preference wins; without one the OS signal decides; light otherwise.
pub fn resolve(stored: Option<Theme>, os_prefers_dark: bool) -> Theme {
    stored.unwrap_or(Theme::from_dark(os_prefers_dark))
}

// ── Preference store ──────────────────────────────────

/// Durable home of the explicit theme choice. Anything other than the
/// literal `dark` / `light` reads as unset.
pub trait PreferenceStore {
    fn load(&self) -> Option<Theme>;
    fn save(&self, theme: Theme) -> Result<()>;
}

/// `localStorage` under a fixed key. Pages where storage is blocked behave
/// as if nothing was ever stored.
pub struct LocalPreference {
    storage: Option<Storage>,
    key: String,
}

impl LocalPreference {
    pub fn open(page: &Page, key: &str) -> Self {
        LocalPreference {
            storage: page.window.local_storage().ok().flatten(),
            key: key.to_string(),
        }
    }
}

impl PreferenceStore for LocalPreference {
    fn load(&self) -> Option<Theme> {
        let storage = self.storage.as_ref()?;
        let raw = storage.get_item(&self.key).ok().flatten()?;
        Theme::parse(&raw)
    }

    fn save(&self, theme: Theme) -> Result<()> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| ThemeError::new("localStorage unavailable"))?;
        storage.set_item(&self.key, theme.as_str())?;
        Ok(())
    }
}

// ── Switch ────────────────────────────────────────────

/// Tracks the applied theme and decides what each event changes.
pub struct ThemeSwitch<S: PreferenceStore> {
    store: S,
    applied: Cell<Theme>,
}

impl<S: PreferenceStore> ThemeSwitch<S> {
    pub fn new(store: S, os_prefers_dark: bool) -> Self {
        let applied = resolve(store.load(), os_prefers_dark);
        ThemeSwitch {
            store,
            applied: Cell::new(applied),
        }
    }

    pub fn applied(&self) -> Theme {
        self.applied.get()
    }

    pub fn has_explicit(&self) -> bool {
        self.store.load().is_some()
    }

    /// Flip the theme and remember the choice. The flip stands even if the
    /// write fails; it just won't survive a reload.
    pub fn toggle(&self) -> Theme {
        let next = self.applied.get().toggled();
        self.applied.set(next);
        if let Err(e) = self.store.save(next) {
            log::warn!("[theme] could not persist preference: {}", e);
        }
        next
    }

    /// OS scheme changed. Only followed while the user has made no choice.
    pub fn os_changed(&self, prefers_dark: bool) -> Option<Theme> {
        if self.has_explicit() {
            return None;
        }
        let theme = Theme::from_dark(prefers_dark);
        self.applied.set(theme);
        Some(theme)
    }
}

/// What caused the theme to be (re)applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeChange {
    Init,
    Toggle,
    System,
}

/// Classes to set on the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootClasses {
    pub dark_mode: bool,
    /// Drop `auto-color` so the stylesheet stops following the OS.
    pub clear_auto_color: bool,
}

/// Light is the markup default, so a light init leaves the root alone.
/// Dark at init and any explicit toggle clear `auto-color`; OS changes
/// only flip `dark-mode`.
pub fn root_classes(theme: Theme, change: ThemeChange) -> Option<RootClasses> {
    let dark_mode = theme == Theme::Dark;
    match change {
        ThemeChange::Init if !dark_mode => None,
        ThemeChange::Init | ThemeChange::Toggle => Some(RootClasses {
            dark_mode,
            clear_auto_color: true,
        }),
        ThemeChange::System => Some(RootClasses {
            dark_mode,
            clear_auto_color: false,
        }),
    }
}

fn apply(root: &Element, theme: Theme, change: ThemeChange) {
    let Some(classes) = root_classes(theme, change) else {
        return;
    };
    dom::set_class(root, DARK_CLASS, classes.dark_mode);
    if classes.clear_auto_color {
        dom::set_class(root, AUTO_CLASS, false);
    }
}

pub fn install(page: &Page, config: &ThemeConfig) -> Result<Wiring> {
    let Some(toggle) = page.by_id(TOGGLE_ID) else {
        return Ok(Wiring::Skipped("no #theme-toggle"));
    };
    let Some(root) = page.root() else {
        return Ok(Wiring::Skipped("no document element"));
    };

    let query = page.window.match_media(DARK_QUERY).ok().flatten();
    let os_dark = query.as_ref().map(|q| q.matches()).unwrap_or(false);
    let store = LocalPreference::open(page, &config.theme.storage_key);
    let switch = Rc::new(ThemeSwitch::new(store, os_dark));

    apply(&root, switch.applied(), ThemeChange::Init);

    {
        let switch = Rc::clone(&switch);
        let root = root.clone();
        dom::listen(&toggle, "click", move |_| {
            let theme = switch.toggle();
            apply(&root, theme, ThemeChange::Toggle);
        });
    }

    if let Some(query) = query {
        dom::listen(&query, "change", move |event| {
            let Some(change) = event.dyn_ref::<MediaQueryListEvent>() else {
                return;
            };
            if let Some(theme) = switch.os_changed(change.matches()) {
                apply(&root, theme, ThemeChange::System);
            }
        });
    }

    Ok(Wiring::Attached)
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub value: std::cell::RefCell<Option<String>>,
    pub read_only: bool,
}

#[cfg(test)]
impl PreferenceStore for &MemoryStore {
    fn load(&self) -> Option<Theme> {
        self.value.borrow().as_deref().and_then(Theme::parse)
    }

    fn save(&self, theme: Theme) -> Result<()> {
        if self.read_only {
            return Err(ThemeError::new("quota exceeded"));
        }
        *self.value.borrow_mut() = Some(theme.as_str().to_string());
        Ok(())
    }
}
