use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{Element, TouchEvent};

use super::Wiring;
use crate::config::ThemeConfig;
use crate::dom::{self, Page};
use crate::error::Result;
use crate::schedule::{BrowserTimers, Timers};

const SLIDER_ID: &str = "hero-slider";
const SLIDES: &str = ".hero-slide";
const DOTS: &str = ".hero-slider-dot";
const PREV: &str = ".hero-slider-prev";
const NEXT: &str = ".hero-slider-next";
const ACTIVE_CLASS: &str = "active";

// ── State machine ─────────────────────────────────────

/// Current slide over a fixed sequence of at least two slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slider {
    len: usize,
    index: usize,
}

impl Slider {
    /// `None` for fewer than two slides; there is nothing to rotate.
    pub fn new(len: usize) -> Option<Self> {
        if len < 2 {
            return None;
        }
        Some(Slider { len, index: 0 })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn next(&mut self) -> usize {
        self.index = (self.index + 1) % self.len;
        self.index
    }

    pub fn prev(&mut self) -> usize {
        self.index = (self.index + self.len - 1) % self.len;
        self.index
    }

    /// Jump to `index`. Targets past the last slide wrap to the first.
    pub fn goto(&mut self, index: usize) -> usize {
        self.index = if index < self.len { index } else { 0 };
        self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Next,
    Prev,
}

/// A leftward drag longer than `threshold` advances, a rightward one goes back.
pub fn classify_swipe(start_x: f64, end_x: f64, threshold: f64) -> Option<Swipe> {
    let delta = start_x - end_x;
    if delta > threshold {
        Some(Swipe::Next)
    } else if delta < -threshold {
        Some(Swipe::Prev)
    } else {
        None
    }
}

// ── Autoplay ──────────────────────────────────────────

/// Recurring advance timer. At most one interval is ever live: starting
/// always cancels the previous one first.
pub struct Autoplay<T: Timers> {
    timers: T,
    period_ms: u32,
    tick: Rc<dyn Fn()>,
    handle: Option<T::Handle>,
}

impl<T: Timers> Autoplay<T> {
    pub fn new(timers: T, period_ms: u32, tick: Rc<dyn Fn()>) -> Self {
        Autoplay {
            timers,
            period_ms,
            tick,
            handle: None,
        }
    }

    pub fn start(&mut self) {
        self.stop();
        let tick = Rc::clone(&self.tick);
        self.handle = Some(self.timers.interval(self.period_ms, Box::new(move || tick())));
    }

    pub fn stop(&mut self) {
        self.handle = None;
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

// ── Controller ────────────────────────────────────────

/// Slider state, its autoplay, and the render callback, tied together so
/// every manual interaction is one atomic render plus an autoplay restart.
pub struct SliderController<T: Timers> {
    state: Rc<RefCell<Slider>>,
    autoplay: RefCell<Autoplay<T>>,
    render: Rc<dyn Fn(usize)>,
    touch_start: Cell<Option<f64>>,
    swipe_threshold: f64,
}

impl<T: Timers> SliderController<T> {
    pub fn new(
        len: usize,
        timers: T,
        period_ms: u32,
        swipe_threshold: f64,
        render: Rc<dyn Fn(usize)>,
    ) -> Option<Self> {
        let state = Rc::new(RefCell::new(Slider::new(len)?));
        let tick: Rc<dyn Fn()> = {
            let state = Rc::clone(&state);
            let render = Rc::clone(&render);
            Rc::new(move || {
                let index = state.borrow_mut().next();
                render(index);
            })
        };
        render(0);
        Some(SliderController {
            state,
            autoplay: RefCell::new(Autoplay::new(timers, period_ms, tick)),
            render,
            touch_start: Cell::new(None),
            swipe_threshold,
        })
    }

    pub fn index(&self) -> usize {
        self.state.borrow().index()
    }

    pub fn next(&self) {
        let index = self.state.borrow_mut().next();
        self.show(index);
    }

    pub fn prev(&self) {
        let index = self.state.borrow_mut().prev();
        self.show(index);
    }

    pub fn goto(&self, index: usize) {
        let index = self.state.borrow_mut().goto(index);
        self.show(index);
    }

    pub fn touch_start(&self, x: f64) {
        self.touch_start.set(Some(x));
    }

    pub fn touch_end(&self, x: f64) {
        let Some(start) = self.touch_start.take() else {
            return;
        };
        match classify_swipe(start, x, self.swipe_threshold) {
            Some(Swipe::Next) => self.next(),
            Some(Swipe::Prev) => self.prev(),
            None => {}
        }
    }

    pub fn pause(&self) {
        self.autoplay.borrow_mut().stop();
    }

    pub fn resume(&self) {
        self.autoplay.borrow_mut().start();
    }

    pub fn is_playing(&self) -> bool {
        self.autoplay.borrow().is_running()
    }

    fn show(&self, index: usize) {
        (self.render)(index);
        self.resume();
    }
}

// ── DOM wiring ────────────────────────────────────────

/// Marks exactly one slide and one dot active.
fn render_into(slides: Vec<Element>, dots: Vec<Element>) -> Rc<dyn Fn(usize)> {
    Rc::new(move |index| {
        for (i, slide) in slides.iter().enumerate() {
            dom::set_class(slide, ACTIVE_CLASS, i == index);
        }
        for (i, dot) in dots.iter().enumerate() {
            dom::set_class(dot, ACTIVE_CLASS, i == index);
        }
    })
}

fn touch_x(event: &web_sys::Event) -> Option<f64> {
    let touch = event.dyn_ref::<TouchEvent>()?.changed_touches().get(0)?;
    Some(touch.screen_x() as f64)
}

pub fn install(page: &Page, config: &ThemeConfig) -> Result<Wiring> {
    let Some(root) = page.by_id(SLIDER_ID) else {
        return Ok(Wiring::Skipped("no #hero-slider"));
    };
    let slides = dom::query_all_in(&root, SLIDES);
    if slides.len() < 2 {
        return Ok(Wiring::Skipped("fewer than two slides"));
    }
    let len = slides.len();
    let dots = page.query_all(DOTS);

    let Some(controller) = SliderController::new(
        len,
        BrowserTimers,
        config.slider.autoplay_ms,
        config.slider.swipe_threshold,
        render_into(slides, dots.clone()),
    ) else {
        return Ok(Wiring::Skipped("fewer than two slides"));
    };
    let controller = Rc::new(controller);

    if let Some(prev) = page.query(PREV) {
        let c = Rc::clone(&controller);
        dom::listen(&prev, "click", move |_| c.prev());
    }
    if let Some(next) = page.query(NEXT) {
        let c = Rc::clone(&controller);
        dom::listen(&next, "click", move |_| c.next());
    }
    for (i, dot) in dots.iter().enumerate() {
        let c = Rc::clone(&controller);
        dom::listen(dot, "click", move |_| c.goto(i));
    }

    {
        let c = Rc::clone(&controller);
        dom::listen(&root, "mouseenter", move |_| c.pause());
    }
    {
        let c = Rc::clone(&controller);
        dom::listen(&root, "mouseleave", move |_| c.resume());
    }
    {
        let c = Rc::clone(&controller);
        dom::listen(&root, "touchstart", move |event| {
            if let Some(x) = touch_x(event) {
                c.touch_start(x);
            }
        });
    }
    {
        let c = Rc::clone(&controller);
        dom::listen(&root, "touchend", move |event| {
            if let Some(x) = touch_x(event) {
                c.touch_end(x);
            }
        });
    }

    controller.resume();
    Ok(Wiring::Attached)
}
