//! Deferred execution: animation-frame coalescing and cancellable timers.
//!
//! Both are expressed as traits so the behaviors can be driven by a manual
//! clock in tests. Handles cancel their callback when dropped, so replacing
//! a stored handle is enough to guarantee a single live timer.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::render::{request_animation_frame, AnimationFrame};
use gloo::timers::callback::{Interval, Timeout};

// ── Frames ────────────────────────────────────────────

pub trait FrameSource {
    type Handle;
    fn request(&self, job: Box<dyn FnOnce()>) -> Self::Handle;
}

/// Browser animation frames via `requestAnimationFrame`.
#[derive(Clone, Copy, Default)]
pub struct BrowserFrames;

impl FrameSource for BrowserFrames {
    type Handle = AnimationFrame;

    fn request(&self, job: Box<dyn FnOnce()>) -> AnimationFrame {
        request_animation_frame(move |_| job())
    }
}

/// Runs a job at most once per frame no matter how often it is poked.
/// The pending handle doubles as the "already scheduled" flag.
pub struct FrameThrottle<S: FrameSource> {
    source: S,
    job: Rc<dyn Fn()>,
    pending: Rc<RefCell<Option<S::Handle>>>,
}

impl<S: FrameSource> FrameThrottle<S>
where
    S::Handle: 'static,
{
    pub fn new(source: S, job: Rc<dyn Fn()>) -> Self {
        FrameThrottle {
            source,
            job,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    /// Schedule the job for the next frame. Returns false if a frame was
    /// already pending and this poke was coalesced into it.
    pub fn poke(&self) -> bool {
        if self.pending.borrow().is_some() {
            return false;
        }
        let pending = Rc::clone(&self.pending);
        let job = Rc::clone(&self.job);
        let handle = self.source.request(Box::new(move || {
            pending.borrow_mut().take();
            job();
        }));
        *self.pending.borrow_mut() = Some(handle);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Run the job immediately, outside the frame cycle.
    pub fn run_now(&self) {
        (self.job)();
    }
}

// ── Timers ────────────────────────────────────────────

pub trait Timers {
    type Handle;
    fn timeout(&self, delay_ms: u32, job: Box<dyn FnOnce()>) -> Self::Handle;
    fn interval(&self, period_ms: u32, job: Box<dyn FnMut()>) -> Self::Handle;
}

/// Browser timers via `setTimeout` / `setInterval`.
#[derive(Clone, Copy, Default)]
pub struct BrowserTimers;

pub enum BrowserTimer {
    Timeout(Timeout),
    Interval(Interval),
}

impl Timers for BrowserTimers {
    type Handle = BrowserTimer;

    fn timeout(&self, delay_ms: u32, job: Box<dyn FnOnce()>) -> BrowserTimer {
        BrowserTimer::Timeout(Timeout::new(delay_ms, job))
    }

    fn interval(&self, period_ms: u32, job: Box<dyn FnMut()>) -> BrowserTimer {
        BrowserTimer::Interval(Interval::new(period_ms, job))
    }
}

// ── Manual clock (tests) ──────────────────────────────

#[cfg(test)]
pub(crate) mod manual {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::{FrameSource, Timers};

    enum Task {
        Once(Box<dyn FnOnce()>),
        Repeat(Box<dyn FnMut()>),
    }

    struct Pending {
        due: u64,
        seq: u64,
        period: Option<u64>,
        task: Task,
        live: Rc<Cell<bool>>,
    }

    #[derive(Default)]
    struct Clock {
        now: u64,
        seq: u64,
        entries: Vec<Pending>,
    }

    /// Virtual clock. Time only moves through `advance`.
    #[derive(Clone, Default)]
    pub struct ManualTimers {
        clock: Rc<RefCell<Clock>>,
    }

    pub struct ManualHandle {
        live: Rc<Cell<bool>>,
    }

    impl Drop for ManualHandle {
        fn drop(&mut self) {
            self.live.set(false);
        }
    }

    impl ManualTimers {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn now(&self) -> u64 {
            self.clock.borrow().now
        }

        /// Timers that are scheduled and not cancelled.
        pub fn live(&self) -> usize {
            self.clock
                .borrow()
                .entries
                .iter()
                .filter(|p| p.live.get())
                .count()
        }

        fn schedule(&self, delay: u64, period: Option<u64>, task: Task) -> ManualHandle {
            let live = Rc::new(Cell::new(true));
            let mut clock = self.clock.borrow_mut();
            clock.seq += 1;
            let pending = Pending {
                due: clock.now + delay,
                seq: clock.seq,
                period,
                task,
                live: Rc::clone(&live),
            };
            clock.entries.push(pending);
            ManualHandle { live }
        }

        /// Move the clock forward, firing every due timer in order.
        pub fn advance(&self, ms: u64) {
            let target = self.clock.borrow().now + ms;
            loop {
                let next = {
                    let mut clock = self.clock.borrow_mut();
                    clock.entries.retain(|p| p.live.get());
                    let idx = clock
                        .entries
                        .iter()
                        .enumerate()
                        .filter(|(_, p)| p.due <= target)
                        .min_by_key(|(_, p)| (p.due, p.seq))
                        .map(|(i, _)| i);
                    idx.map(|i| {
                        let p = clock.entries.remove(i);
                        clock.now = p.due;
                        p
                    })
                };
                let Some(pending) = next else { break };
                let Pending {
                    due,
                    period,
                    task,
                    live,
                    ..
                } = pending;
                match task {
                    Task::Once(job) => {
                        live.set(false);
                        job();
                    }
                    Task::Repeat(mut job) => {
                        job();
                        if live.get() {
                            let step = period.unwrap_or(1).max(1);
                            let mut clock = self.clock.borrow_mut();
                            clock.seq += 1;
                            let seq = clock.seq;
                            clock.entries.push(Pending {
                                due: due + step,
                                seq,
                                period,
                                task: Task::Repeat(job),
                                live,
                            });
                        }
                    }
                }
            }
            self.clock.borrow_mut().now = target;
        }
    }

    impl Timers for ManualTimers {
        type Handle = ManualHandle;

        fn timeout(&self, delay_ms: u32, job: Box<dyn FnOnce()>) -> ManualHandle {
            self.schedule(delay_ms as u64, None, Task::Once(job))
        }

        fn interval(&self, period_ms: u32, job: Box<dyn FnMut()>) -> ManualHandle {
            let period = period_ms as u64;
            self.schedule(period, Some(period), Task::Repeat(job))
        }
    }

    /// Frame queue flushed explicitly by the test.
    #[derive(Clone, Default)]
    pub struct ManualFrames {
        queue: Rc<RefCell<Vec<(Rc<Cell<bool>>, Box<dyn FnOnce()>)>>>,
    }

    impl ManualFrames {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn queued(&self) -> usize {
            self.queue.borrow().iter().filter(|(live, _)| live.get()).count()
        }

        /// Run every frame callback queued so far.
        pub fn flush(&self) -> usize {
            let batch: Vec<_> = self.queue.borrow_mut().drain(..).collect();
            let mut ran = 0;
            for (live, job) in batch {
                if live.get() {
                    live.set(false);
                    job();
                    ran += 1;
                }
            }
            ran
        }
    }

    impl FrameSource for ManualFrames {
        type Handle = ManualHandle;

        fn request(&self, job: Box<dyn FnOnce()>) -> ManualHandle {
            let live = Rc::new(Cell::new(true));
            self.queue.borrow_mut().push((Rc::clone(&live), job));
            ManualHandle { live }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::manual::{ManualFrames, ManualTimers};
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, Rc<dyn Fn()>) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, Rc::new(move || h.set(h.get() + 1)))
    }

    #[test]
    fn test_burst_of_pokes_runs_once_per_frame() {
        let frames = ManualFrames::new();
        let (hits, job) = counter();
        let throttle = FrameThrottle::new(frames.clone(), job);

        assert!(throttle.poke());
        for _ in 0..20 {
            assert!(!throttle.poke());
        }
        assert_eq!(frames.queued(), 1);
        assert_eq!(frames.flush(), 1);
        assert_eq!(hits.get(), 1);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_flag_clears_after_frame() {
        let frames = ManualFrames::new();
        let (hits, job) = counter();
        let throttle = FrameThrottle::new(frames.clone(), job);

        throttle.poke();
        frames.flush();
        assert!(throttle.poke());
        frames.flush();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_run_now_bypasses_frame() {
        let frames = ManualFrames::new();
        let (hits, job) = counter();
        let throttle = FrameThrottle::new(frames.clone(), job);
        throttle.run_now();
        assert_eq!(hits.get(), 1);
        assert_eq!(frames.queued(), 0);
    }

    #[test]
    fn test_timeout_fires_once_at_deadline() {
        let timers = ManualTimers::new();
        let (hits, job) = counter();
        let _h = timers.timeout(2000, Box::new(move || job()));
        timers.advance(1999);
        assert_eq!(hits.get(), 0);
        timers.advance(1);
        assert_eq!(hits.get(), 1);
        timers.advance(10_000);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_interval_repeats_until_dropped() {
        let timers = ManualTimers::new();
        let (hits, job) = counter();
        let handle = timers.interval(5000, Box::new(move || job()));
        timers.advance(15_000);
        assert_eq!(hits.get(), 3);
        drop(handle);
        timers.advance(15_000);
        assert_eq!(hits.get(), 3);
        assert_eq!(timers.live(), 0);
    }
}
