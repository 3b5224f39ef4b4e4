//! Pane time axes and visible-range synchronization.
//!
//! Each pane owns exactly one [`TimeScale`]. A [`SyncLink`] mirrors the main
//! pane's visible range onto a follower pane; the follower never drives the
//! main pane. Links hold only weak references, so a destroyed pane is never
//! kept alive by a listener.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Visible time-axis window, both ends inclusive, in chart time keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub start: i64,
    pub end: i64,
}

impl VisibleRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: i64) -> bool {
        time >= self.start && time <= self.end
    }

    pub fn span(&self) -> i64 {
        self.end - self.start
    }
}

impl fmt::Display for VisibleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type RangeListener = Box<dyn FnMut(VisibleRange)>;

struct TimeScaleInner {
    range: Option<VisibleRange>,
    listeners: Vec<(ListenerId, RangeListener)>,
    next_id: u64,
    alive: bool,
    dispatching: bool,
    cancelled: Vec<ListenerId>,
}

/// The time axis of one pane.
pub struct TimeScale {
    inner: Rc<RefCell<TimeScaleInner>>,
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeScale {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TimeScaleInner {
                range: None,
                listeners: Vec::new(),
                next_id: 0,
                alive: true,
                dispatching: false,
                cancelled: Vec::new(),
            })),
        }
    }

    pub fn visible_range(&self) -> Option<VisibleRange> {
        self.inner.borrow().range
    }

    pub fn is_alive(&self) -> bool {
        self.inner.borrow().alive
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Set the visible range and notify every listener before returning.
    /// Ignored once the scale is closed.
    pub fn set_visible_range(&self, range: VisibleRange) {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.alive {
                return;
            }
            inner.range = Some(range);
        }
        self.notify(range);
    }

    pub fn subscribe(&self, listener: impl FnMut(VisibleRange) + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        if inner.listeners.len() != before {
            return true;
        }
        if inner.dispatching {
            inner.cancelled.push(id);
            return true;
        }
        false
    }

    /// Close the scale: drop all listeners and ignore further range changes.
    pub(crate) fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.alive = false;
        inner.listeners.clear();
    }

    fn downgrade(&self) -> Weak<RefCell<TimeScaleInner>> {
        Rc::downgrade(&self.inner)
    }

    fn notify(&self, range: VisibleRange) {
        let mut listeners = {
            let mut inner = self.inner.borrow_mut();
            inner.dispatching = true;
            std::mem::take(&mut inner.listeners)
        };

        for (_, listener) in listeners.iter_mut() {
            listener(range);
        }

        let mut inner = self.inner.borrow_mut();
        inner.dispatching = false;
        let cancelled = std::mem::take(&mut inner.cancelled);
        listeners.retain(|(id, _)| !cancelled.contains(id));
        if !inner.alive {
            listeners.clear();
        }
        // listeners registered while dispatching
        listeners.append(&mut inner.listeners);
        inner.listeners = listeners;
    }
}

fn set_range_weak(target: &Weak<RefCell<TimeScaleInner>>, range: VisibleRange) {
    if let Some(inner) = target.upgrade() {
        TimeScale { inner }.set_visible_range(range);
    }
}

/// Detach handle returned by [`attach`]. Dropping it detaches as well.
#[must_use = "dropping a SyncLink detaches it immediately"]
pub struct SyncLink {
    main: Weak<RefCell<TimeScaleInner>>,
    id: ListenerId,
    attached: bool,
}

impl SyncLink {
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        if let Some(inner) = self.main.upgrade() {
            TimeScale { inner }.unsubscribe(self.id);
        }
        tracing::debug!(listener = self.id.0, "viewport sync detached");
    }
}

impl Drop for SyncLink {
    fn drop(&mut self) {
        self.release();
    }
}

/// Mirror every visible-range change of `main` onto `follower`.
///
/// The follower is aligned to the main range immediately if one is set.
///
/// # Panics
///
/// Panics if either scale is closed or both are the same scale; panes must
/// be created before they are linked.
pub fn attach(main: &TimeScale, follower: &TimeScale) -> SyncLink {
    assert!(main.is_alive(), "viewport sync attached to a destroyed main pane");
    assert!(
        follower.is_alive(),
        "viewport sync attached to a destroyed follower pane"
    );
    assert!(
        !Rc::ptr_eq(&main.inner, &follower.inner),
        "a pane cannot follow itself"
    );

    let target = follower.downgrade();
    let id = main.subscribe(move |range| set_range_weak(&target, range));

    if let Some(range) = main.visible_range() {
        follower.set_visible_range(range);
    }
    tracing::debug!(listener = id.0, "viewport sync attached");

    SyncLink {
        main: main.downgrade(),
        id,
        attached: true,
    }
}
