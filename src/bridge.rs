// Session-scoped live bridge between the spatial engine and the overlay.
//
// Drag input only records the proposed rect. Resolution happens once per
// frame against a single snapshot; subscribers and pull queries all read
// the same `Rc<Frame>`. Structural index updates are staged and swapped in
// at the next frame boundary.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::backend::{SnapBackend, select_backend};
use crate::config::EngineConfig;
use crate::displacement::{DisplacementMap, displaced_rect, resolve_displacement};
use crate::geometry::Rect;
use crate::index::SpatialIndex;
use crate::scheduler::{CancelToken, FrameScheduler};
use crate::snap::{SnapGuide, SnapOptions, SnapResult, resolve_snap_with};
use crate::snapshot::GeometrySnapshot;

type Listener = Rc<RefCell<dyn FnMut(&Frame)>>;

/// Resolved state of an in-flight drag for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DragFrame {
    pub element: String,
    pub container: Option<String>,
    pub proposed: Rect,
    pub resolved: Rect,
    pub snap: SnapResult,
    pub displacement: DisplacementMap,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub timestamp: f64,
    pub index: Rc<SpatialIndex>,
    pub drag: Option<DragFrame>,
}

impl Frame {
    pub fn guides(&self) -> &[SnapGuide] {
        self.drag
            .as_ref()
            .map(|drag| drag.snap.guides.as_slice())
            .unwrap_or(&[])
    }

    /// On-screen rect of `element` in this frame: the resolved drag rect,
    /// a displaced rect, or the committed one.
    pub fn bounds(&self, element: &str) -> Option<Rect> {
        if let Some(drag) = &self.drag {
            if drag.element == element {
                return Some(drag.resolved);
            }
            let committed = self.index.bounds(element)?;
            return Some(displaced_rect(&drag.displacement, element, &committed));
        }
        self.index.bounds(element)
    }
}

/// What the committing layer should persist when a drag ends.
#[derive(Debug, Clone, PartialEq)]
pub struct DragCommit {
    pub element: String,
    pub rect: Rect,
    pub displacement: DisplacementMap,
}

impl DragCommit {
    /// Index with the commit baked in, ready for [`LiveBridge::stage_index`].
    pub fn apply(&self, index: &SpatialIndex) -> SpatialIndex {
        let mut next = index.with_rect(&self.element, self.rect);
        for (id, offset) in &self.displacement {
            if let Some(rect) = index.bounds(id) {
                next = next.with_rect(id, rect.moved_to(offset.x, offset.y));
            }
        }
        next
    }
}

#[derive(Debug, Clone)]
struct DragState {
    element: String,
    snapshot: GeometrySnapshot,
    proposed: Rect,
}

/// Keeps the backend prepared for the snapshot in use and falls back to the
/// software resolver when it cannot answer.
struct Resolver {
    backend: Box<dyn SnapBackend>,
    prepared_for: Option<(String, u64)>,
    warned: bool,
}

impl Resolver {
    fn query(
        &mut self,
        key: (&str, u64),
        snapshot: &GeometrySnapshot,
        options: &SnapOptions,
        moving: &Rect,
    ) -> Option<SnapResult> {
        let fresh = self
            .prepared_for
            .as_ref()
            .is_some_and(|(element, generation)| element == key.0 && *generation == key.1);
        if !fresh {
            self.backend.prepare(&snapshot.sibling_rects(), options);
            self.prepared_for = Some((key.0.to_string(), key.1));
        }
        self.backend.resolve(moving)
    }

    fn resolve(
        &mut self,
        key: (&str, u64),
        snapshot: &GeometrySnapshot,
        options: &SnapOptions,
        moving: &Rect,
    ) -> SnapResult {
        if let Some(result) = self.query(key, snapshot, options, moving) {
            return result;
        }
        if !self.warned {
            log::warn!(
                "{} snap backend unavailable, falling back to software resolver",
                self.backend.name()
            );
            self.warned = true;
        }
        resolve_snap_with(moving, &snapshot.sibling_rects(), options)
    }
}

struct BridgeInner {
    config: EngineConfig,
    index: Rc<SpatialIndex>,
    generation: u64,
    staged: Option<SpatialIndex>,
    resolver: Resolver,
    drag: Option<DragState>,
    frame: Rc<Frame>,
    listeners: Vec<(u64, Listener)>,
    next_listener: u64,
    ticker: Option<CancelToken>,
    /// Frames published while listeners are being notified. A listener that
    /// ends the drag from its own callback queues the cleared frame here.
    outbox: VecDeque<Rc<Frame>>,
    delivering: bool,
}

impl BridgeInner {
    fn publish(&mut self, timestamp: f64) -> Rc<Frame> {
        let drag = self.resolve_drag();
        let frame = Rc::new(Frame {
            sequence: self.frame.sequence + 1,
            timestamp,
            index: self.index.clone(),
            drag,
        });
        self.frame = frame.clone();
        frame
    }

    fn resolve_drag(&mut self) -> Option<DragFrame> {
        let drag = self.drag.as_ref()?;
        let options = self.config.snap.options(drag.snapshot.frame());
        let snap = self.resolver.resolve(
            (&drag.element, self.generation),
            &drag.snapshot,
            &options,
            &drag.proposed,
        );
        let resolved = snap.rect(&drag.proposed);
        let displacement = if self.config.bridge.displacement {
            resolve_displacement(&drag.element, &resolved, drag.snapshot.siblings())
        } else {
            DisplacementMap::new()
        };
        Some(DragFrame {
            element: drag.element.clone(),
            container: drag.snapshot.container().map(str::to_string),
            proposed: drag.proposed,
            resolved,
            snap,
            displacement,
        })
    }

    fn apply_staged(&mut self) {
        let Some(index) = self.staged.take() else {
            return;
        };
        self.index = Rc::new(index);
        self.generation += 1;
        log::debug!("spatial index swapped in (generation {})", self.generation);
        let lost = self
            .drag
            .as_ref()
            .is_some_and(|drag| self.index.bounds(&drag.element).is_none());
        if lost {
            if let Some(drag) = self.drag.take() {
                log::warn!("dragged element `{}` left the index, cancelling drag", drag.element);
            }
        } else if let Some(drag) = &mut self.drag {
            drag.snapshot = GeometrySnapshot::capture(&self.index, &drag.element);
        }
    }

    fn listeners(&self) -> Vec<Listener> {
        self.listeners.iter().map(|(_, l)| l.clone()).collect()
    }
}

/// Hands `frame` to every listener, in publication order. Calls made from
/// inside a listener only enqueue; the outermost call drains the queue, so
/// no listener is ever re-entered.
fn deliver(inner: &Rc<RefCell<BridgeInner>>, frame: Rc<Frame>) {
    {
        let mut state = inner.borrow_mut();
        state.outbox.push_back(frame);
        if state.delivering {
            return;
        }
        state.delivering = true;
    }
    loop {
        let (frame, listeners) = {
            let mut state = inner.borrow_mut();
            let Some(frame) = state.outbox.pop_front() else {
                state.delivering = false;
                return;
            };
            (frame, state.listeners())
        };
        for listener in listeners {
            (listener.borrow_mut())(&frame);
        }
    }
}

/// Handle returned by [`LiveBridge::subscribe`]. Unsubscribing more than
/// once is a no-op.
pub struct Subscription {
    id: u64,
    bridge: Weak<RefCell<BridgeInner>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(&self) {
        let Some(inner) = self.bridge.upgrade() else {
            return;
        };
        let mut inner = inner.borrow_mut();
        inner.listeners.retain(|(id, _)| *id != self.id);
        if inner.listeners.is_empty() {
            if let Some(ticker) = inner.ticker.take() {
                ticker.cancel();
            }
        }
    }
}

/// One editing session's bridge. Cloning yields another handle to the same
/// session.
#[derive(Clone)]
pub struct LiveBridge {
    inner: Rc<RefCell<BridgeInner>>,
    scheduler: Rc<dyn FrameScheduler>,
}

impl LiveBridge {
    pub fn new(index: SpatialIndex, config: EngineConfig, scheduler: Rc<dyn FrameScheduler>) -> Self {
        let backend = select_backend(config.bridge.backend);
        Self::with_backend(index, config, scheduler, backend)
    }

    pub fn with_backend(
        index: SpatialIndex,
        config: EngineConfig,
        scheduler: Rc<dyn FrameScheduler>,
        mut backend: Box<dyn SnapBackend>,
    ) -> Self {
        backend.prepare(&[], &config.snap.options(None));
        let index = Rc::new(index);
        let frame = Rc::new(Frame {
            sequence: 0,
            timestamp: 0.0,
            index: index.clone(),
            drag: None,
        });
        let inner = BridgeInner {
            config,
            index,
            generation: 0,
            staged: None,
            resolver: Resolver {
                backend,
                prepared_for: None,
                warned: false,
            },
            drag: None,
            frame,
            listeners: Vec::new(),
            next_listener: 0,
            ticker: None,
            outbox: VecDeque::new(),
            delivering: false,
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
            scheduler,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.inner.borrow().config.clone()
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.borrow().resolver.backend.name()
    }

    /// Latest published frame.
    pub fn frame(&self) -> Rc<Frame> {
        self.inner.borrow().frame.clone()
    }

    pub fn is_dragging(&self) -> bool {
        self.inner.borrow().drag.is_some()
    }

    /// Queues a structural update; it replaces the index at the start of the
    /// next frame.
    pub fn stage_index(&self, index: SpatialIndex) {
        self.inner.borrow_mut().staged = Some(index);
    }

    /// Starts dragging `element`. Elements without resolved geometry cannot
    /// be dragged; returns whether a drag started.
    pub fn begin_drag(&self, element: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(origin) = inner.index.bounds(element) else {
            return false;
        };
        let snapshot = GeometrySnapshot::capture(&inner.index, element);
        inner.resolver.warned = false;
        inner.drag = Some(DragState {
            element: element.to_string(),
            snapshot,
            proposed: origin,
        });
        true
    }

    /// Records the candidate rect for the dragged element. Resolution runs
    /// on the next frame.
    pub fn update_drag(&self, x: f64, y: f64, width: f64, height: f64) -> bool {
        let mut inner = self.inner.borrow_mut();
        match &mut inner.drag {
            Some(drag) => {
                drag.proposed = Rect::new(x, y, width, height);
                true
            }
            None => false,
        }
    }

    /// Ends the drag, returning the position and displacement to commit.
    /// Guides and displacement are cleared and an empty frame is published
    /// before returning.
    pub fn end_drag(&self) -> Option<DragCommit> {
        let commit = {
            let mut inner = self.inner.borrow_mut();
            let resolved = inner.resolve_drag()?;
            Some(DragCommit {
                element: resolved.element,
                rect: resolved.resolved,
                displacement: resolved.displacement,
            })
        };
        self.clear_drag();
        commit
    }

    /// Aborts the drag. Nothing is committed; the next published frame (sent
    /// synchronously) carries no guides or displacement. Called from inside
    /// a listener, the cleared frame reaches listeners as soon as the frame
    /// being delivered has been handed to all of them.
    pub fn cancel_drag(&self) {
        self.clear_drag();
    }

    fn clear_drag(&self) {
        let frame = {
            let mut inner = self.inner.borrow_mut();
            if inner.drag.take().is_none() {
                return;
            }
            let timestamp = inner.frame.timestamp;
            inner.publish(timestamp)
        };
        deliver(&self.inner, frame);
    }

    /// Advances one frame: applies a staged index, resolves the drag and
    /// notifies subscribers. Normally driven by the scheduler.
    pub fn run_frame(&self, timestamp: f64) -> Rc<Frame> {
        run_frame(&self.inner, timestamp)
    }

    /// Registers a per-frame listener. The bridge ticks on the scheduler
    /// while at least one listener is registered.
    pub fn subscribe(&self, listener: impl FnMut(&Frame) + 'static) -> Subscription {
        let (id, needs_ticker) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_listener;
            inner.next_listener += 1;
            let listener: Listener = Rc::new(RefCell::new(listener));
            inner.listeners.push((id, listener));
            (id, inner.ticker.is_none())
        };
        if needs_ticker {
            let weak = Rc::downgrade(&self.inner);
            let token = self.scheduler.on_each_frame(Box::new(move |timestamp| {
                if let Some(inner) = weak.upgrade() {
                    run_frame(&inner, timestamp);
                }
            }));
            self.inner.borrow_mut().ticker = Some(token);
        }
        Subscription {
            id,
            bridge: Rc::downgrade(&self.inner),
        }
    }

    /// Inspector tracking: `listener` receives the element's on-screen rect
    /// on the first frame and whenever it changes.
    pub fn track_bounds(
        &self,
        element: &str,
        mut listener: impl FnMut(Option<Rect>) + 'static,
    ) -> Subscription {
        let element = element.to_string();
        let mut last: Option<Option<Rect>> = None;
        self.subscribe(move |frame| {
            let bounds = frame.bounds(&element);
            if last != Some(bounds) {
                last = Some(bounds);
                listener(bounds);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Effective rect of `element` in the latest frame. `None` for unknown
    /// or unconstrained elements, or when the snap backend is unavailable.
    pub fn get_bounds(&self, element: &str) -> Option<Rect> {
        let inner = self.inner.borrow();
        if !inner.resolver.backend.is_available() {
            return None;
        }
        inner.frame.bounds(element)
    }

    /// Snap resolution for `element` placed at the given rect, against the
    /// latest frame's geometry. `None` when the element is unknown or the
    /// backend cannot answer.
    pub fn get_snap_targets(&self, element: &str, x: f64, y: f64, width: f64, height: f64) -> Option<SnapResult> {
        let mut inner = self.inner.borrow_mut();
        let index = inner.frame.index.clone();
        index.container_of(element)?;
        let snapshot = GeometrySnapshot::capture(&index, element);
        let options = inner.config.snap.options(snapshot.frame());
        let generation = inner.generation;
        inner.resolver.query(
            (element, generation),
            &snapshot,
            &options,
            &Rect::new(x, y, width, height),
        )
    }
}

fn run_frame(inner: &Rc<RefCell<BridgeInner>>, timestamp: f64) -> Rc<Frame> {
    let frame = {
        let mut state = inner.borrow_mut();
        state.apply_staged();
        state.publish(timestamp)
    };
    deliver(inner, frame.clone());
    frame
}
