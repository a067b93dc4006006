use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type FrameCallback = Box<dyn FnMut(f64)>;

/// Source of animation frames. Hosts with a display adapt their frame
/// callback to this; tests and headless tools drive a [`ManualScheduler`].
pub trait FrameScheduler {
    /// Registers `callback` to run once per frame with the frame timestamp
    /// (milliseconds) until the returned token is cancelled.
    fn on_each_frame(&self, callback: FrameCallback) -> CancelToken;
}

/// Cancelling is idempotent. Dropping a token leaves the registration
/// active.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct Registration {
    token: CancelToken,
    callback: Rc<RefCell<FrameCallback>>,
}

#[derive(Default)]
struct ManualState {
    registrations: Vec<Registration>,
    frames: u64,
}

/// Cooperative single-threaded scheduler advanced explicitly with
/// [`ManualScheduler::run_frame`].
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every live registration once, in registration order. Callbacks
    /// registered while the frame runs first fire on the next frame.
    /// Returns how many callbacks ran.
    pub fn run_frame(&self, timestamp: f64) -> usize {
        let due: Vec<(CancelToken, Rc<RefCell<FrameCallback>>)> = {
            let mut state = self.state.borrow_mut();
            state.registrations.retain(|r| !r.token.is_cancelled());
            state.frames += 1;
            state
                .registrations
                .iter()
                .map(|r| (r.token.clone(), r.callback.clone()))
                .collect()
        };
        let mut ran = 0;
        for (token, callback) in due {
            if token.is_cancelled() {
                continue;
            }
            (callback.borrow_mut())(timestamp);
            ran += 1;
        }
        ran
    }

    pub fn active(&self) -> usize {
        self.state
            .borrow()
            .registrations
            .iter()
            .filter(|r| !r.token.is_cancelled())
            .count()
    }

    pub fn frames(&self) -> u64 {
        self.state.borrow().frames
    }
}

impl FrameScheduler for ManualScheduler {
    fn on_each_frame(&self, callback: FrameCallback) -> CancelToken {
        let token = CancelToken::default();
        self.state.borrow_mut().registrations.push(Registration {
            token: token.clone(),
            callback: Rc::new(RefCell::new(callback)),
        });
        token
    }
}
