// Snap computation backends. The software resolver is always present and is
// the reference; the accelerated one answers from sorted per-axis candidate
// tables and must produce the same guides bit for bit.

use crate::config::BackendKind;
use crate::geometry::{Axis, Rect, edges_of};
use crate::snap::{
    AxisMatch, Candidate, SnapOptions, SnapResult, assemble, axis_candidates, resolve_snap_with,
};

/// Extra room around the threshold window so float rounding in the window
/// bounds never drops a candidate the exact distance test would accept.
const WINDOW_SLACK: f64 = 1.0;
pub const DEFAULT_ACCELERATED_CAPACITY: usize = 65_536;

pub trait SnapBackend {
    fn name(&self) -> &'static str;

    /// Loads the sibling set for the following `resolve` calls.
    fn prepare(&mut self, siblings: &[Rect], options: &SnapOptions);

    fn is_available(&self) -> bool;

    /// `None` when the backend cannot answer; callers fall back to the
    /// software resolver.
    fn resolve(&self, moving: &Rect) -> Option<SnapResult>;
}

pub fn select_backend(kind: BackendKind) -> Box<dyn SnapBackend> {
    match kind {
        BackendKind::Software => Box::new(SoftwareBackend::default()),
        BackendKind::Accelerated => Box::new(AcceleratedBackend::default()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SoftwareBackend {
    siblings: Vec<Rect>,
    options: SnapOptions,
}

impl SnapBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn prepare(&mut self, siblings: &[Rect], options: &SnapOptions) {
        self.siblings = siblings.to_vec();
        self.options = *options;
    }

    fn is_available(&self) -> bool {
        true
    }

    fn resolve(&self, moving: &Rect) -> Option<SnapResult> {
        Some(resolve_snap_with(moving, &self.siblings, &self.options))
    }
}

#[derive(Debug, Clone)]
struct AxisTable {
    candidates: Vec<Candidate>,
    /// (value, candidate index) sorted by value, then index.
    sorted: Vec<(f64, usize)>,
}

impl AxisTable {
    fn build(siblings: &[Rect], container: Option<&Rect>, axis: Axis) -> Self {
        let candidates = axis_candidates(siblings, container, axis);
        let mut sorted: Vec<(f64, usize)> = candidates
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.value, idx))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        Self { candidates, sorted }
    }

    fn best(&self, moving: &Rect, axis: Axis, threshold: f64) -> Option<(AxisMatch, Candidate)> {
        let edges = edges_of(moving, axis);
        let mut best: Option<AxisMatch> = None;
        for (edge, value) in edges.iter().enumerate() {
            let lo = value - threshold - WINDOW_SLACK;
            let hi = value + threshold + WINDOW_SLACK;
            let start = self.sorted.partition_point(|(v, _)| *v < lo);
            for &(target, candidate) in &self.sorted[start..] {
                if target > hi {
                    break;
                }
                let distance = (value - target).abs();
                if distance >= threshold {
                    continue;
                }
                let found = AxisMatch {
                    candidate,
                    edge,
                    distance,
                };
                if best.is_none_or(|current| found.beats(&current)) {
                    best = Some(found);
                }
            }
        }
        best.map(|m| (m, self.candidates[m.candidate]))
    }
}

#[derive(Debug, Clone)]
struct Prepared {
    siblings: Vec<Rect>,
    options: SnapOptions,
    x: AxisTable,
    y: AxisTable,
}

/// Candidate tables sorted per axis; each query only scans the threshold
/// window around the moving edges. Declines sibling sets larger than its
/// capacity.
#[derive(Debug, Clone)]
pub struct AcceleratedBackend {
    capacity: usize,
    prepared: Option<Prepared>,
}

impl Default for AcceleratedBackend {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ACCELERATED_CAPACITY)
    }
}

impl AcceleratedBackend {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            prepared: None,
        }
    }
}

impl SnapBackend for AcceleratedBackend {
    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn prepare(&mut self, siblings: &[Rect], options: &SnapOptions) {
        if siblings.len() > self.capacity {
            log::debug!(
                "accelerated snap backend declined {} siblings (capacity {})",
                siblings.len(),
                self.capacity
            );
            self.prepared = None;
            return;
        }
        let container = options.container.as_ref();
        self.prepared = Some(Prepared {
            siblings: siblings.to_vec(),
            options: *options,
            x: AxisTable::build(siblings, container, Axis::X),
            y: AxisTable::build(siblings, container, Axis::Y),
        });
    }

    fn is_available(&self) -> bool {
        self.prepared.is_some()
    }

    fn resolve(&self, moving: &Rect) -> Option<SnapResult> {
        let prepared = self.prepared.as_ref()?;
        let options = &prepared.options;
        if prepared.siblings.is_empty() || !options.is_enabled() {
            return Some(SnapResult::unsnapped(moving));
        }
        let x = prepared.x.best(moving, Axis::X, options.threshold);
        let y = prepared.y.best(moving, Axis::Y, options.threshold);
        Some(assemble(moving, &prepared.siblings, options, x, y))
    }
}
