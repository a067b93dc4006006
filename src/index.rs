// Per-container rectangle store. Built from the committed element tree and
// never mutated in place: patches produce a fresh index which the live
// bridge swaps in between frames.

use std::collections::{HashMap, HashSet};

use crate::config::IndexConfig;
use crate::geometry::{Axis, Rect, edges_of, intersects};
use crate::scene::Scene;

const MIN_CELL_SIZE: f64 = 16.0;
/// Rects spanning more cells than this skip the grid and are checked on
/// every query.
const MAX_CELLS_PER_RECT: i64 = 4096;

#[derive(Debug, Clone, PartialEq)]
pub struct Sibling {
    pub id: String,
    pub rect: Rect,
}

/// Closest sibling edge to a probe rect on one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeHit {
    pub id: String,
    pub position: f64,
    pub distance: f64,
}

#[derive(Debug, Clone)]
struct ChildEntry {
    id: String,
    /// `None` when the persisted style does not resolve to pixels.
    rect: Option<Rect>,
}

#[derive(Debug, Clone)]
struct ContainerEntry {
    frame: Option<Rect>,
    children: Vec<ChildEntry>,
    grid: OverlapGrid,
}

impl ContainerEntry {
    fn new(frame: Option<Rect>, children: Vec<ChildEntry>, cell: f64) -> Self {
        let mut grid = OverlapGrid::new(cell);
        for (idx, child) in children.iter().enumerate() {
            if let Some(rect) = &child.rect {
                grid.insert(idx, rect);
            }
        }
        Self {
            frame,
            children,
            grid,
        }
    }

    fn resolved(&self) -> impl Iterator<Item = (usize, &str, Rect)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(idx, child)| child.rect.map(|rect| (idx, child.id.as_str(), rect)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    cell: f64,
    containers: HashMap<String, ContainerEntry>,
    /// Element id to the first container (in document order) listing it.
    parents: HashMap<String, String>,
}

impl SpatialIndex {
    pub fn build(scene: &Scene, config: &IndexConfig) -> Self {
        let cell = config.cell_size.max(MIN_CELL_SIZE);
        let mut containers = HashMap::new();
        let mut parents = HashMap::new();
        for container in &scene.containers {
            let size = container.size();
            let children = container
                .children
                .iter()
                .map(|child| {
                    let rect = child.style.resolve(size);
                    if rect.is_none() {
                        log::debug!(
                            "element `{}` in `{}` has no pixel geometry, skipping as snap target",
                            child.id,
                            container.id
                        );
                    }
                    ChildEntry {
                        id: child.id.clone(),
                        rect,
                    }
                })
                .collect::<Vec<_>>();
            for child in &children {
                parents
                    .entry(child.id.clone())
                    .or_insert_with(|| container.id.clone());
            }
            containers.insert(
                container.id.clone(),
                ContainerEntry::new(container.frame(), children, cell),
            );
        }
        Self {
            cell,
            containers,
            parents,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn container_of(&self, element: &str) -> Option<&str> {
        self.parents.get(element).map(String::as_str)
    }

    pub fn container_bounds(&self, container: &str) -> Option<Rect> {
        self.containers.get(container).and_then(|entry| entry.frame)
    }

    pub fn bounds(&self, element: &str) -> Option<Rect> {
        let container = self.container_of(element)?;
        self.containers
            .get(container)?
            .children
            .iter()
            .find(|child| child.id == element)
            .and_then(|child| child.rect)
    }

    /// Resolved rects of every child of `container` except `excluding`, in
    /// document order. Unknown containers have no siblings.
    pub fn get_sibling_rects(&self, container: &str, excluding: &str) -> Vec<Rect> {
        self.siblings(container, excluding)
            .into_iter()
            .map(|sibling| sibling.rect)
            .collect()
    }

    pub fn siblings(&self, container: &str, excluding: &str) -> Vec<Sibling> {
        let Some(entry) = self.containers.get(container) else {
            return Vec::new();
        };
        entry
            .resolved()
            .filter(|(_, id, _)| *id != excluding)
            .map(|(_, id, rect)| Sibling {
                id: id.to_string(),
                rect,
            })
            .collect()
    }

    /// Ids of children whose rect intersects `rect`, in document order.
    pub fn query_overlaps(&self, container: &str, rect: &Rect) -> Vec<String> {
        let Some(entry) = self.containers.get(container) else {
            return Vec::new();
        };
        let mut hits: Vec<usize> = entry
            .grid
            .query(rect)
            .filter(|idx| {
                entry.children[*idx]
                    .rect
                    .is_some_and(|child| intersects(&child, rect))
            })
            .collect();
        hits.sort_unstable();
        hits.into_iter()
            .map(|idx| entry.children[idx].id.clone())
            .collect()
    }

    pub fn nearest_edge(
        &self,
        container: &str,
        rect: &Rect,
        axis: Axis,
        excluding: &str,
    ) -> Option<EdgeHit> {
        let entry = self.containers.get(container)?;
        let probes = edges_of(rect, axis);
        let mut best: Option<EdgeHit> = None;
        for (_, id, sibling) in entry.resolved() {
            if id == excluding {
                continue;
            }
            for target in edges_of(&sibling, axis) {
                for probe in probes {
                    let distance = (probe - target).abs();
                    if best.as_ref().is_none_or(|hit| distance < hit.distance) {
                        best = Some(EdgeHit {
                            id: id.to_string(),
                            position: target,
                            distance,
                        });
                    }
                }
            }
        }
        best
    }

    /// Returns a copy of the index with `element` moved to `rect`.
    pub fn with_rect(&self, element: &str, rect: Rect) -> Self {
        let mut next = self.clone();
        let cell = next.cell;
        let Some(container) = next.parents.get(element).cloned() else {
            return next;
        };
        if let Some(entry) = next.containers.get_mut(&container) {
            let mut children = std::mem::take(&mut entry.children);
            for child in children.iter_mut().filter(|child| child.id == element) {
                child.rect = Some(rect.normalized());
            }
            *entry = ContainerEntry::new(entry.frame, children, cell);
        }
        next
    }

    /// Returns a copy of the index with `element` removed from its
    /// container.
    pub fn without_element(&self, element: &str) -> Self {
        let mut next = self.clone();
        let cell = next.cell;
        let Some(container) = next.parents.remove(element) else {
            return next;
        };
        if let Some(entry) = next.containers.get_mut(&container) {
            let children = std::mem::take(&mut entry.children)
                .into_iter()
                .filter(|child| child.id != element)
                .collect();
            *entry = ContainerEntry::new(entry.frame, children, cell);
        }
        next
    }
}

/// Uniform grid over child rects for fast overlap candidate lookup.
#[derive(Debug, Clone, Default)]
struct OverlapGrid {
    cell: f64,
    /// Maps grid cell (ix, iy) to child indices.
    cells: HashMap<(i32, i32), Vec<usize>>,
    oversized: Vec<usize>,
}

impl OverlapGrid {
    fn new(cell: f64) -> Self {
        Self {
            cell: cell.max(MIN_CELL_SIZE),
            cells: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    fn cell_range(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        let x0 = (rect.left / self.cell).floor() as i32;
        let y0 = (rect.top / self.cell).floor() as i32;
        let x1 = (rect.right() / self.cell).floor() as i32;
        let y1 = (rect.bottom() / self.cell).floor() as i32;
        (x0, y0, x1, y1)
    }

    fn insert(&mut self, idx: usize, rect: &Rect) {
        let (x0, y0, x1, y1) = self.cell_range(rect);
        let span = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);
        if span > MAX_CELLS_PER_RECT {
            self.oversized.push(idx);
            return;
        }
        for ix in x0..=x1 {
            for iy in y0..=y1 {
                self.cells.entry((ix, iy)).or_default().push(idx);
            }
        }
    }

    /// Indices of children that could overlap `rect`.
    fn query(&self, rect: &Rect) -> impl Iterator<Item = usize> + '_ {
        let (x0, y0, x1, y1) = self.cell_range(rect);
        let span = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);
        let mut seen = HashSet::new();
        let cells: Box<dyn Iterator<Item = usize> + '_> = if span > MAX_CELLS_PER_RECT {
            Box::new(self.cells.values().flat_map(|v| v.iter().copied()))
        } else {
            Box::new(
                (x0..=x1)
                    .flat_map(move |ix| (y0..=y1).map(move |iy| (ix, iy)))
                    .flat_map(move |key| {
                        self.cells
                            .get(&key)
                            .map(|v| v.as_slice())
                            .unwrap_or(&[])
                            .iter()
                            .copied()
                    }),
            )
        };
        cells
            .chain(self.oversized.iter().copied())
            .filter(move |idx| seen.insert(*idx))
    }
}
