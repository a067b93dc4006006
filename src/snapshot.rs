use crate::geometry::Rect;
use crate::index::{Sibling, SpatialIndex};

/// Immutable view of one container's geometry for a single query or frame.
/// Snap and collision resolution read the same snapshot so they agree on
/// where siblings are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometrySnapshot {
    container: Option<String>,
    frame: Option<Rect>,
    siblings: Vec<Sibling>,
    moving: Option<(String, Rect)>,
}

impl GeometrySnapshot {
    /// Captures the committed siblings of `element`. Root elements and
    /// unknown ids yield an empty snapshot.
    pub fn capture(index: &SpatialIndex, element: &str) -> Self {
        let Some(container) = index.container_of(element) else {
            return Self::default();
        };
        Self {
            container: Some(container.to_string()),
            frame: index.container_bounds(container),
            siblings: index.siblings(container, element),
            moving: index.bounds(element).map(|rect| (element.to_string(), rect)),
        }
    }

    /// Replaces the moving element's rect with an in-flight proposal.
    pub fn with_proposed(mut self, element: &str, rect: Rect) -> Self {
        self.moving = Some((element.to_string(), rect.normalized()));
        self
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    pub fn frame(&self) -> Option<Rect> {
        self.frame
    }

    pub fn siblings(&self) -> &[Sibling] {
        &self.siblings
    }

    pub fn sibling_rects(&self) -> Vec<Rect> {
        self.siblings.iter().map(|s| s.rect).collect()
    }

    pub fn rect_of(&self, id: &str) -> Option<Rect> {
        if let Some((moving, rect)) = &self.moving {
            if moving == id {
                return Some(*rect);
            }
        }
        self.siblings.iter().find(|s| s.id == id).map(|s| s.rect)
    }
}
