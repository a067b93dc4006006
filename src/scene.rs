use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Rect;
use crate::length::Length;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene parse error: {0}")]
    Parse(String),
    #[error("duplicate container id `{0}`")]
    DuplicateContainer(String),
    #[error("duplicate child id `{child}` in container `{container}`")]
    DuplicateChild { container: String, child: String },
}

/// The persisted position of one element, exactly as the document stores
/// it (`"120px"`, `"auto"`, `var(--x)`, plain numbers).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementStyle {
    pub left: Length,
    pub top: Length,
    pub width: Length,
    pub height: Length,
}

impl ElementStyle {
    pub fn pixels(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left: Length::Pixels(left),
            top: Length::Pixels(top),
            width: Length::Pixels(width),
            height: Length::Pixels(height),
        }
    }

    /// Resolves the style to a rect in container coordinates. Any value that
    /// does not resolve makes the whole element unconstrained.
    pub fn resolve(&self, container_size: Option<(f64, f64)>) -> Option<Rect> {
        let basis_x = container_size.map(|(w, _)| w);
        let basis_y = container_size.map(|(_, h)| h);
        let left = self.left.resolve(basis_x)?;
        let top = self.top.resolve(basis_y)?;
        let width = self.width.resolve(basis_x)?;
        let height = self.height.resolve(basis_y)?;
        Some(Rect::new(left, top, width, height))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub style: ElementStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Container {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width: None,
            height: None,
            children: Vec::new(),
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_child(mut self, id: impl Into<String>, style: ElementStyle) -> Self {
        self.children.push(Element {
            id: id.into(),
            style,
        });
        self
    }

    pub fn size(&self) -> Option<(f64, f64)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w.is_finite() && h.is_finite() => Some((w, h)),
            _ => None,
        }
    }

    /// The container's own frame in its child coordinate space.
    pub fn frame(&self) -> Option<Rect> {
        self.size().map(|(w, h)| Rect::new(0.0, 0.0, w, h))
    }
}

/// An element tree handed over by the editor: containers with their ordered
/// child lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub containers: Vec<Container>,
}

impl Scene {
    pub fn new(containers: Vec<Container>) -> Self {
        Self { containers }
    }

    pub fn from_json(input: &str) -> Result<Self, SceneError> {
        let scene = match serde_json::from_str::<Scene>(input) {
            Ok(scene) => scene,
            Err(strict) => json5::from_str::<Scene>(input)
                .map_err(|_| SceneError::Parse(strict.to_string()))?,
        };
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        let mut containers = HashSet::new();
        for container in &self.containers {
            if !containers.insert(container.id.as_str()) {
                return Err(SceneError::DuplicateContainer(container.id.clone()));
            }
            let mut children = HashSet::new();
            for child in &container.children {
                if !children.insert(child.id.as_str()) {
                    return Err(SceneError::DuplicateChild {
                        container: container.id.clone(),
                        child: child.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == id)
    }
}
