pub mod backend;
pub mod bridge;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod displacement;
pub mod dump;
pub mod geometry;
pub mod index;
pub mod length;
pub mod scene;
pub mod scheduler;
pub mod snap;
pub mod snapshot;

pub use backend::{AcceleratedBackend, SnapBackend, SoftwareBackend, select_backend};
pub use bridge::{DragCommit, DragFrame, Frame, LiveBridge, Subscription};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{BackendKind, EngineConfig, IndexConfig, SnapConfig, load_config};
pub use displacement::{DisplacementMap, Offset, resolve_displacement};
pub use geometry::{Axis, Orientation, Overlap, Point, Rect, edges_of, intersects, overlap};
pub use index::{Sibling, SpatialIndex};
pub use length::Length;
pub use scene::{Container, Element, ElementStyle, Scene, SceneError};
pub use scheduler::{CancelToken, FrameScheduler, ManualScheduler};
pub use snap::{GuideKind, SnapGuide, SnapOptions, SnapResult, resolve_snap, resolve_snap_with};
pub use snapshot::GeometrySnapshot;
