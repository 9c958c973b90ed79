//! Scanfit Core Library - mesh interaction and plane fitting
//!
//! This library decodes binary STL meshes, projects them through a fixed
//! camera, renders them depth-sorted onto any 2D canvas, picks faces under a
//! screen point, and fits a least-squares plane to the selected faces.

pub mod geometry;
pub mod picking;
pub mod plane;
pub mod projection;
pub mod render;
pub mod selection;
pub mod stl;
pub mod transform;
pub mod viewer;

// Re-export commonly used types
pub use geometry::{Bounds, Mesh, Triangle};
pub use picking::{PickSettings, TapTracker};
pub use plane::{FittedPlane, PlaneEquation};
pub use projection::{Camera, Frame, ScreenPoint, Viewport};
pub use render::{Canvas, Color, RenderSettings};
pub use selection::SelectionSet;
pub use stl::FormatError;
pub use transform::{RotationState, Transform, ViewState};
pub use viewer::Viewer;
