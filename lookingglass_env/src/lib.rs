//! LookingGlass Environment Abstraction Layer
//!
//! This crate holds everything the dual-world engine exchanges with the
//! host application, so the engine itself stays free of any rendering or
//! physics backend:
//!
//! - **Motion / camera input**: [`Pose`], [`BodyExtents`], [`ViewParams`]
//! - **Physics**: the [`OverlapOracle`] capsule query
//! - **Display**: the [`CapturePipeline`] that renders the shadow viewpoint
//!
//! # Example
//!
//! ```ignore
//! use lookingglass_env::{CapsuleQuery, OverlapOracle};
//!
//! // Any closure is an oracle, handy for wiring a physics backend.
//! let open_sky = |_q: &CapsuleQuery| false;
//! assert!(!open_sky.check_capsule(&query));
//! ```

mod capture;
mod error;
mod oracle;
mod types;

pub use capture::{CaptureBuffer, CapturePipeline, CaptureTarget, HeadlessCapture, PixelFormat};
pub use error::EnvError;
pub use oracle::OverlapOracle;
pub use types::{BodyExtents, CapsuleQuery, ClearFlags, Color, LayerMask, Pose, ViewParams};
