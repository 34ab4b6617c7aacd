//! Core state machine for the deep-zoom Mandelbrot viewer.
//!
//! The crate owns everything that happens between a raw input event and the
//! values handed to the GPU shader, but nothing about windowing or rendering
//! itself. The overall flow per frame:
//!
//! ```text
//!   host events ──▶ ViewerSession handlers ──▶ PrecisionCamera (rug::Float)
//!                                                    │
//!   host frame tick ──▶ advance_frame() ─┬─ auto-zoom decay step
//!                                        ├─ FrameClock tick
//!                                        └─▶ RenderSnapshot (f32 narrowing)
//! ```
//!
//! Camera state lives in arbitrary-precision floats so zoom depth can run far
//! past what `f64` resolves; the narrowing to native floats happens only at
//! the [`RenderSnapshot`] boundary, once per frame. The host drives the
//! session synchronously on a single thread, so no locking is needed.

pub mod camera;
pub mod clock;
pub mod input;
pub mod session;

pub use camera::{CameraSnapshot, PrecisionCamera};
pub use clock::FrameClock;
pub use input::{KeyCommand, PointerButton};
pub use session::{OverlayReadout, RenderSnapshot, ViewerSession, ViewerSettings};
