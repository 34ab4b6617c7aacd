//! Arbitrary-precision fractal-space camera.
//!
//! `scale` is the half-width of the visible fractal-space window, so smaller
//! values mean deeper zoom. Both the center coordinate and the scale are
//! stored as [`rug::Float`] values; narrowing to native floats happens only
//! in [`PrecisionCamera::snapshot`], which the render path calls once per
//! frame. Everything else mutates the wide representation directly.

use rug::Float;

/// Default mantissa width for camera state, in bits.
///
/// 128 bits resolve roughly 38 decimal digits, comfortably past the
/// [`PRECISION_FLOOR`] where zooming stops being visually meaningful.
pub const DEFAULT_PRECISION_BITS: u32 = 128;

/// Scale value below which further zoom-in requests are suppressed.
///
/// The representation stays valid below this point; it just no longer
/// resolves additional detail, so the camera treats the boundary as a
/// silent no-op rather than an error.
pub const PRECISION_FLOOR: f64 = 1.925_641_750_805_661_457_150_236_734e-15;

/// Screen-delta divisor for drag panning (pixels of drag per `scale` unit).
pub const DRAG_SENSITIVITY: f64 = 200.0;

/// Step divisor for scroll and auto-zoom.
///
/// Distinct from [`DRAG_SENSITIVITY`]: a single wheel notch covers a tenth
/// of the visible window, while dragging tracks the pointer pixel-for-pixel.
/// Both divisors are configurable through
/// [`ViewerSettings`](crate::ViewerSettings).
pub const ZOOM_SENSITIVITY: f64 = 10.0;

/// Native-precision projection of the camera, produced once per frame.
///
/// This is a lossy render-only view; the wide state inside
/// [`PrecisionCamera`] remains the source of truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSnapshot {
    pub center: [f32; 2],
    pub scale: f32,
}

/// Viewport camera over the fractal plane.
///
/// Invariant: `scale > 0`. Zoom steps shrink multiplicatively with the
/// current scale, so the value decays toward zero without ever reaching it;
/// the precision floor cuts mutation off long before that matters.
#[derive(Debug, Clone)]
pub struct PrecisionCamera {
    center_x: Float,
    center_y: Float,
    scale: Float,
    floor: Float,
    drag_sensitivity: Float,
    zoom_sensitivity: Float,
}

impl PrecisionCamera {
    /// Creates a camera at `center = (0, 0)`, `scale = 1` with the supplied
    /// mantissa width and sensitivity divisors.
    pub fn new(precision_bits: u32, drag_sensitivity: f64, zoom_sensitivity: f64) -> Self {
        let prec = precision_bits;
        Self {
            center_x: Float::with_val(prec, 0.0),
            center_y: Float::with_val(prec, 0.0),
            scale: Float::with_val(prec, 1.0),
            floor: Float::with_val(prec, PRECISION_FLOOR),
            drag_sensitivity: Float::with_val(prec, drag_sensitivity),
            zoom_sensitivity: Float::with_val(prec, zoom_sensitivity),
        }
    }

    /// Shifts the center by a raw screen-space drag delta.
    ///
    /// The delta is divided by `drag_sensitivity / scale`, so a fixed pixel
    /// motion always covers the same fraction of the visible window no
    /// matter how deep the zoom is. Vertical screen deltas grow downward
    /// while fractal-space y grows upward, hence the sign flip.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let prec = self.scale.prec();
        let step_x = Float::with_val(prec, dx) * &self.scale / &self.drag_sensitivity;
        let step_y = Float::with_val(prec, dy) * &self.scale / &self.drag_sensitivity;
        self.center_x += step_x;
        self.center_y -= step_y;
    }

    /// Applies one zoom step of `amount`, scaled by the signed `direction`.
    ///
    /// The step is `amount * direction * scale / zoom_sensitivity`, so zoom
    /// speed feels constant in screen space at any depth. Positive direction
    /// zooms in. The mutation is applied only while the scale is still above
    /// the precision floor; a single step may land below the floor, which is
    /// fine because steps shrink along with the scale.
    pub fn zoom(&mut self, amount: &Float, direction: f64) {
        if !self.above_precision_floor() {
            tracing::trace!("precision floor reached; ignoring zoom step");
            return;
        }
        let prec = self.scale.prec();
        let step =
            Float::with_val(prec, amount * &self.scale) / &self.zoom_sensitivity * direction;
        self.scale -= step;
    }

    /// Restores `scale = 1` without touching the center.
    ///
    /// This is "reset zoom", not "reset view": the camera stays aimed at
    /// whatever coordinate the user navigated to.
    pub fn reset(&mut self) {
        let prec = self.scale.prec();
        self.scale = Float::with_val(prec, 1.0);
    }

    /// True while zoom-in mutations are still accepted.
    pub fn above_precision_floor(&self) -> bool {
        self.scale > self.floor
    }

    /// Narrows the wide state to the native floats the shader consumes.
    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            center: [self.center_x.to_f32(), self.center_y.to_f32()],
            scale: self.scale.to_f32(),
        }
    }

    /// Current scale as `f64`, for display purposes only.
    pub fn scale_f64(&self) -> f64 {
        self.scale.to_f64()
    }

    /// Center coordinate formatted to twelve fractional digits, the widest
    /// rendering the overlay displays.
    pub fn center_display(&self) -> (String, String) {
        (
            format!("{:.12}", self.center_x),
            format!("{:.12}", self.center_y),
        )
    }
}

impl Default for PrecisionCamera {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION_BITS, DRAG_SENSITIVITY, ZOOM_SENSITIVITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_amount(camera: &PrecisionCamera) -> Float {
        Float::with_val(camera.scale.prec(), 1.0)
    }

    #[test]
    fn zoom_step_matches_sensitivity_formula() {
        let mut camera = PrecisionCamera::default();
        let amount = unit_amount(&camera);
        camera.zoom(&amount, 1.0);
        // step = 1.0 / (10 / 1.0) = 0.1
        assert!((camera.scale_f64() - 0.9).abs() < 1e-15);
    }

    #[test]
    fn zoom_strictly_decreases_until_floor_then_stops() {
        let mut camera = PrecisionCamera::default();
        let amount = Float::with_val(camera.scale.prec(), 2.0);
        let mut previous = camera.scale_f64();
        for _ in 0..200 {
            let was_above = camera.above_precision_floor();
            camera.zoom(&amount, 1.0);
            let current = camera.scale_f64();
            assert!(current > 0.0);
            if was_above {
                assert!(current < previous);
            } else {
                assert_eq!(current, previous);
            }
            previous = current;
        }
        // 200 steps of ×0.8 land well below the floor; the guard must hold.
        assert!(!camera.above_precision_floor());
        let frozen = camera.scale_f64();
        camera.zoom(&amount, 1.0);
        assert_eq!(camera.scale_f64(), frozen);
    }

    #[test]
    fn zoom_out_reverses_direction() {
        let mut camera = PrecisionCamera::default();
        let amount = unit_amount(&camera);
        camera.zoom(&amount, -1.0);
        assert!(camera.scale_f64() > 1.0);
    }

    #[test]
    fn pan_is_exactly_invertible() {
        let mut camera = PrecisionCamera::default();
        camera.pan(37.0, -12.0);
        camera.pan(-37.0, 12.0);
        let snap = camera.snapshot();
        assert_eq!(snap.center, [0.0, 0.0]);
        assert_eq!(camera.center_display().0, format!("{:.12}", 0.0));
    }

    #[test]
    fn pan_sensitivity_scales_with_depth() {
        let mut camera = PrecisionCamera::default();
        camera.pan(200.0, 0.0);
        // 200 px at scale 1.0 is one full scale unit.
        assert_eq!(camera.snapshot().center[0], 1.0);

        let mut deep = PrecisionCamera::default();
        let amount = unit_amount(&deep);
        deep.zoom(&amount, 1.0);
        deep.pan(200.0, 0.0);
        // The same drag at scale 0.9 covers proportionally less ground.
        assert!((deep.snapshot().center[0] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn vertical_pan_is_inverted() {
        let mut camera = PrecisionCamera::default();
        camera.pan(0.0, 100.0);
        assert!(camera.snapshot().center[1] < 0.0);
    }

    #[test]
    fn reset_restores_scale_and_keeps_center() {
        let mut camera = PrecisionCamera::default();
        camera.pan(200.0, -50.0);
        let amount = unit_amount(&camera);
        for _ in 0..5 {
            camera.zoom(&amount, 1.0);
        }
        let center_before = camera.center_display();
        camera.reset();
        assert_eq!(camera.scale_f64(), 1.0);
        assert_eq!(camera.center_display(), center_before);
    }

    #[test]
    fn snapshot_stays_finite_at_the_floor() {
        let mut camera = PrecisionCamera::default();
        let amount = Float::with_val(camera.scale.prec(), 2.0);
        while camera.above_precision_floor() {
            camera.zoom(&amount, 1.0);
        }
        let snap = camera.snapshot();
        assert!(snap.scale.is_finite());
        assert!(snap.scale > 0.0);
        assert!(snap.center[0].is_finite() && snap.center[1].is_finite());
    }
}
