//! Viewer session: event handlers, per-frame advance, and render snapshot.
//!
//! One [`ViewerSession`] exists per running application. The host delivers
//! input events between frame ticks and calls [`ViewerSession::advance_frame`]
//! exactly once per rendered frame; both run on the same thread, so every
//! mutation is immediate in-memory arithmetic with no locking.

use rug::Float;

use crate::camera::{
    CameraSnapshot, PrecisionCamera, DEFAULT_PRECISION_BITS, DRAG_SENSITIVITY, ZOOM_SENSITIVITY,
};
use crate::clock::FrameClock;
use crate::input::{KeyCommand, PointerButton};

/// Bounds of the auto-zoom speed slider exposed by the overlay.
pub const ZOOM_SPEED_RANGE: (f64, f64) = (0.1, 2.0);

const DEFAULT_ZOOM_SPEED: f64 = 1.0;

/// Immutable knobs resolved at startup and handed to the session once.
#[derive(Debug, Clone)]
pub struct ViewerSettings {
    /// Iteration limit forwarded to the shader unchanged.
    pub max_iterations: u32,
    /// Mantissa width for camera state.
    pub precision_bits: u32,
    /// Screen-delta divisor for drag panning.
    pub drag_sensitivity: f64,
    /// Step divisor for scroll and auto-zoom.
    pub zoom_sensitivity: f64,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            max_iterations: 256,
            precision_bits: DEFAULT_PRECISION_BITS,
            drag_sensitivity: DRAG_SENSITIVITY,
            zoom_sensitivity: ZOOM_SENSITIVITY,
        }
    }
}

/// Frame-consistent values for the shader uniform interface.
///
/// Recomputed every frame and never stored; the wide camera state remains
/// the only source of truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSnapshot {
    pub max_iter: u32,
    pub scale: f32,
    pub center: [f32; 2],
    pub screen: [u32; 2],
}

/// Read-only values for the external overlay, plus the current slider state.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayReadout {
    /// Center x formatted to twelve fractional digits.
    pub center_x: String,
    /// Center y formatted to twelve fractional digits.
    pub center_y: String,
    pub fps: f64,
    pub auto_zoom: bool,
    pub zoom_speed: f64,
}

/// Continuous zoom animation state, driven once per frame.
#[derive(Debug, Clone)]
struct AutoZoom {
    enabled: bool,
    speed: Float,
}

/// The viewer session object owning camera, animation, and clock state.
pub struct ViewerSession {
    camera: PrecisionCamera,
    auto_zoom: AutoZoom,
    clock: FrameClock,
    pointer_exclusive: bool,
    exit_requested: bool,
    max_iterations: u32,
}

impl ViewerSession {
    pub fn new(settings: ViewerSettings) -> Self {
        let camera = PrecisionCamera::new(
            settings.precision_bits,
            settings.drag_sensitivity,
            settings.zoom_sensitivity,
        );
        let speed = Float::with_val(settings.precision_bits, DEFAULT_ZOOM_SPEED);
        Self {
            camera,
            auto_zoom: AutoZoom {
                enabled: false,
                speed,
            },
            clock: FrameClock::new(),
            pointer_exclusive: false,
            exit_requested: false,
            max_iterations: settings.max_iterations,
        }
    }

    /// Raw pointer motion delta in pixels.
    ///
    /// Pans the camera only while exclusivity mode is engaged; otherwise the
    /// motion belongs to the overlay and is ignored here.
    pub fn pointer_motion(&mut self, dx: f64, dy: f64) {
        if self.pointer_exclusive {
            self.camera.pan(dx, dy);
        }
    }

    /// Vertical scroll offset in wheel notches (positive = zoom in).
    ///
    /// Gated on exclusivity and on the precision floor, and scaled by the
    /// slider speed. Uses the exact step formula the auto-zoom animation
    /// uses, so handing control between the two is seamless.
    pub fn scroll(&mut self, y_offset: f64) {
        if self.pointer_exclusive && self.camera.above_precision_floor() {
            self.camera.zoom(&self.auto_zoom.speed, y_offset);
        }
    }

    /// Pointer button transition. Releases have no camera effect.
    pub fn pointer_button(&mut self, button: PointerButton, pressed: bool) {
        if pressed && button == PointerButton::Middle {
            self.pointer_exclusive = !self.pointer_exclusive;
            tracing::debug!(exclusive = self.pointer_exclusive, "pointer exclusivity toggled");
        }
    }

    /// Keyboard command dispatched by the host on key press.
    ///
    /// Commands are independent; there is no chord handling.
    pub fn key_command(&mut self, command: KeyCommand) {
        match command {
            KeyCommand::Exit => self.exit_requested = true,
            KeyCommand::ToggleAutoZoom => {
                self.auto_zoom.enabled = !self.auto_zoom.enabled;
                tracing::debug!(enabled = self.auto_zoom.enabled, "auto-zoom toggled");
            }
            KeyCommand::ResetZoom => {
                self.auto_zoom.enabled = false;
                self.camera.reset();
                tracing::debug!("zoom reset");
            }
        }
    }

    /// Whether the pointer is currently captured for camera control.
    pub fn pointer_exclusive(&self) -> bool {
        self.pointer_exclusive
    }

    /// True once an [`KeyCommand::Exit`] has been received.
    pub fn should_exit(&self) -> bool {
        self.exit_requested
    }

    /// Advances animation and clock state for one frame and returns the
    /// narrowed values the shader consumes.
    ///
    /// Must be called exactly once per rendered frame, after input delivery
    /// and before the draw: the auto-zoom decay step applies first, then the
    /// clock samples `now` (host seconds), then the camera is narrowed.
    pub fn advance_frame(&mut self, now: f64, screen: [u32; 2]) -> RenderSnapshot {
        if self.auto_zoom.enabled && self.camera.above_precision_floor() {
            self.camera.zoom(&self.auto_zoom.speed, 1.0);
        }
        self.clock.tick(now);

        let CameraSnapshot { center, scale } = self.camera.snapshot();
        RenderSnapshot {
            max_iter: self.max_iterations,
            scale,
            center,
            screen,
        }
    }

    /// Values the overlay displays, refreshed on demand.
    pub fn overlay_readout(&self) -> OverlayReadout {
        let (center_x, center_y) = self.camera.center_display();
        OverlayReadout {
            center_x,
            center_y,
            fps: self.clock.fps(),
            auto_zoom: self.auto_zoom.enabled,
            zoom_speed: self.auto_zoom.speed.to_f64(),
        }
    }

    /// Overlay write-back for the speed slider, clamped to
    /// [`ZOOM_SPEED_RANGE`].
    pub fn set_zoom_speed(&mut self, speed: f64) {
        let (lo, hi) = ZOOM_SPEED_RANGE;
        let clamped = speed.clamp(lo, hi);
        self.auto_zoom.speed = Float::with_val(self.auto_zoom.speed.prec(), clamped);
    }

    #[cfg(test)]
    fn scale_f64(&self) -> f64 {
        self.camera.scale_f64()
    }
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(ViewerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exclusive_session() -> ViewerSession {
        let mut session = ViewerSession::default();
        session.pointer_button(PointerButton::Middle, true);
        session
    }

    #[test]
    fn motion_and_scroll_pass_through_without_exclusivity() {
        let mut session = ViewerSession::default();
        session.pointer_motion(200.0, 0.0);
        session.scroll(1.0);
        let snap = session.advance_frame(0.0, [800, 600]);
        assert_eq!(snap.center, [0.0, 0.0]);
        assert_eq!(snap.scale, 1.0);
    }

    #[test]
    fn middle_press_toggles_exclusivity_release_does_not() {
        let mut session = ViewerSession::default();
        session.pointer_button(PointerButton::Middle, true);
        assert!(session.pointer_exclusive());
        session.pointer_button(PointerButton::Middle, false);
        assert!(session.pointer_exclusive());
        session.pointer_button(PointerButton::Left, true);
        assert!(session.pointer_exclusive());
        session.pointer_button(PointerButton::Middle, true);
        assert!(!session.pointer_exclusive());
    }

    #[test]
    fn exclusive_drag_pans_the_camera() {
        let mut session = exclusive_session();
        session.pointer_motion(200.0, 0.0);
        let snap = session.advance_frame(0.0, [800, 600]);
        assert_eq!(snap.center[0], 1.0);
    }

    #[test]
    fn scroll_and_auto_zoom_share_the_step_formula() {
        let mut manual = exclusive_session();
        manual.scroll(1.0);

        let mut auto = ViewerSession::default();
        auto.key_command(KeyCommand::ToggleAutoZoom);
        auto.advance_frame(0.0, [800, 600]);

        assert_eq!(manual.scale_f64(), auto.scale_f64());
    }

    #[test]
    fn auto_zoom_decays_monotonically_for_many_frames() {
        let mut session = ViewerSession::default();
        session.key_command(KeyCommand::ToggleAutoZoom);
        let mut previous = session.scale_f64();
        for frame in 1..=100 {
            session.advance_frame(frame as f64 / 60.0, [800, 600]);
            let current = session.scale_f64();
            assert!(current > 0.0);
            assert!(current < previous);
            previous = current;
        }
    }

    #[test]
    fn reset_command_disables_auto_zoom_and_restores_scale() {
        let mut session = exclusive_session();
        session.key_command(KeyCommand::ToggleAutoZoom);
        session.pointer_motion(40.0, 10.0);
        for frame in 0..10 {
            session.advance_frame(frame as f64 / 60.0, [800, 600]);
        }
        session.key_command(KeyCommand::ResetZoom);
        assert_eq!(session.scale_f64(), 1.0);
        assert!(!session.overlay_readout().auto_zoom);
        // Center survives the reset.
        let snap = session.advance_frame(1.0, [800, 600]);
        assert!(snap.center[0] != 0.0);
    }

    #[test]
    fn exit_command_sets_the_exit_flag() {
        let mut session = ViewerSession::default();
        assert!(!session.should_exit());
        session.key_command(KeyCommand::Exit);
        assert!(session.should_exit());
    }

    #[test]
    fn zoom_speed_write_back_is_clamped() {
        let mut session = ViewerSession::default();
        session.set_zoom_speed(5.0);
        assert_eq!(session.overlay_readout().zoom_speed, 2.0);
        session.set_zoom_speed(0.0);
        assert_eq!(session.overlay_readout().zoom_speed, 0.1);
        session.set_zoom_speed(1.3);
        assert!((session.overlay_readout().zoom_speed - 1.3).abs() < 1e-12);
    }

    #[test]
    fn scroll_respects_the_slider_speed() {
        let mut half = exclusive_session();
        half.set_zoom_speed(0.5);
        half.scroll(1.0);
        // step = 0.5 / (10 / 1.0) = 0.05
        assert!((half.scale_f64() - 0.95).abs() < 1e-15);
    }

    #[test]
    fn overlay_formats_center_to_twelve_digits() {
        let mut session = exclusive_session();
        session.pointer_motion(73.0, -21.0);
        let readout = session.overlay_readout();
        for value in [&readout.center_x, &readout.center_y] {
            let (_, fraction) = value.split_once('.').expect("fixed-point rendering");
            assert_eq!(fraction.len(), 12);
        }
    }

    #[test]
    fn snapshot_carries_config_and_screen_through() {
        let settings = ViewerSettings {
            max_iterations: 640,
            ..ViewerSettings::default()
        };
        let mut session = ViewerSession::new(settings);
        let snap = session.advance_frame(0.0, [1024, 768]);
        assert_eq!(snap.max_iter, 640);
        assert_eq!(snap.screen, [1024, 768]);
    }
}
