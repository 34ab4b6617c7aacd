//! Frame counting and FPS sampling.

/// Rolling one-second FPS sampler.
///
/// Frames are counted between sample boundaries; once at least one second of
/// host time has elapsed the counter is divided by the actual elapsed span
/// and the window restarts. This is a cheap moving-average stand-in rather
/// than real frame-time smoothing, which is all the overlay needs. No FPS is
/// reported until the first full window has closed.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    window_start: Option<f64>,
    frames: u32,
    fps: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one rendered frame at host time `now` (seconds).
    ///
    /// The first tick only seeds the sampling window; it carries no elapsed
    /// history and is not counted as a frame.
    pub fn tick(&mut self, now: f64) {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            self.frames = 0;
            return;
        };

        self.frames += 1;
        let elapsed = now - start;
        if elapsed >= 1.0 {
            self.fps = f64::from(self.frames) / elapsed;
            self.window_start = Some(now);
            self.frames = 0;
        }
    }

    /// Most recently sampled frames-per-second; `0.0` before the first
    /// window completes.
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_fps_before_first_window_closes() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        clock.tick(0.5);
        clock.tick(0.9);
        assert_eq!(clock.fps(), 0.0);
    }

    #[test]
    fn samples_over_the_actual_elapsed_span() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        clock.tick(0.5);
        clock.tick(1.1);
        // Two frames over 1.1 seconds, not over the nominal 1.0 window.
        assert!((clock.fps() - 2.0 / 1.1).abs() < 1e-12);
    }

    #[test]
    fn window_resets_after_sampling() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        clock.tick(0.5);
        clock.tick(1.1);
        let sampled = clock.fps();
        // A fresh window begins at 1.1; frames before its close leave the
        // published value untouched.
        clock.tick(1.6);
        assert_eq!(clock.fps(), sampled);
        clock.tick(2.2);
        assert!((clock.fps() - 2.0 / 1.1).abs() < 1e-12);
    }
}
