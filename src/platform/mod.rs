//! Platform abstraction layer
//!
//! Frame timing shared by the browser loop (requestAnimationFrame
//! timestamps) and the native headless driver.

use crate::consts::MAX_FRAME_DT;

/// Turns frame timestamps (milliseconds) into clamped tick lengths.
///
/// A stopped clock yields no ticks until started again.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
    running: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) timing from `now_ms`
    pub fn start(&mut self, now_ms: f64) {
        self.last_ms = Some(now_ms);
        self.running = true;
    }

    /// Seconds since the previous frame, clamped to `[0, MAX_FRAME_DT]`.
    /// `None` when stopped.
    pub fn advance(&mut self, now_ms: f64) -> Option<f32> {
        if !self.running {
            return None;
        }
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        // Backwards clocks and NaN collapse to zero
        Some(if dt > 0.0 { dt.min(MAX_FRAME_DT) } else { 0.0 })
    }

    /// Teardown: no further ticks
    pub fn stop(&mut self) {
        self.running = false;
        self.last_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_frame() {
        let mut clock = FrameClock::new();
        clock.start(1000.0);
        let dt = clock.advance(1016.0).unwrap();
        assert!((dt - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_stall_clamped() {
        let mut clock = FrameClock::new();
        clock.start(0.0);
        assert_eq!(clock.advance(5000.0), Some(MAX_FRAME_DT));
    }

    #[test]
    fn test_backwards_clock() {
        let mut clock = FrameClock::new();
        clock.start(500.0);
        assert_eq!(clock.advance(400.0), Some(0.0));
        assert_eq!(clock.advance(f64::NAN), Some(0.0));
    }

    #[test]
    fn test_stopped_clock_yields_nothing() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(10.0), None);
        clock.start(10.0);
        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.advance(20.0), None);
    }
}
