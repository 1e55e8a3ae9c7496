//! Time management utilities

use std::time::{Duration, Instant};

/// Default rate at which the FPS figure is resampled
pub const DEFAULT_SAMPLE_RATE: f64 = 30.0;

/// Frame timer with a smoothed frames-per-second reading
///
/// `delta_time` is measured per frame. FPS and frame milliseconds are
/// resampled once at least `1 / sample_rate` seconds have passed, averaging
/// over all frames seen in that window.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,

    sample_start: Instant,
    sample_frames: u32,
    sample_rate: f64,
    fps: f64,
    frame_ms: f64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a new timer starting now
    pub fn new() -> Self {
        Self::starting_at(Instant::now(), DEFAULT_SAMPLE_RATE)
    }

    /// Create a timer with a custom FPS sample rate
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self::starting_at(Instant::now(), sample_rate)
    }

    fn starting_at(now: Instant, sample_rate: f64) -> Self {
        Self {
            last_frame: now,
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
            sample_start: now,
            sample_frames: 0,
            sample_rate: sample_rate.max(f64::EPSILON),
            fps: 0.0,
            frame_ms: 0.0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Update the timer as if the frame ended at `now`
    pub fn update_at(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_frame);
        self.delta_time = elapsed.as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;

        self.sample_frames += 1;
        let window = now.saturating_duration_since(self.sample_start).as_secs_f64();
        if window >= 1.0 / self.sample_rate {
            self.fps = f64::from(self.sample_frames) / window;
            self.frame_ms = window / f64::from(self.sample_frames) * 1000.0;
            self.sample_start = now;
            self.sample_frames = 0;
        }
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Last sampled frames per second
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Last sampled average frame time in milliseconds
    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }

    /// Time since the last frame ended
    pub fn since_last_frame(&self) -> Duration {
        self.last_frame.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_delta_and_total_time() {
        let start = Instant::now();
        let mut timer = FrameTimer::starting_at(start, DEFAULT_SAMPLE_RATE);

        timer.update_at(start + Duration::from_millis(10));
        timer.update_at(start + Duration::from_millis(30));

        assert_eq!(timer.frame_count(), 2);
        assert_relative_eq!(timer.delta_time(), 0.020, epsilon = 1e-4);
        assert_relative_eq!(timer.total_time(), 0.030, epsilon = 1e-4);
    }

    #[test]
    fn test_fps_is_sampled_over_window() {
        let start = Instant::now();
        // Sample every 100ms
        let mut timer = FrameTimer::starting_at(start, 10.0);

        for frame in 1..=4 {
            timer.update_at(start + Duration::from_millis(25 * frame));
        }

        assert_relative_eq!(timer.fps(), 40.0, epsilon = 1e-6);
        assert_relative_eq!(timer.frame_ms(), 25.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fps_holds_between_samples() {
        let start = Instant::now();
        let mut timer = FrameTimer::starting_at(start, 10.0);

        timer.update_at(start + Duration::from_millis(50));
        assert_eq!(timer.fps(), 0.0);

        timer.update_at(start + Duration::from_millis(100));
        let sampled = timer.fps();
        timer.update_at(start + Duration::from_millis(110));

        assert_relative_eq!(timer.fps(), sampled);
    }
}
