use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

const MEASUREMENTS: usize = 120;

pub struct FpsCounter {
    frame_durations: VecDeque<Duration>,
    last_frame_time: Instant,
}

impl FpsCounter {
    pub fn new() -> Self {
        FpsCounter {
            frame_durations: VecDeque::with_capacity(MEASUREMENTS),
            last_frame_time: Instant::now(),
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.record(now.duration_since(self.last_frame_time));
        self.last_frame_time = now;
    }

    fn record(&mut self, delta: Duration) {
        if self.frame_durations.len() == MEASUREMENTS {
            self.frame_durations.pop_front();
        }
        self.frame_durations.push_back(delta);
    }

    /// `None` until the first frame has been measured.
    pub fn average_frame_time(&self) -> Option<Duration> {
        if self.frame_durations.is_empty() {
            return None;
        }

        let sum: Duration = self.frame_durations.iter().sum();
        Some(sum / (self.frame_durations.len() as u32))
    }

    pub fn slowest_frame_time(&self) -> Option<Duration> {
        self.frame_durations.iter().max().copied()
    }

    pub fn summary(&self) -> String {
        match (self.average_frame_time(), self.slowest_frame_time()) {
            (Some(average), Some(slowest)) => format!(
                "{:.2} ms average, {:.2} ms slowest",
                average.as_secs_f64() * 1000.0,
                slowest.as_secs_f64() * 1000.0
            ),
            _ => "no frames yet".to_string(),
        }
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_last_measurements() {
        let mut counter = FpsCounter::new();
        assert_eq!(counter.average_frame_time(), None);
        assert_eq!(counter.summary(), "no frames yet");

        counter.record(Duration::from_millis(100));
        for _ in 0..MEASUREMENTS {
            counter.record(Duration::from_millis(10));
        }

        assert_eq!(counter.average_frame_time(), Some(Duration::from_millis(10)));
        assert_eq!(counter.slowest_frame_time(), Some(Duration::from_millis(10)));
        assert_eq!(counter.summary(), "10.00 ms average, 10.00 ms slowest");
    }
}
