use crate::random::RandomSource;

/// A scripted random source for tests: returns the given values in order, wrapping around at the
/// end, and counts how many values have been drawn.
#[derive(Clone, Debug)]
pub struct ReplaySource {
    values: Vec<f64>,
    position: usize,
    calls: usize,
}

impl ReplaySource {
    /// # Panics
    ///
    /// Panics if `values` is empty or contains a value outside (0, 1).
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "a replay source needs at least one value");
        assert!(
            values.iter().all(|u| *u > 0.0 && *u < 1.0),
            "replayed values must lie in (0, 1)"
        );
        ReplaySource {
            values,
            position: 0,
            calls: 0,
        }
    }

    /// A source that returns `value` forever.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of values drawn so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl RandomSource for ReplaySource {
    fn next_uniform(&mut self) -> f64 {
        let value = self.values[self.position];
        self.position = (self.position + 1) % self.values.len();
        self.calls += 1;
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn replays_in_order_and_wraps() {
        let mut source = ReplaySource::new(vec![0.1, 0.2]);
        assert_eq!(source.next_uniform(), 0.1);
        assert_eq!(source.next_uniform(), 0.2);
        assert_eq!(source.next_uniform(), 0.1);
        assert_eq!(source.calls(), 3);
    }

    #[test]
    #[should_panic(expected = "replayed values must lie in (0, 1)")]
    fn rejects_closed_interval_values() {
        let _ = ReplaySource::new(vec![0.0]);
    }
}
