/// Integer range; holds no references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl Default for Range {
    fn default() -> Self {
        Self {
            start: 0,
            stop: -1,
            step: 1,
        }
    }
}

impl Range {
    #[must_use]
    pub fn new(start: i64, stop: i64, step: i64) -> Self {
        Self { start, stop, step }
    }

    /// Number of elements produced; zero for an empty or zero-step range.
    #[must_use]
    pub fn len(&self) -> usize {
        let span = match self.step {
            0 => return 0,
            s if s > 0 => self.stop.saturating_sub(self.start),
            _ => self.start.saturating_sub(self.stop),
        };
        if span <= 0 {
            return 0;
        }
        let step = self.step.unsigned_abs();
        usize::try_from(span.unsigned_abs().div_ceil(step)).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths() {
        assert_eq!(Range::new(0, 10, 1).len(), 10);
        assert_eq!(Range::new(0, 10, 3).len(), 4);
        assert_eq!(Range::new(10, 0, -2).len(), 5);
        assert!(Range::new(5, 5, 1).is_empty());
        assert!(Range::default().is_empty());
    }
}
