/// Counts bars until every smoothed series of the study covers a full window.
///
/// Outputs during warmup are still defined (every average seeds with the data
/// it has), but they do not yet cover full windows. Hosts use `is_warm` to
/// decide whether to trust or grey out early values.
#[derive(Debug, Clone)]
pub struct WarmupState {
    required: usize,
    seen: usize,
}

impl WarmupState {
    pub fn new(required: usize) -> Self {
        Self { required, seen: 0 }
    }

    /// Warm once the slowest component has seen `lookback + 1` bars.
    pub fn from_lookbacks(lookbacks: &[usize]) -> Self {
        Self::new(lookbacks.iter().map(|l| l + 1).max().unwrap_or(0))
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn process_bar(&mut self) {
        self.seen += 1;
    }

    pub fn bars_processed(&self) -> usize {
        self.seen
    }

    pub fn is_warm(&self) -> bool {
        self.seen >= self.required
    }

    pub fn bars_until_warm(&self) -> usize {
        self.required.saturating_sub(self.seen)
    }

    pub fn reset(&mut self) {
        self.seen = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slowest_lookback_wins() {
        // Wilders 14 DMI lookback is 26; trend label needs 20 bars back.
        let warmup = WarmupState::from_lookbacks(&[26, 20]);
        assert_eq!(warmup.required(), 27);
    }

    #[test]
    fn counts_down_to_warm() {
        let mut warmup = WarmupState::from_lookbacks(&[2]);
        assert_eq!(warmup.bars_until_warm(), 3);
        warmup.process_bar();
        warmup.process_bar();
        assert!(!warmup.is_warm());
        assert_eq!(warmup.bars_until_warm(), 1);
        warmup.process_bar();
        assert!(warmup.is_warm());
        warmup.process_bar();
        assert_eq!(warmup.bars_until_warm(), 0);
    }

    #[test]
    fn no_lookbacks_is_warm_immediately() {
        let warmup = WarmupState::from_lookbacks(&[]);
        assert!(warmup.is_warm());
    }

    #[test]
    fn reset_starts_over() {
        let mut warmup = WarmupState::new(1);
        warmup.process_bar();
        assert!(warmup.is_warm());
        warmup.reset();
        assert_eq!(warmup.bars_processed(), 0);
        assert!(!warmup.is_warm());
    }
}
