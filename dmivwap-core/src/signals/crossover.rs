//! Buyers-in-control crossover, confirmed by rising volume.
//!
//! Fires when Buyers% crosses above Sellers%: previous bar Buyers% <= Sellers%,
//! current bar Buyers% > Sellers%. The arrow is only emitted when the current
//! bar's volume is also strictly above the previous bar's.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
struct PrevReading {
    buyers: f64,
    sellers: f64,
    volume: u64,
}

/// Result of one crossover evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrossoverEvent {
    /// Buyers% crossed above Sellers% on this bar.
    pub buy_in_control: bool,
    /// `buy_in_control` and volume rose versus the previous bar.
    pub buy_signal: bool,
}

/// Holds the previous bar's Buyers%, Sellers% and volume.
#[derive(Debug, Clone, Default)]
pub struct BuyCrossover {
    prev: Option<PrevReading>,
}

impl BuyCrossover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }

    pub fn next(&mut self, buyers: f64, sellers: f64, volume: u64) -> CrossoverEvent {
        let event = match self.prev {
            // Guard: the first bar has nothing to cross from.
            None => CrossoverEvent::default(),
            Some(prev) => {
                let buy_in_control = buyers > sellers && prev.buyers <= prev.sellers;
                CrossoverEvent {
                    buy_in_control,
                    buy_signal: buy_in_control && volume > prev.volume,
                }
            }
        };
        self.prev = Some(PrevReading {
            buyers,
            sellers,
            volume,
        });
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(series: &[(f64, f64, u64)]) -> Vec<CrossoverEvent> {
        let mut cross = BuyCrossover::new();
        series
            .iter()
            .map(|&(b, s, v)| cross.next(b, s, v))
            .collect()
    }

    #[test]
    fn fires_once_on_confirmed_cross() {
        let events = run(&[
            (10.0, 30.0, 100),
            (15.0, 25.0, 110),
            (20.0, 20.0, 90),
            (28.0, 18.0, 150), // cross with rising volume
            (30.0, 15.0, 200),
        ]);
        let signals: Vec<bool> = events.iter().map(|e| e.buy_signal).collect();
        assert_eq!(signals, vec![false, false, false, true, false]);
    }

    #[test]
    fn cross_without_rising_volume_is_not_a_signal() {
        let events = run(&[(10.0, 20.0, 500), (25.0, 20.0, 400)]);
        assert!(events[1].buy_in_control);
        assert!(!events[1].buy_signal);
    }

    #[test]
    fn equal_volume_does_not_confirm() {
        let events = run(&[(10.0, 20.0, 500), (25.0, 20.0, 500)]);
        assert!(!events[1].buy_signal);
    }

    #[test]
    fn touching_is_not_crossing() {
        // Buyers% reaching Sellers% exactly is not a strict upward cross.
        let events = run(&[(10.0, 20.0, 1), (20.0, 20.0, 2)]);
        assert!(!events[1].buy_in_control);
    }

    #[test]
    fn downward_cross_never_fires() {
        let events = run(&[(30.0, 20.0, 1), (10.0, 20.0, 2), (5.0, 25.0, 3)]);
        assert!(events.iter().all(|e| !e.buy_in_control));
    }

    #[test]
    fn first_bar_never_fires() {
        let events = run(&[(50.0, 0.0, 1000)]);
        assert_eq!(events[0], CrossoverEvent::default());
    }

    #[test]
    fn reset_forgets_previous_bar() {
        let mut cross = BuyCrossover::new();
        cross.next(10.0, 20.0, 1);
        cross.reset();
        assert!(!cross.next(30.0, 20.0, 2).buy_in_control);
    }
}
