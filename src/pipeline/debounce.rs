//! Confirmation of classifier output across consecutive windows
//!
//! Single-window predictions flicker. A label only becomes an action once
//! it has been predicted for `threshold` windows in a row, and a run fires
//! at most once: the action is emitted on the window where the run length
//! first equals the threshold. Any different label starts a new run.

use crate::types::ClassLabel;

/// Run-length state machine over classifier labels.
#[derive(Debug, Clone)]
pub struct StateDebouncer {
    /// Label of the current run; `None` until the first window.
    candidate: Option<ClassLabel>,
    run_length: u32,
    threshold: u32,
    /// Last label that produced an action.
    confirmed: Option<ClassLabel>,
}

impl StateDebouncer {
    /// `threshold` of 0 is treated as 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            candidate: None,
            run_length: 0,
            threshold: threshold.max(1),
            confirmed: None,
        }
    }

    /// Feed one classification. Returns the label to act on when this
    /// window completes a run of `threshold` matches.
    pub fn observe(&mut self, label: ClassLabel) -> Option<ClassLabel> {
        if self.candidate == Some(label) {
            self.run_length = self.run_length.saturating_add(1);
        } else {
            self.candidate = Some(label);
            self.run_length = 1;
        }

        if self.run_length == self.threshold {
            self.confirmed = Some(label);
            Some(label)
        } else {
            None
        }
    }

    pub const fn candidate(&self) -> Option<ClassLabel> {
        self.candidate
    }

    pub const fn run_length(&self) -> u32 {
        self.run_length
    }

    pub const fn confirmed(&self) -> Option<ClassLabel> {
        self.confirmed
    }

    pub const fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(debouncer: &mut StateDebouncer, labels: &[u8]) -> Vec<(usize, ClassLabel)> {
        labels
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| debouncer.observe(ClassLabel(l)).map(|a| (i, a)))
            .collect()
    }

    #[test]
    fn test_five_matches_fire_once_on_fifth() {
        let mut d = StateDebouncer::new(5);
        assert_eq!(actions(&mut d, &[0, 0, 0, 0, 0]), vec![(4, ClassLabel(0))]);
        assert_eq!(d.confirmed(), Some(ClassLabel(0)));
    }

    #[test]
    fn test_alternating_labels_never_fire() {
        let mut d = StateDebouncer::new(5);
        assert!(actions(&mut d, &[0, 1, 0, 1, 0]).is_empty());
        assert_eq!(d.run_length(), 1);
        assert_eq!(d.confirmed(), None);
    }

    #[test]
    fn test_long_run_fires_exactly_once() {
        let mut d = StateDebouncer::new(5);
        assert_eq!(actions(&mut d, &[2, 2, 2, 2, 2, 2, 2]), vec![(4, ClassLabel(2))]);
        assert_eq!(d.run_length(), 7);
    }

    #[test]
    fn test_first_window_always_starts_a_run() {
        let mut d = StateDebouncer::new(5);
        assert_eq!(d.candidate(), None);
        assert_eq!(d.observe(ClassLabel(0)), None);
        assert_eq!(d.candidate(), Some(ClassLabel(0)));
        assert_eq!(d.run_length(), 1);
    }

    #[test]
    fn test_interrupted_run_restarts_count() {
        let mut d = StateDebouncer::new(3);
        // run of 2, break, then a fresh run of 3 fires
        let fired = actions(&mut d, &[3, 3, 2, 3, 3, 3]);
        assert_eq!(fired, vec![(5, ClassLabel(3))]);
    }

    #[test]
    fn test_aliased_normal_labels_are_distinct() {
        let mut d = StateDebouncer::new(3);
        assert!(actions(&mut d, &[0, 0, 1, 1]).is_empty());
        assert_eq!(d.observe(ClassLabel(1)), Some(ClassLabel(1)));
    }

    #[test]
    fn test_same_state_refires_after_a_new_run() {
        let mut d = StateDebouncer::new(2);
        let fired = actions(&mut d, &[2, 2, 2, 0, 2, 2]);
        assert_eq!(fired, vec![(1, ClassLabel(2)), (5, ClassLabel(2))]);
    }

    #[test]
    fn test_threshold_of_one_fires_on_every_change() {
        let mut d = StateDebouncer::new(0);
        assert_eq!(d.threshold(), 1);
        let fired = actions(&mut d, &[1, 1, 2]);
        assert_eq!(fired, vec![(0, ClassLabel(1)), (2, ClassLabel(2))]);
    }
}
