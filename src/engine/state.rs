//! Lock-free job state shared between the supervising task and control callers

use std::sync::atomic::{AtomicU8, Ordering};

use crate::domain::model::JobState;

#[derive(Debug)]
pub struct AtomicJobState(AtomicU8);

impl AtomicJobState {
    pub fn new(state: JobState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn get(&self) -> JobState {
        JobState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `to` only if the current state is one of `from`.
    ///
    /// Returns the state that was replaced, or `None` if nothing changed.
    pub fn transition(&self, from: &[JobState], to: JobState) -> Option<JobState> {
        self.transition_where(|state| from.contains(state), to)
    }

    /// Like [`transition`](Self::transition), with the allowed states given by a predicate
    pub fn transition_where(
        &self,
        allowed: impl Fn(&JobState) -> bool,
        to: JobState,
    ) -> Option<JobState> {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let state = JobState::from_u8(current);
            if !allowed(&state) {
                return None;
            }
            match self
                .0
                .compare_exchange_weak(current, to as u8, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Some(state),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for AtomicJobState {
    fn default() -> Self {
        Self::new(JobState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_from_allowed_state() {
        let state = AtomicJobState::default();
        assert_eq!(
            state.transition(&[JobState::Idle], JobState::Running),
            Some(JobState::Idle)
        );
        assert_eq!(state.get(), JobState::Running);
    }

    #[test]
    fn test_transition_rejected() {
        let state = AtomicJobState::new(JobState::Cancelled);
        assert_eq!(
            state.transition(&[JobState::Running, JobState::Paused], JobState::Completed),
            None
        );
        assert_eq!(state.get(), JobState::Cancelled);
    }

    #[test]
    fn test_transition_where_uses_predicate() {
        let state = AtomicJobState::new(JobState::Failed);
        assert_eq!(
            state.transition_where(JobState::can_start, JobState::Running),
            Some(JobState::Failed)
        );
        assert_eq!(state.transition_where(JobState::can_start, JobState::Running), None);
        assert_eq!(state.get(), JobState::Running);
    }

    #[test]
    fn test_only_one_racer_wins() {
        let state = std::sync::Arc::new(AtomicJobState::new(JobState::Running));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = state.clone();
                let target = if i % 2 == 0 {
                    JobState::Completed
                } else {
                    JobState::Cancelled
                };
                std::thread::spawn(move || state.transition(&[JobState::Running], target).is_some())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
