use common::error_inject::ErrorMode;
use common::models::InjectionState;
use rand::Rng;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The process-wide error injection state machine.
///
/// All access goes through one lock so that deciding, consuming a count and
/// reading the mode used for the error body happen as a single step.
#[derive(Debug, Default)]
pub struct ErrorInjector {
    state: Mutex<InjectionState>,
}

impl ErrorInjector {
    pub fn new(initial: InjectionState) -> Self {
        Self {
            state: Mutex::new(initial),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InjectionState> {
        // The state is plain data that is always left consistent, so a
        // panicked holder does not invalidate it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole state.
    pub fn set_mode(&self, state: InjectionState) {
        *self.lock() = state;
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> InjectionState {
        *self.lock()
    }

    /// Decide whether this request gets an error, consuming one count-mode unit if so.
    ///
    /// Returns the mode to emulate, captured before any reset to `NoError`.
    pub fn decide_and_consume(&self) -> Option<ErrorMode> {
        self.decide_with(|| rand::thread_rng().gen::<f64>())
    }

    /// Same as [`decide_and_consume`](Self::decide_and_consume) with a caller-supplied
    /// source of uniform samples in `[0, 1)`. `roll` is only called in percentage mode.
    pub fn decide_with(&self, roll: impl FnOnce() -> f64) -> Option<ErrorMode> {
        let mut state = self.lock();
        let mode = state.mode;

        if mode == ErrorMode::NoError {
            return None;
        }
        if state.percentage > 0.0 {
            return (roll() < state.percentage).then_some(mode);
        }
        if state.remaining > 0 {
            state.remaining -= 1;
            if state.remaining == 0 {
                *state = InjectionState::default();
            }
            return Some(mode);
        }

        *state = InjectionState::default();
        None
    }
}
