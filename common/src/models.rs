use crate::error_inject::ErrorMode;

/// The process-wide error injection settings.
///
/// At most one of `remaining` and `percentage` is positive. `NoError` has both at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InjectionState {
    pub mode: ErrorMode,
    /// Errors left to inject in count mode.
    pub remaining: u64,
    /// Per-request probability in `[0, 1]` in percentage mode.
    pub percentage: f64,
}

impl InjectionState {
    /// Build a state, normalising the quantity fields.
    ///
    /// A positive percentage wins over a count, and an active mode with
    /// nothing left to inject collapses to `NoError`.
    pub fn new(mode: ErrorMode, count: u64, percentage: f64) -> Self {
        let percentage = if percentage > 0.0 { percentage.min(1.0) } else { 0.0 };
        let remaining = if percentage > 0.0 { 0 } else { count };
        if mode == ErrorMode::NoError || (remaining == 0 && percentage == 0.0) {
            return Self::default();
        }
        Self {
            mode,
            remaining,
            percentage,
        }
    }

    /// One-line summary, e.g. `Rate Limit (30%)` or `Context Length (3 remaining)`.
    pub fn status_line(&self) -> String {
        match self.quantity() {
            Some(q) => format!("{} ({})", self.mode.title(), q),
            None => self.mode.title().to_string(),
        }
    }

    /// Describe how much injection is left, if any.
    pub fn quantity(&self) -> Option<String> {
        if self.mode == ErrorMode::NoError {
            None
        } else if self.percentage > 0.0 {
            Some(format!("{:.0}%", self.percentage * 100.0))
        } else if self.remaining > 0 {
            Some(format!("{} remaining", self.remaining))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_error_zeroes_everything() {
        let s = InjectionState::new(ErrorMode::NoError, 5, 0.5);
        assert_eq!(s, InjectionState::default());
    }

    #[test]
    fn percentage_clears_count() {
        let s = InjectionState::new(ErrorMode::RateLimit, 3, 0.3);
        assert_eq!(s.remaining, 0);
        assert_eq!(s.percentage, 0.3);
        assert_eq!(s.quantity().as_deref(), Some("30%"));
    }

    #[test]
    fn empty_quantity_collapses_to_no_error() {
        let s = InjectionState::new(ErrorMode::ContextLength, 0, 0.0);
        assert_eq!(s.mode, ErrorMode::NoError);
    }

    #[test]
    fn status_lines() {
        assert_eq!(InjectionState::default().status_line(), "No Error");
        assert_eq!(
            InjectionState::new(ErrorMode::ContextLength, 3, 0.0).status_line(),
            "Context Length (3 remaining)"
        );
        assert_eq!(
            InjectionState::new(ErrorMode::RateLimit, 0, 0.3).status_line(),
            "Rate Limit (30%)"
        );
    }
}
