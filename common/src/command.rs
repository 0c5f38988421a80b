use crate::error_inject::ErrorMode;
use crate::models::InjectionState;

/// Why an operator command was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Invalid command: '{0}'. Use n, c, r, or u")]
    UnknownMode(char),
    #[error("Invalid percentage: {0:.0}%. Must be between 0% and 100%")]
    PercentOutOfRange(f64),
    #[error("Invalid percentage: {0}. Must be between 0.0 and 1.0")]
    FractionOutOfRange(f64),
    #[error("Invalid count: {0}. Must be >= 0")]
    NegativeCount(i64),
    #[error("Invalid value: '{0}'. Must be an integer, decimal, percentage (30%), or * (100%)")]
    InvalidValue(String),
}

/// Parse an operator command such as `c`, `c 4`, `r 30%`, `u 0.5` or `c *`.
///
/// All whitespace is ignored. The first letter picks the mode and the rest,
/// if any, is the quantity: a count, a `%` percentage, a decimal fraction, or
/// `*` for every request. No quantity means a single error.
pub fn parse_command(command: &str) -> Result<InjectionState, CommandError> {
    let compact: String = command.chars().filter(|c| !c.is_whitespace()).collect();
    let mut chars = compact.chars();
    let letter = chars
        .next()
        .ok_or(CommandError::Empty)?
        .to_ascii_lowercase();

    let mode = match letter {
        'n' => ErrorMode::NoError,
        'c' => ErrorMode::ContextLength,
        'r' => ErrorMode::RateLimit,
        'u' => ErrorMode::ServerError,
        other => return Err(CommandError::UnknownMode(other)),
    };

    let value = chars.as_str();
    let (count, percentage) = parse_quantity(value)?;
    Ok(InjectionState::new(mode, count, percentage))
}

fn parse_quantity(value: &str) -> Result<(u64, f64), CommandError> {
    let invalid = || CommandError::InvalidValue(value.to_string());

    if value.is_empty() {
        return Ok((1, 0.0));
    }
    if value == "*" {
        return Ok((0, 1.0));
    }
    if let Some(number) = value.strip_suffix('%') {
        let percentage = number.parse::<f64>().map_err(|_| invalid())? / 100.0;
        if !(0.0..=1.0).contains(&percentage) {
            return Err(CommandError::PercentOutOfRange(percentage * 100.0));
        }
        return Ok((0, percentage));
    }
    if value.contains('.') {
        let percentage = value.parse::<f64>().map_err(|_| invalid())?;
        if !(0.0..=1.0).contains(&percentage) {
            return Err(CommandError::FractionOutOfRange(percentage));
        }
        return Ok((0, percentage));
    }

    let count = value.parse::<i64>().map_err(|_| invalid())?;
    if count < 0 {
        return Err(CommandError::NegativeCount(count));
    }
    Ok((count as u64, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(cmd: &str) -> (ErrorMode, u64, f64) {
        let s = parse_command(cmd).unwrap();
        (s.mode, s.remaining, s.percentage)
    }

    #[test]
    fn bare_letter_is_single_shot() {
        assert_eq!(parsed("c"), (ErrorMode::ContextLength, 1, 0.0));
        assert_eq!(parsed("r"), (ErrorMode::RateLimit, 1, 0.0));
        assert_eq!(parsed("u"), (ErrorMode::ServerError, 1, 0.0));
    }

    #[test]
    fn count() {
        assert_eq!(parsed("c 4"), (ErrorMode::ContextLength, 4, 0.0));
        assert_eq!(parsed("  r   12 "), (ErrorMode::RateLimit, 12, 0.0));
    }

    #[test]
    fn decimal_and_percent_are_the_same() {
        assert_eq!(parsed("c 0.3"), (ErrorMode::ContextLength, 0, 0.3));
        assert_eq!(parsed("c 30%"), (ErrorMode::ContextLength, 0, 0.3));
        assert_eq!(parsed("c 3 0 %"), (ErrorMode::ContextLength, 0, 0.3));
    }

    #[test]
    fn star_is_every_request() {
        assert_eq!(parsed("c *"), (ErrorMode::ContextLength, 0, 1.0));
        assert_eq!(parsed("u*"), (ErrorMode::ServerError, 0, 1.0));
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(parsed("r 100%"), (ErrorMode::RateLimit, 0, 1.0));
        assert_eq!(parsed("r 1.0"), (ErrorMode::RateLimit, 0, 1.0));
    }

    #[test]
    fn uppercase_letter_accepted() {
        assert_eq!(parsed("C 2"), (ErrorMode::ContextLength, 2, 0.0));
    }

    #[test]
    fn no_error_clears_quantity() {
        assert_eq!(parsed("n"), (ErrorMode::NoError, 0, 0.0));
        assert_eq!(parsed("n 5"), (ErrorMode::NoError, 0, 0.0));
    }

    #[test]
    fn zero_quantity_means_no_error() {
        assert_eq!(parsed("c 0"), (ErrorMode::NoError, 0, 0.0));
        assert_eq!(parsed("c 0%"), (ErrorMode::NoError, 0, 0.0));
    }

    #[test]
    fn unknown_letter_rejected() {
        let err = parse_command("x").unwrap_err();
        assert_eq!(err, CommandError::UnknownMode('x'));
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn negative_count_rejected() {
        assert_eq!(parse_command("c -1"), Err(CommandError::NegativeCount(-1)));
    }

    #[test]
    fn out_of_range_percentage_rejected() {
        let err = parse_command("r 150%").unwrap_err();
        assert_eq!(err, CommandError::PercentOutOfRange(150.0));
        assert!(err.to_string().contains("150%"));
        assert!(matches!(
            parse_command("r 1.5"),
            Err(CommandError::FractionOutOfRange(_))
        ));
        assert!(matches!(
            parse_command("r -5%"),
            Err(CommandError::PercentOutOfRange(_))
        ));
    }

    #[test]
    fn garbage_quantity_rejected() {
        assert_eq!(
            parse_command("c abc"),
            Err(CommandError::InvalidValue("abc".to_string()))
        );
        assert!(matches!(
            parse_command("c nan%"),
            Err(CommandError::PercentOutOfRange(_))
        ));
    }

    #[test]
    fn empty_rejected() {
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
    }
}
