//! Date Windows

use jiff::Timestamp;

use crate::error::PricingError;

/// An inclusive `[start, end]` validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: Timestamp,
    end: Timestamp,
}

impl DateWindow {
    /// Build a window, requiring `start < end`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidWindow`] when `start` is not before `end`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, PricingError> {
        if start >= end {
            return Err(PricingError::InvalidWindow);
        }

        Ok(Self { start, end })
    }

    /// First instant of the window.
    #[must_use]
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    /// Last instant of the window.
    #[must_use]
    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// Whether `now` falls within the window, bounds included.
    #[must_use]
    pub fn contains(&self, now: Timestamp) -> bool {
        self.start <= now && now <= self.end
    }

    /// Whether the window closed before `now`.
    #[must_use]
    pub fn has_ended(&self, now: Timestamp) -> bool {
        now > self.end
    }
}

#[cfg(test)]
mod tests {
    use jiff::ToSpan;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn rejects_inverted_and_empty_windows() -> TestResult {
        let now: Timestamp = "2026-03-01T00:00:00Z".parse()?;

        assert_eq!(DateWindow::new(now, now), Err(PricingError::InvalidWindow));

        assert_eq!(
            DateWindow::new(now, now.checked_sub(1.hour())?),
            Err(PricingError::InvalidWindow)
        );

        Ok(())
    }

    #[test]
    fn bounds_are_inclusive() -> TestResult {
        let start: Timestamp = "2026-03-01T00:00:00Z".parse()?;
        let end: Timestamp = "2026-03-31T23:59:59Z".parse()?;
        let window = DateWindow::new(start, end)?;

        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(end.checked_add(1.second())?));
        assert!(window.has_ended(end.checked_add(1.second())?));

        Ok(())
    }
}
