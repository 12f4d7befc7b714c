//! Per-section loading/error state
//!
//! Each dashboard section tracks its own request sequence, loading flag,
//! and error text, and keeps its last-good data on screen when a refresh
//! fails. A result from a superseded request is ignored entirely: it
//! neither replaces data nor clears the newer request's spinner.

use crate::error::{Result, StatsError};

/// State of one independently fetched dashboard section
#[derive(Debug, Clone)]
pub struct SectionState<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub loading: bool,
    seq: u64,
}

// Manual impl: `T` need not be Default for an empty section
impl<T> Default for SectionState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
            seq: 0,
        }
    }
}

impl<T> SectionState<T> {
    /// Start a new load; returns the sequence number to tag the request
    pub fn begin_load(&mut self) -> u64 {
        self.seq += 1;
        self.loading = true;
        self.seq
    }

    /// Apply a settled result if it matches the newest issued request.
    /// Returns false for stale results, which are ignored.
    pub fn finish(&mut self, seq: u64, result: Result<T>) -> bool {
        if seq != self.seq {
            return false;
        }
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(error) => {
                // Keep the last-good data; only the message changes
                self.error = Some(error.user_message());
            }
        }
        true
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Chart section: loading/error only, the data lives in the window cache
#[derive(Debug, Clone, Default)]
pub struct ChartStatus {
    pub loading: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_err() -> StatsError {
        StatsError::MalformedResponse("truncated".to_string())
    }

    #[test]
    fn test_stale_result_does_not_clear_loading() {
        let mut section: SectionState<u32> = SectionState::default();
        let first = section.begin_load();
        let second = section.begin_load();

        assert!(!section.finish(first, Ok(1)));
        assert!(section.loading, "older result must not clear the spinner");
        assert_eq!(section.data, None);

        assert!(section.finish(second, Ok(2)));
        assert!(!section.loading);
        assert_eq!(section.data, Some(2));
    }

    #[test]
    fn test_failure_keeps_last_good_data() {
        let mut section: SectionState<u32> = SectionState::default();
        let seq = section.begin_load();
        section.finish(seq, Ok(42));

        let seq = section.begin_load();
        section.finish(seq, Err(fetch_err()));

        assert_eq!(section.data, Some(42));
        assert!(section.has_error());
        assert!(!section.loading);
    }

    #[test]
    fn test_success_clears_previous_error() {
        let mut section: SectionState<u32> = SectionState::default();
        let seq = section.begin_load();
        section.finish(seq, Err(fetch_err()));
        assert!(section.has_error());

        let seq = section.begin_load();
        section.finish(seq, Ok(7));
        assert!(!section.has_error());
        assert_eq!(section.data, Some(7));
    }
}
