//! Failure kinds surfaced to the user when a projection cannot be produced.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("No price history on or after {start}")]
    NoHistoryForRange { start: NaiveDate },

    #[error("Computation failed: {0}")]
    Computation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SimulationError {
    /// Message shown at the presentation boundary, with a corrective hint
    /// where one exists.
    pub fn user_message(&self) -> String {
        match self {
            SimulationError::DataUnavailable(_) => {
                "Could not download market data. Check your connection and try again.".to_string()
            }
            SimulationError::NoHistoryForRange { start } => format!(
                "The selected start date ({start}) has no price history. Choose an earlier date."
            ),
            SimulationError::Computation(_) => {
                "Something went wrong while computing the projection.".to_string()
            }
            SimulationError::InvalidInput(reason) => reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_history_message_suggests_earlier_date() {
        let err = SimulationError::NoHistoryForRange {
            start: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
        };
        let msg = err.user_message();
        assert!(msg.contains("2099-01-01"));
        assert!(msg.contains("earlier date"));
    }

    #[test]
    fn data_unavailable_hides_transport_detail() {
        let err = SimulationError::DataUnavailable("connection refused".to_string());
        assert!(!err.user_message().contains("connection refused"));
        assert!(err.to_string().contains("connection refused"));
    }
}
