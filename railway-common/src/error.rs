//! Error types for the railway-tiles toolkit
//!
//! Tag access and classification are total, so the only failures are bad
//! configuration, passes invoked out of order, and geometry a tile group
//! cannot merge.

use thiserror::Error;

/// Main error type for railway-tiles operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A pipeline pass was invoked before the passes it depends on finished
    #[error("Pipeline stage out of order: {operation} requires {expected}, pipeline is at {found}")]
    StageOrder {
        operation: &'static str,
        expected: String,
        found: String,
    },

    /// Geometry inside one tile group could not be merged
    #[error("Degenerate geometry in {group}: {reason}")]
    DegenerateGeometry { group: String, reason: String },
}

impl Error {
    /// True for failures scoped to a single tile group
    pub fn is_group_local(&self) -> bool {
        matches!(self, Error::DegenerateGeometry { .. })
    }
}

/// Result type alias for railway-tiles operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::InvalidConfig("tolerance must be finite".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: tolerance must be finite"
        );

        let err = Error::StageOrder {
            operation: "merge pass",
            expected: "feature pass".to_string(),
            found: "init".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Pipeline stage out of order: merge pass requires feature pass, pipeline is at init"
        );
    }

    #[test]
    fn test_group_local() {
        let err = Error::DegenerateGeometry {
            group: "rail/z12/2176/1420".to_string(),
            reason: "non-finite coordinate".to_string(),
        };
        assert!(err.is_group_local());
        assert!(!Error::InvalidConfig(String::new()).is_group_local());
    }
}
