//! The per-row result recorded back into the source table.

use chrono::{DateTime, Utc};

use crate::error::RowError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// What happened to one attempted row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Synced {
        product_id: String,
        synced_at: DateTime<Utc>,
    },
    Failed(RowError),
}

impl RowOutcome {
    #[must_use]
    pub fn synced_now(product_id: String) -> Self {
        RowOutcome::Synced {
            product_id,
            synced_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, RowOutcome::Synced { .. })
    }

    #[must_use]
    pub fn error(&self) -> Option<&RowError> {
        match self {
            RowOutcome::Failed(err) => Some(err),
            RowOutcome::Synced { .. } => None,
        }
    }

    /// The text written into the row's outcome cell.
    #[must_use]
    pub fn cell_text(&self) -> String {
        match self {
            RowOutcome::Synced {
                product_id,
                synced_at,
            } => format!(
                "SUCCESS: {} | ID: {product_id}",
                synced_at.format(TIMESTAMP_FORMAT)
            ),
            RowOutcome::Failed(err) => format!("ERROR: {err}"),
        }
    }
}

impl From<RowError> for RowOutcome {
    fn from(err: RowError) -> Self {
        RowOutcome::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn success_text_has_timestamp_and_id() {
        let outcome = RowOutcome::Synced {
            product_id: "632910392".into(),
            synced_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
        };
        assert_eq!(
            outcome.cell_text(),
            "SUCCESS: 2024-03-09 14:05:07 UTC | ID: 632910392"
        );
        assert!(outcome.is_success());
    }

    #[test]
    fn error_text_carries_row_error() {
        let outcome = RowOutcome::from(RowError::Remote {
            status: 422,
            body: r#"{"errors":{"title":["can't be blank"]}}"#.into(),
        });
        assert_eq!(
            outcome.cell_text(),
            r#"ERROR: API Error (422): {"errors":{"title":["can't be blank"]}}"#
        );
        assert!(!outcome.is_success());
    }

    #[test]
    fn validation_text_ends_with_missing_required_fields() {
        let text = RowOutcome::from(RowError::Validation).cell_text();
        assert!(text.starts_with("ERROR: "));
        assert!(text.ends_with("missing required fields"));
    }
}
