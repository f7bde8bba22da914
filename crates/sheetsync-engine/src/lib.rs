//! Sheet-to-catalog sync: field mapping, validation, watermark tracking and
//! the pass loop tying them together.

pub mod error;
mod lease;
pub mod mapper;
pub mod outcome;
pub mod pass;
pub mod preview;
pub mod tracker;
pub mod validate;

pub use error::{PassError, RowError, RowErrorKind};
pub use lease::PassLease;
pub use mapper::{map_row, resolve_header, CanonicalField};
pub use outcome::RowOutcome;
pub use pass::{
    first_pending_row, initialize_tracking, pending_rows, reset_tracking, run_pass, sync_once,
    sync_with_lease, PassOptions, PassReport, RowReport,
};
pub use preview::{preview_pass, PreviewRow};
pub use tracker::{advance_state, SyncTracker};
pub use validate::validate_product;
