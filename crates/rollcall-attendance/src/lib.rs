//! Rollcall Attendance — session token issuance and resolution, and
//! at-most-once attendance claim arbitration.

pub mod config;
pub mod error;
pub mod ledger;
pub mod payload;
pub mod registry;
pub mod token;

pub use config::AttendanceConfig;
pub use error::AttendanceError;
pub use ledger::{AttendanceLedger, ClaimReceipt, PresenterSummary};
pub use registry::SessionRegistry;
