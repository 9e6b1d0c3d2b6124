//! Error code constants
//!
//! Front ends map these codes to localized messages instead of parsing
//! error strings.

/// Remote listing could not be fetched, no plan was produced
pub const ERR_REMOTE_LIST_FAILED: &str = "ERR_REMOTE_LIST_FAILED";

/// Folder selection was empty, missing or unreadable
pub const ERR_INVALID_SELECTION: &str = "ERR_INVALID_SELECTION";

/// Execution requested before a plan exists
pub const ERR_NO_PLAN: &str = "ERR_NO_PLAN";

/// A single manual download could not be completed
pub const ERR_FETCH_FAILED: &str = "ERR_FETCH_FAILED";

/// Configuration file or overrides were rejected
pub const ERR_CONFIG_INVALID: &str = "ERR_CONFIG_INVALID";

/// Local I/O failed outside of per-file handling
pub const ERR_IO: &str = "ERR_IO";
