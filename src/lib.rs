pub mod capability;
pub mod config;
pub mod error_codes;
pub mod errors;
pub mod fs_writer;
pub mod input_validation;
pub mod logging;
pub mod path_validation;
pub mod remote;
pub mod session;
pub mod sync_engine;


pub use capability::{probe_host, HostCapability};
pub use config::AppConfig;
pub use errors::{RemoteError, Result, SyncError, WriteError};
pub use logging::LogManager;
pub use remote::{AuthSession, HttpRemoteStore, RemoteStore};
pub use session::SyncSession;
pub use sync_engine::{SyncOutcome, SyncPlan};

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
