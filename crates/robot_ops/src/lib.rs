//! Robot and plugin operations on top of the signed RPC client.
//!
//! Shapes per-method arguments, interprets the platform's response
//! envelope, and keeps the exchange catalog used to pick default pairs.

pub mod catalog;
pub mod credentials;
pub mod envelope;
pub mod operations;
pub mod scripts;

#[cfg(test)]
mod testing;

pub use catalog::ExchangeCatalog;
pub use credentials::{CredentialStore, InMemoryCredentials};
pub use envelope::extract_result;
pub use operations::{app_id_for, dashboard_status, HubPlatform, RobotOps};
pub use scripts::{pair_from_symbol, HubAction};
