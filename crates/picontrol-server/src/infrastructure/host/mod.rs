//! [`HostOps`](crate::application::host::HostOps) implementations.
//!
//! `system` is used by the binary; `mock` backs the tests.

pub mod mock;
pub mod system;

pub use mock::MockHost;
pub use system::SystemHost;
