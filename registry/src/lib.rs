//! The identity registry.
//!
//! One [`Identity`] per address, created implicitly on first read. Only the
//! holder of [`Role::RegistryWriter`](knomee_types::Role::RegistryWriter) (the
//! consensus engine) may change a record.

pub mod error;
pub mod identity;
pub mod registry;

pub use error::RegistryError;
pub use identity::{Identity, MAX_LINKED_ACCOUNTS, MAX_PLATFORM_LEN};
pub use registry::IdentityRegistry;
