//! Capability contracts for platform services.
//!
//! Shared code talks to auth, storage, payments and ads only through these
//! traits. Each platform supplies its own adapter; the file-backed and
//! in-memory storage adapters live in [`crate::local_storage`] and
//! [`crate::memory_storage`].

pub mod ads;
pub mod auth;
pub mod payment;
pub mod storage;

pub use ads::{AdConfig, AdProvider};
pub use auth::{AuthBroadcast, AuthProvider, User};
pub use payment::{PaidPlan, PaymentProvider};
pub use storage::{ActiveWorkoutUpdate, StorageProvider};
