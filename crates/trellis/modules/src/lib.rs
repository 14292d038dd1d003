//! Module capability contracts for the trellis registry.
//!
//! A module is an externally supplied policy consulted by the registry to
//! approve or reject an operation. Each of the three kinds (follow, collect,
//! reference) is a closed trait with a small fixed method set - policies are
//! selected by installed address at attachment time, never through open-ended
//! dispatch.
//!
//! Hooks receive only plain data (IDs, addresses, opaque byte payloads) and
//! return a decision. They hold no handle to the registry, so a hook cannot
//! re-enter or mutate registry state while an operation is mid-flight.

#![deny(unsafe_code)]

pub mod bank;
pub mod builtin;
pub mod traits;

pub use bank::ModuleBank;
pub use builtin::{
    AllowlistFollowModule, DenyFollowModule, DenyReferenceModule, OpenCollectModule,
    OpenFollowModule, OpenReferenceModule, ToggleCollectModule,
};
pub use traits::{CollectModule, FollowModule, ModuleError, ReferenceModule};
