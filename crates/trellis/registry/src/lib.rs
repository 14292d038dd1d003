//! Registry core for trellis.
//!
//! Holds the single state container (`RegistryState`) and the three engines
//! that mutate it:
//!
//! - **profiles** - profile creation and owner-gated profile mutation
//! - **follow** - batched, all-or-nothing follow-token minting
//! - **publishing** - post/comment/mirror publication creation
//!
//! Engines are plain functions over `(&mut RegistryState, &AccessController,
//! &ModuleBank)`; they own no state of their own. Every operation follows
//! validate -> preview IDs -> invoke module hooks -> commit, and nothing is
//! written to the container before the commit step, so a failure at any
//! point leaves zero observable state change.

#![deny(unsafe_code)]

pub mod follow;
pub mod profiles;
pub mod publishing;
pub mod state;

pub use state::RegistryState;

use trellis_modules::ModuleError;
use trellis_types::{ModuleAddress, RegistryError};

/// Map a hook failure onto the registry taxonomy, passing the module's
/// reason through unchanged.
pub(crate) fn module_reverted(address: &ModuleAddress, err: ModuleError) -> RegistryError {
    RegistryError::ModuleReverted {
        address: address.clone(),
        reason: err.to_string(),
    }
}
