//! Follow engine: batched follow-token minting with all-or-nothing
//! semantics.
//!
//! A batch is two-phase. Phase one validates every element and runs every
//! attached follow module's `process_follow` hook, in caller-supplied order,
//! without touching the state container. Phase two mints one token per
//! element. Any phase-one failure returns before a single mint, so a later
//! element's rejection voids the whole call including elements already
//! approved.
//!
//! Whitelisting is an attachment-time check only: a module that was
//! de-whitelisted after being attached still governs its profile here.

use chrono::Utc;
use tracing::debug;

use trellis_modules::ModuleBank;
use trellis_types::{Address, FollowTokenId, FollowTokenRecord, ProfileId, RegistryError};

use crate::module_reverted;
use crate::state::RegistryState;

/// Follow each profile in `profile_ids`, handing the paired entry of
/// `datas` to the target's follow module. Returns the minted token IDs in
/// input order.
pub fn follow(
    state: &mut RegistryState,
    bank: &ModuleBank,
    follower: &Address,
    profile_ids: &[ProfileId],
    datas: &[Vec<u8>],
) -> Result<Vec<FollowTokenId>, RegistryError> {
    if profile_ids.len() != datas.len() {
        return Err(RegistryError::ArrayLengthMismatch {
            profiles: profile_ids.len(),
            datas: datas.len(),
        });
    }

    for (profile_id, data) in profile_ids.iter().zip(datas) {
        let profile = state.require_profile(*profile_id)?;
        if let Some(module_addr) = &profile.follow_module {
            let module = bank.require_follow(module_addr)?;
            module
                .process_follow(follower, *profile_id, data)
                .map_err(|err| module_reverted(module_addr, err))?;
        }
    }

    let minted_at = Utc::now();
    let mut token_ids = Vec::with_capacity(profile_ids.len());
    for profile_id in profile_ids {
        let token_id = state.next_follow_token_id(*profile_id);
        state.push_follow_token(FollowTokenRecord {
            token_id,
            profile_id: *profile_id,
            owner: follower.clone(),
            minted_at,
        });
        token_ids.push(token_id);
    }

    debug!(follower = %follower, count = token_ids.len(), "follow batch minted");
    Ok(token_ids)
}
