//! Profile registry: handle-unique identity allocation and owner-gated
//! profile mutation.

use chrono::Utc;
use tracing::info;

use trellis_access::{AccessController, ModuleRegistry};
use trellis_modules::ModuleBank;
use trellis_types::{
    Address, CreateProfileRequest, ModuleAddress, ModuleKind, ProfileId, ProfileRecord,
    RegistryError, WhitelistKind,
};

use crate::module_reverted;
use crate::state::RegistryState;

/// Longest accepted handle, matching the source system's bound.
pub const MAX_HANDLE_LENGTH: usize = 31;

/// Handle charset/length rules. Uniqueness is enforced separately by the
/// lowercased handle index, so it does not depend on these rules.
pub fn validate_handle(handle: &str) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::HandleInvalid {
        handle: handle.to_string(),
        reason: reason.to_string(),
    };

    if handle.is_empty() {
        return Err(invalid("handle is empty"));
    }
    if handle.len() > MAX_HANDLE_LENGTH {
        return Err(invalid("handle exceeds 31 characters"));
    }
    if !handle
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '_'))
    {
        return Err(invalid(
            "handle may only contain lowercase letters, digits, '.', '-', '_'",
        ));
    }
    Ok(())
}

/// Create a profile for a whitelisted creator.
///
/// The profile ID is previewed before the follow module's `initialize` hook
/// runs; the record is inserted (and the sequence advanced) only after the
/// hook approves.
pub fn create_profile(
    state: &mut RegistryState,
    access: &AccessController,
    bank: &ModuleBank,
    request: &CreateProfileRequest,
) -> Result<ProfileId, RegistryError> {
    access.require_whitelisted(&request.to, WhitelistKind::ProfileCreator)?;
    validate_handle(&request.handle)?;
    if state.handle_taken(&request.handle) {
        return Err(RegistryError::HandleTaken(request.handle.clone()));
    }
    ModuleRegistry::require_module_whitelisted(
        access,
        request.follow_module.as_ref(),
        ModuleKind::Follow,
    )?;

    let profile_id = state.next_profile_id();

    if let Some(module_addr) = &request.follow_module {
        let module = bank.require_follow(module_addr)?;
        module
            .initialize(profile_id, &request.follow_module_init_data)
            .map_err(|err| module_reverted(module_addr, err))?;
    }

    state.insert_profile(ProfileRecord {
        id: profile_id,
        owner: request.to.clone(),
        handle: request.handle.clone(),
        image_uri: request.image_uri.clone(),
        follow_module: request.follow_module.clone(),
        follow_nft_uri: request.follow_nft_uri.clone(),
        created_at: Utc::now(),
    });

    info!(profile = %profile_id, owner = %request.to, handle = %request.handle, "profile created");
    Ok(profile_id)
}

/// Swap (or detach) the follow module of an owned profile.
pub fn set_follow_module(
    state: &mut RegistryState,
    access: &AccessController,
    bank: &ModuleBank,
    caller: &Address,
    profile_id: ProfileId,
    module: Option<ModuleAddress>,
    init_data: &[u8],
) -> Result<(), RegistryError> {
    state.require_owner(caller, profile_id)?;
    ModuleRegistry::require_module_whitelisted(access, module.as_ref(), ModuleKind::Follow)?;

    if let Some(module_addr) = &module {
        let follow = bank.require_follow(module_addr)?;
        follow
            .initialize(profile_id, init_data)
            .map_err(|err| module_reverted(module_addr, err))?;
    }

    state.profile_mut(profile_id)?.follow_module = module.clone();
    info!(profile = %profile_id, module = ?module, "follow module set");
    Ok(())
}

/// Replace the image URI of an owned profile.
pub fn set_profile_image_uri(
    state: &mut RegistryState,
    caller: &Address,
    profile_id: ProfileId,
    image_uri: &str,
) -> Result<(), RegistryError> {
    state.require_owner(caller, profile_id)?;
    state.profile_mut(profile_id)?.image_uri = image_uri.to_string();
    Ok(())
}
