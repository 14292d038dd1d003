//! Publishing engine: post, comment, and mirror creation.
//!
//! Publication IDs are previewed per authoring profile; collect/reference
//! module init hooks (and, for comments and mirrors, the target's
//! `process_reference` authorization) all run before the record is stored.
//! A failing hook aborts the call and the previewed ID is not consumed -
//! retrying after a failure yields the same ID again.

use chrono::Utc;
use tracing::info;

use trellis_access::{AccessController, ModuleRegistry};
use trellis_modules::ModuleBank;
use trellis_types::{
    Address, CommentRequest, MirrorRequest, ModuleAddress, ModuleKind, PostRequest, ProfileId,
    PubId, PubPointer, PublicationKind, PublicationRecord, RegistryError,
};

use crate::module_reverted;
use crate::state::RegistryState;

/// Create a standalone post on an owned profile.
pub fn post(
    state: &mut RegistryState,
    access: &AccessController,
    bank: &ModuleBank,
    caller: &Address,
    request: &PostRequest,
) -> Result<PubId, RegistryError> {
    state.require_owner(caller, request.profile_id)?;
    validate_pub_modules(
        access,
        request.collect_module.as_ref(),
        request.reference_module.as_ref(),
    )?;

    let pub_id = state.next_pub_id(request.profile_id);

    init_pub_modules(
        bank,
        request.profile_id,
        pub_id,
        request.collect_module.as_ref(),
        &request.collect_module_init_data,
        request.reference_module.as_ref(),
        &request.reference_module_init_data,
    )?;

    state.push_publication(PublicationRecord {
        profile_id: request.profile_id,
        pub_id,
        kind: PublicationKind::Post,
        content_uri: Some(request.content_uri.clone()),
        collect_module: request.collect_module.clone(),
        reference_module: request.reference_module.clone(),
        published_at: Utc::now(),
    });

    info!(profile = %request.profile_id, pub_id = %pub_id, "post created");
    Ok(pub_id)
}

/// Create a comment pointing at an existing publication. The target's
/// reference module (if attached) must approve the cross-reference.
pub fn comment(
    state: &mut RegistryState,
    access: &AccessController,
    bank: &ModuleBank,
    caller: &Address,
    request: &CommentRequest,
) -> Result<PubId, RegistryError> {
    state.require_owner(caller, request.profile_id)?;
    validate_pub_modules(
        access,
        request.collect_module.as_ref(),
        request.reference_module.as_ref(),
    )?;

    let pub_id = state.next_pub_id(request.profile_id);
    let source = PubPointer {
        profile_id: request.profile_id,
        pub_id,
    };

    authorize_reference(state, bank, source, request.target, &request.reference_data)?;
    init_pub_modules(
        bank,
        request.profile_id,
        pub_id,
        request.collect_module.as_ref(),
        &request.collect_module_init_data,
        request.reference_module.as_ref(),
        &request.reference_module_init_data,
    )?;

    state.push_publication(PublicationRecord {
        profile_id: request.profile_id,
        pub_id,
        kind: PublicationKind::Comment {
            target: request.target,
        },
        content_uri: Some(request.content_uri.clone()),
        collect_module: request.collect_module.clone(),
        reference_module: request.reference_module.clone(),
        published_at: Utc::now(),
    });

    info!(profile = %request.profile_id, pub_id = %pub_id, target = %request.target, "comment created");
    Ok(pub_id)
}

/// Create a contentless mirror of an existing publication.
pub fn mirror(
    state: &mut RegistryState,
    access: &AccessController,
    bank: &ModuleBank,
    caller: &Address,
    request: &MirrorRequest,
) -> Result<PubId, RegistryError> {
    state.require_owner(caller, request.profile_id)?;
    ModuleRegistry::require_module_whitelisted(
        access,
        request.reference_module.as_ref(),
        ModuleKind::Reference,
    )?;

    let pub_id = state.next_pub_id(request.profile_id);
    let source = PubPointer {
        profile_id: request.profile_id,
        pub_id,
    };

    authorize_reference(state, bank, source, request.target, &request.reference_data)?;
    if let Some(module_addr) = &request.reference_module {
        let module = bank.require_reference(module_addr)?;
        module
            .initialize(request.profile_id, pub_id, &request.reference_module_init_data)
            .map_err(|err| module_reverted(module_addr, err))?;
    }

    state.push_publication(PublicationRecord {
        profile_id: request.profile_id,
        pub_id,
        kind: PublicationKind::Mirror {
            target: request.target,
        },
        content_uri: None,
        collect_module: None,
        reference_module: request.reference_module.clone(),
        published_at: Utc::now(),
    });

    info!(profile = %request.profile_id, pub_id = %pub_id, target = %request.target, "mirror created");
    Ok(pub_id)
}

fn validate_pub_modules(
    access: &AccessController,
    collect: Option<&ModuleAddress>,
    reference: Option<&ModuleAddress>,
) -> Result<(), RegistryError> {
    ModuleRegistry::require_module_whitelisted(access, collect, ModuleKind::Collect)?;
    ModuleRegistry::require_module_whitelisted(access, reference, ModuleKind::Reference)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn init_pub_modules(
    bank: &ModuleBank,
    profile_id: ProfileId,
    pub_id: PubId,
    collect: Option<&ModuleAddress>,
    collect_data: &[u8],
    reference: Option<&ModuleAddress>,
    reference_data: &[u8],
) -> Result<(), RegistryError> {
    if let Some(module_addr) = collect {
        let module = bank.require_collect(module_addr)?;
        module
            .initialize(profile_id, pub_id, collect_data)
            .map_err(|err| module_reverted(module_addr, err))?;
    }
    if let Some(module_addr) = reference {
        let module = bank.require_reference(module_addr)?;
        module
            .initialize(profile_id, pub_id, reference_data)
            .map_err(|err| module_reverted(module_addr, err))?;
    }
    Ok(())
}

/// Resolve the target publication and, if it carries a reference module,
/// ask it to authorize the cross-reference.
fn authorize_reference(
    state: &RegistryState,
    bank: &ModuleBank,
    source: PubPointer,
    target: PubPointer,
    data: &[u8],
) -> Result<(), RegistryError> {
    let target_pub = state.require_publication(target)?;
    if let Some(module_addr) = &target_pub.reference_module {
        let module = bank.require_reference(module_addr)?;
        module
            .process_reference(source, target.profile_id, target.pub_id, data)
            .map_err(|err| module_reverted(module_addr, err))?;
    }
    Ok(())
}
