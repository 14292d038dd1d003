//! Hub - the composition root and single entry point of the trellis
//! registry.
//!
//! The hub owns all mutable registry state (identity records, whitelists,
//! installed modules, the operation log) behind one `RwLock`. Every public
//! operation takes the write guard for its full duration, so top-level
//! operations are serializable one-at-a-time units: an operation either
//! fully commits or aborts with zero side effects, and no operation can
//! observe another's in-progress state.
//!
//! Module hooks run while the guard is held but receive only plain data;
//! they cannot reach back into the hub, so reentrant mutation from inside a
//! hook is unrepresentable.
//!
//! ## Core components
//!
//! - [`trellis_access::AccessController`] - whitelist authority
//! - [`trellis_modules::ModuleBank`] - installed policy modules
//! - [`trellis_registry::RegistryState`] - identity, follow, publication state

#![deny(unsafe_code)]

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::info;

use trellis_access::AccessController;
use trellis_modules::{CollectModule, FollowModule, ModuleBank, ReferenceModule};
use trellis_registry::{follow as follow_engine, profiles, publishing, RegistryState};
use trellis_types::{
    Address, CommentRequest, CreateProfileRequest, FollowTokenId, FollowTokenRecord,
    MirrorRequest, ModuleAddress, PostRequest, ProfileId, ProfileRecord, PubId, PubPointer,
    PublicationRecord, RegistryError, RegistryEvent, WhitelistKind,
};

struct HubInner {
    governance: Address,
    state: RegistryState,
    access: AccessController,
    bank: ModuleBank,
    /// Append-only operation log; entries are written only at commit.
    events: Vec<RegistryEvent>,
}

impl HubInner {
    fn require_governance(&self, caller: &Address) -> Result<(), RegistryError> {
        if &self.governance == caller {
            Ok(())
        } else {
            Err(RegistryError::NotGovernance(caller.clone()))
        }
    }
}

/// The registry hub.
pub struct Hub {
    inner: RwLock<HubInner>,
}

impl Hub {
    /// Construct an empty hub with `governance` as the privileged account.
    pub fn new(governance: Address) -> Self {
        Self {
            inner: RwLock::new(HubInner {
                governance,
                state: RegistryState::new(),
                access: AccessController::new(),
                bank: ModuleBank::new(),
                events: Vec::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HubInner>, RegistryError> {
        self.inner.read().map_err(|_| RegistryError::Internal)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HubInner>, RegistryError> {
        self.inner.write().map_err(|_| RegistryError::Internal)
    }

    // ── governance ──────────────────────────────────────────────────

    pub fn governance(&self) -> Result<Address, RegistryError> {
        Ok(self.read()?.governance.clone())
    }

    /// Hand the privileged role to another account.
    pub fn set_governance(
        &self,
        caller: &Address,
        new_governance: Address,
    ) -> Result<(), RegistryError> {
        let mut inner = self.write()?;
        inner.require_governance(caller)?;

        let from = std::mem::replace(&mut inner.governance, new_governance.clone());
        info!(from = %from, to = %new_governance, "governance transferred");
        inner.events.push(RegistryEvent::GovernanceTransferred {
            from,
            to: new_governance,
            at: Utc::now(),
        });
        Ok(())
    }

    // ── whitelists ──────────────────────────────────────────────────

    pub fn whitelist_profile_creator(
        &self,
        caller: &Address,
        address: &Address,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        self.set_whitelist(caller, address, WhitelistKind::ProfileCreator, enabled)
    }

    pub fn whitelist_follow_module(
        &self,
        caller: &Address,
        address: &Address,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        self.set_whitelist(caller, address, WhitelistKind::FollowModule, enabled)
    }

    pub fn whitelist_collect_module(
        &self,
        caller: &Address,
        address: &Address,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        self.set_whitelist(caller, address, WhitelistKind::CollectModule, enabled)
    }

    pub fn whitelist_reference_module(
        &self,
        caller: &Address,
        address: &Address,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        self.set_whitelist(caller, address, WhitelistKind::ReferenceModule, enabled)
    }

    fn set_whitelist(
        &self,
        caller: &Address,
        address: &Address,
        kind: WhitelistKind,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        let mut inner = self.write()?;
        inner.require_governance(caller)?;

        // Idempotent: an unchanged entry commits nothing and logs nothing.
        if inner.access.set_whitelisted(address, kind, enabled) {
            inner.events.push(RegistryEvent::WhitelistUpdated {
                address: address.clone(),
                kind,
                enabled,
                at: Utc::now(),
            });
        }
        Ok(())
    }

    pub fn is_whitelisted(
        &self,
        address: &Address,
        kind: WhitelistKind,
    ) -> Result<bool, RegistryError> {
        Ok(self.read()?.access.is_whitelisted(address, kind))
    }

    // ── module installation ─────────────────────────────────────────

    /// Install a follow module implementation at an address. Open to
    /// anyone, like contract deployment; grants nothing until the address
    /// is also whitelisted.
    pub fn install_follow_module(
        &self,
        address: ModuleAddress,
        module: Arc<dyn FollowModule>,
    ) -> Result<(), RegistryError> {
        self.write()?.bank.install_follow(address, module);
        Ok(())
    }

    pub fn install_collect_module(
        &self,
        address: ModuleAddress,
        module: Arc<dyn CollectModule>,
    ) -> Result<(), RegistryError> {
        self.write()?.bank.install_collect(address, module);
        Ok(())
    }

    pub fn install_reference_module(
        &self,
        address: ModuleAddress,
        module: Arc<dyn ReferenceModule>,
    ) -> Result<(), RegistryError> {
        self.write()?.bank.install_reference(address, module);
        Ok(())
    }

    // ── profiles ────────────────────────────────────────────────────

    /// Create a profile. `request.to` must be whitelisted as a profile
    /// creator and becomes the initial owner.
    pub fn create_profile(
        &self,
        request: &CreateProfileRequest,
    ) -> Result<ProfileId, RegistryError> {
        let mut inner = self.write()?;
        let inner = &mut *inner;

        let profile_id =
            profiles::create_profile(&mut inner.state, &inner.access, &inner.bank, request)?;
        inner.events.push(RegistryEvent::ProfileCreated {
            profile_id,
            owner: request.to.clone(),
            handle: request.handle.clone(),
            at: Utc::now(),
        });
        Ok(profile_id)
    }

    /// Swap or detach the follow module of a profile owned by `caller`.
    pub fn set_follow_module(
        &self,
        caller: &Address,
        profile_id: ProfileId,
        module: Option<ModuleAddress>,
        init_data: &[u8],
    ) -> Result<(), RegistryError> {
        let mut inner = self.write()?;
        let inner = &mut *inner;

        profiles::set_follow_module(
            &mut inner.state,
            &inner.access,
            &inner.bank,
            caller,
            profile_id,
            module.clone(),
            init_data,
        )?;
        inner.events.push(RegistryEvent::FollowModuleSet {
            profile_id,
            module,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Replace the image URI of a profile owned by `caller`.
    pub fn set_profile_image_uri(
        &self,
        caller: &Address,
        profile_id: ProfileId,
        image_uri: &str,
    ) -> Result<(), RegistryError> {
        let mut inner = self.write()?;
        let inner = &mut *inner;

        profiles::set_profile_image_uri(&mut inner.state, caller, profile_id, image_uri)?;
        inner.events.push(RegistryEvent::ProfileImageUriSet {
            profile_id,
            at: Utc::now(),
        });
        Ok(())
    }

    // ── follow ──────────────────────────────────────────────────────

    /// Follow the given profiles as one atomic batch. Any element's failure
    /// (including a module rejection) voids the whole call.
    pub fn follow(
        &self,
        caller: &Address,
        profile_ids: &[ProfileId],
        datas: &[Vec<u8>],
    ) -> Result<Vec<FollowTokenId>, RegistryError> {
        let mut inner = self.write()?;
        let inner = &mut *inner;

        let token_ids =
            follow_engine::follow(&mut inner.state, &inner.bank, caller, profile_ids, datas)?;
        let at = Utc::now();
        for (profile_id, token_id) in profile_ids.iter().zip(&token_ids) {
            inner.events.push(RegistryEvent::Followed {
                follower: caller.clone(),
                profile_id: *profile_id,
                token_id: *token_id,
                at,
            });
        }
        Ok(token_ids)
    }

    // ── publishing ──────────────────────────────────────────────────

    /// Create a standalone post on a profile owned by `caller`.
    pub fn post(&self, caller: &Address, request: &PostRequest) -> Result<PubId, RegistryError> {
        let mut inner = self.write()?;
        let inner = &mut *inner;

        let pub_id = publishing::post(&mut inner.state, &inner.access, &inner.bank, caller, request)?;
        Self::push_publication_event(inner, request.profile_id, pub_id);
        Ok(pub_id)
    }

    /// Create a comment; the target's reference module must approve it.
    pub fn comment(
        &self,
        caller: &Address,
        request: &CommentRequest,
    ) -> Result<PubId, RegistryError> {
        let mut inner = self.write()?;
        let inner = &mut *inner;

        let pub_id =
            publishing::comment(&mut inner.state, &inner.access, &inner.bank, caller, request)?;
        Self::push_publication_event(inner, request.profile_id, pub_id);
        Ok(pub_id)
    }

    /// Create a mirror; the target's reference module must approve it.
    pub fn mirror(
        &self,
        caller: &Address,
        request: &MirrorRequest,
    ) -> Result<PubId, RegistryError> {
        let mut inner = self.write()?;
        let inner = &mut *inner;

        let pub_id =
            publishing::mirror(&mut inner.state, &inner.access, &inner.bank, caller, request)?;
        Self::push_publication_event(inner, request.profile_id, pub_id);
        Ok(pub_id)
    }

    fn push_publication_event(inner: &mut HubInner, profile_id: ProfileId, pub_id: PubId) {
        let kind = inner
            .state
            .publication(PubPointer { profile_id, pub_id })
            .map(|record| record.kind.clone());
        // The record was committed by the engine on this same guard.
        if let Some(kind) = kind {
            inner.events.push(RegistryEvent::PublicationCreated {
                profile_id,
                pub_id,
                kind,
                at: Utc::now(),
            });
        }
    }

    // ── read surface ────────────────────────────────────────────────

    pub fn profile(&self, profile_id: ProfileId) -> Result<Option<ProfileRecord>, RegistryError> {
        Ok(self.read()?.state.profile(profile_id).cloned())
    }

    pub fn profile_id_by_handle(&self, handle: &str) -> Result<Option<ProfileId>, RegistryError> {
        Ok(self.read()?.state.profile_id_by_handle(handle))
    }

    pub fn profile_count(&self) -> Result<u64, RegistryError> {
        Ok(self.read()?.state.profile_count())
    }

    pub fn publication(
        &self,
        pointer: PubPointer,
    ) -> Result<Option<PublicationRecord>, RegistryError> {
        Ok(self.read()?.state.publication(pointer).cloned())
    }

    pub fn publication_count(&self, profile_id: ProfileId) -> Result<u64, RegistryError> {
        Ok(self.read()?.state.publication_count(profile_id))
    }

    pub fn follow_tokens(
        &self,
        profile_id: ProfileId,
    ) -> Result<Vec<FollowTokenRecord>, RegistryError> {
        Ok(self.read()?.state.follow_tokens(profile_id).to_vec())
    }

    pub fn is_following(
        &self,
        follower: &Address,
        profile_id: ProfileId,
    ) -> Result<bool, RegistryError> {
        Ok(self.read()?.state.is_following(follower, profile_id))
    }

    /// Snapshot of the operation log.
    pub fn events(&self) -> Result<Vec<RegistryEvent>, RegistryError> {
        Ok(self.read()?.events.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    fn hub() -> (Hub, Address) {
        let governance = addr("0xgov");
        (Hub::new(governance.clone()), governance)
    }

    #[test]
    fn only_governance_may_whitelist() {
        let (hub, gov) = hub();

        let err = hub
            .whitelist_profile_creator(&addr("0xmallory"), &addr("0xa"), true)
            .unwrap_err();
        assert_eq!(err, RegistryError::NotGovernance(addr("0xmallory")));

        hub.whitelist_profile_creator(&gov, &addr("0xa"), true).unwrap();
        assert!(hub
            .is_whitelisted(&addr("0xa"), WhitelistKind::ProfileCreator)
            .unwrap());
    }

    #[test]
    fn repeated_whitelisting_logs_once() {
        let (hub, gov) = hub();

        hub.whitelist_profile_creator(&gov, &addr("0xa"), true).unwrap();
        hub.whitelist_profile_creator(&gov, &addr("0xa"), true).unwrap();

        let events = hub.events().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            RegistryEvent::WhitelistUpdated { enabled: true, .. }
        ));
    }

    #[test]
    fn governance_transfer_revokes_the_old_key() {
        let (hub, gov) = hub();
        let new_gov = addr("0xnewgov");

        hub.set_governance(&gov, new_gov.clone()).unwrap();
        assert_eq!(hub.governance().unwrap(), new_gov);

        let err = hub
            .whitelist_profile_creator(&gov, &addr("0xa"), true)
            .unwrap_err();
        assert_eq!(err, RegistryError::NotGovernance(gov));

        hub.whitelist_profile_creator(&new_gov, &addr("0xa"), true)
            .unwrap();
    }

    #[test]
    fn aborted_operations_log_nothing() {
        let (hub, _gov) = hub();

        let result = hub.create_profile(&CreateProfileRequest {
            to: addr("0xnobody"),
            handle: "nobody".to_string(),
            image_uri: String::new(),
            follow_module: None,
            follow_module_init_data: vec![],
            follow_nft_uri: String::new(),
        });
        assert!(result.is_err());
        assert!(hub.events().unwrap().is_empty());
    }
}
