//! Built-in policy modules.
//!
//! These are the stock variants of the three capability contracts:
//! unconditional approval, unconditional denial, and configuration-driven
//! gating. Configuration payloads are JSON.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use trellis_types::{Address, ProfileId, PubId, PubPointer};

use crate::traits::{CollectModule, FollowModule, ModuleError, ReferenceModule};

fn decode_init<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T, ModuleError> {
    serde_json::from_slice(data).map_err(|err| ModuleError::InvalidInitData(err.to_string()))
}

/// Approves every follow.
pub struct OpenFollowModule;

impl FollowModule for OpenFollowModule {
    fn initialize(&self, _profile_id: ProfileId, _data: &[u8]) -> Result<(), ModuleError> {
        Ok(())
    }

    fn process_follow(
        &self,
        _follower: &Address,
        _profile_id: ProfileId,
        _data: &[u8],
    ) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// Rejects every follow with a configured reason.
pub struct DenyFollowModule {
    reason: String,
}

impl DenyFollowModule {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl FollowModule for DenyFollowModule {
    fn initialize(&self, _profile_id: ProfileId, _data: &[u8]) -> Result<(), ModuleError> {
        Ok(())
    }

    fn process_follow(
        &self,
        _follower: &Address,
        _profile_id: ProfileId,
        _data: &[u8],
    ) -> Result<(), ModuleError> {
        Err(ModuleError::Rejected(self.reason.clone()))
    }
}

/// Admits only followers named in the attachment's init payload.
///
/// Init data is a JSON array of addresses; the allowlist is stored per
/// profile so one installed instance can serve many profiles.
#[derive(Default)]
pub struct AllowlistFollowModule {
    allowed: RwLock<HashMap<ProfileId, HashSet<Address>>>,
}

impl AllowlistFollowModule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FollowModule for AllowlistFollowModule {
    fn initialize(&self, profile_id: ProfileId, data: &[u8]) -> Result<(), ModuleError> {
        let entries: Vec<String> = decode_init(data)?;
        let set = entries.into_iter().map(Address::new).collect();

        let mut allowed = self
            .allowed
            .write()
            .map_err(|_| ModuleError::Rejected("allowlist lock poisoned".to_string()))?;
        allowed.insert(profile_id, set);
        Ok(())
    }

    fn process_follow(
        &self,
        follower: &Address,
        profile_id: ProfileId,
        _data: &[u8],
    ) -> Result<(), ModuleError> {
        let allowed = self
            .allowed
            .read()
            .map_err(|_| ModuleError::Rejected("allowlist lock poisoned".to_string()))?;

        let admitted = allowed
            .get(&profile_id)
            .is_some_and(|set| set.contains(follower));
        if admitted {
            Ok(())
        } else {
            Err(ModuleError::Rejected(format!(
                "follower {follower} is not on the allowlist for profile {profile_id}"
            )))
        }
    }
}

/// Accepts any publication without recording configuration.
pub struct OpenCollectModule;

impl CollectModule for OpenCollectModule {
    fn initialize(
        &self,
        _profile_id: ProfileId,
        _pub_id: PubId,
        _data: &[u8],
    ) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// Records a per-publication on/off switch from a JSON `bool` init payload.
#[derive(Default)]
pub struct ToggleCollectModule {
    enabled: RwLock<HashMap<(ProfileId, PubId), bool>>,
}

impl ToggleCollectModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether collection was enabled for the publication at publish time.
    pub fn is_enabled(&self, profile_id: ProfileId, pub_id: PubId) -> bool {
        self.enabled
            .read()
            .map(|map| map.get(&(profile_id, pub_id)).copied().unwrap_or(false))
            .unwrap_or(false)
    }
}

impl CollectModule for ToggleCollectModule {
    fn initialize(
        &self,
        profile_id: ProfileId,
        pub_id: PubId,
        data: &[u8],
    ) -> Result<(), ModuleError> {
        let enabled: bool = decode_init(data)?;
        let mut map = self
            .enabled
            .write()
            .map_err(|_| ModuleError::Rejected("toggle lock poisoned".to_string()))?;
        map.insert((profile_id, pub_id), enabled);
        Ok(())
    }
}

/// Approves every cross-reference.
pub struct OpenReferenceModule;

impl ReferenceModule for OpenReferenceModule {
    fn initialize(
        &self,
        _profile_id: ProfileId,
        _pub_id: PubId,
        _data: &[u8],
    ) -> Result<(), ModuleError> {
        Ok(())
    }

    fn process_reference(
        &self,
        _source: PubPointer,
        _target_profile: ProfileId,
        _target_pub: PubId,
        _data: &[u8],
    ) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// Rejects every cross-reference with a configured reason.
pub struct DenyReferenceModule {
    reason: String,
}

impl DenyReferenceModule {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ReferenceModule for DenyReferenceModule {
    fn initialize(
        &self,
        _profile_id: ProfileId,
        _pub_id: PubId,
        _data: &[u8],
    ) -> Result<(), ModuleError> {
        Ok(())
    }

    fn process_reference(
        &self,
        _source: PubPointer,
        _target_profile: ProfileId,
        _target_pub: PubId,
        _data: &[u8],
    ) -> Result<(), ModuleError> {
        Err(ModuleError::Rejected(self.reason.clone()))
    }
}
