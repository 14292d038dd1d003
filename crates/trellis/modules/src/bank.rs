use std::collections::HashMap;
use std::sync::Arc;

use trellis_types::{ModuleAddress, ModuleKind, RegistryError};

use crate::traits::{CollectModule, FollowModule, ReferenceModule};

/// Installed module implementations, keyed by address per kind.
///
/// Installation mirrors on-chain deployment: it is open to anyone and grants
/// nothing by itself. Whitelisting an address for attachment is a separate,
/// governance-gated step.
#[derive(Clone, Default)]
pub struct ModuleBank {
    follow: HashMap<ModuleAddress, Arc<dyn FollowModule>>,
    collect: HashMap<ModuleAddress, Arc<dyn CollectModule>>,
    reference: HashMap<ModuleAddress, Arc<dyn ReferenceModule>>,
}

impl ModuleBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a follow module at `address`, replacing any previous
    /// implementation there.
    pub fn install_follow(&mut self, address: ModuleAddress, module: Arc<dyn FollowModule>) {
        self.follow.insert(address, module);
    }

    pub fn install_collect(&mut self, address: ModuleAddress, module: Arc<dyn CollectModule>) {
        self.collect.insert(address, module);
    }

    pub fn install_reference(&mut self, address: ModuleAddress, module: Arc<dyn ReferenceModule>) {
        self.reference.insert(address, module);
    }

    /// Resolve an installed follow module or fail with `ModuleNotInstalled`.
    pub fn require_follow(
        &self,
        address: &ModuleAddress,
    ) -> Result<&Arc<dyn FollowModule>, RegistryError> {
        self.follow
            .get(address)
            .ok_or_else(|| RegistryError::ModuleNotInstalled {
                address: address.clone(),
                kind: ModuleKind::Follow,
            })
    }

    pub fn require_collect(
        &self,
        address: &ModuleAddress,
    ) -> Result<&Arc<dyn CollectModule>, RegistryError> {
        self.collect
            .get(address)
            .ok_or_else(|| RegistryError::ModuleNotInstalled {
                address: address.clone(),
                kind: ModuleKind::Collect,
            })
    }

    pub fn require_reference(
        &self,
        address: &ModuleAddress,
    ) -> Result<&Arc<dyn ReferenceModule>, RegistryError> {
        self.reference
            .get(address)
            .ok_or_else(|| RegistryError::ModuleNotInstalled {
                address: address.clone(),
                kind: ModuleKind::Reference,
            })
    }
}
