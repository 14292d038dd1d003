//! Whitelist authority for the trellis registry.
//!
//! `AccessController` holds the four whitelist sets and answers pure
//! membership queries. `ModuleRegistry` is the typed wrapper restricted to
//! the three module kinds; it is the only path by which a caller-supplied
//! module address may be validated for attachment.
//!
//! Whitelisting is checked at attachment time only. De-whitelisting an
//! address later does not retroactively invalidate modules already attached
//! to profiles or publications.

#![deny(unsafe_code)]

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;
use trellis_types::{Address, ModuleAddress, ModuleKind, RegistryError, WhitelistKind};

/// Whitelist sets, mutated only through governance-gated operations on the
/// hub and read-only to everything else.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccessController {
    profile_creators: HashSet<Address>,
    follow_modules: HashSet<Address>,
    collect_modules: HashSet<Address>,
    reference_modules: HashSet<Address>,
}

impl AccessController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership test for one (address, kind) pair.
    pub fn is_whitelisted(&self, address: &Address, kind: WhitelistKind) -> bool {
        self.set(kind).contains(address)
    }

    /// Grant or revoke a whitelist entry. Idempotent: setting the current
    /// value again is a no-op and reports `false`.
    pub fn set_whitelisted(
        &mut self,
        address: &Address,
        kind: WhitelistKind,
        enabled: bool,
    ) -> bool {
        let changed = if enabled {
            self.set_mut(kind).insert(address.clone())
        } else {
            self.set_mut(kind).remove(address)
        };

        if changed {
            info!(address = %address, kind = %kind, enabled, "whitelist updated");
        }
        changed
    }

    /// Fail with `NotWhitelisted` unless the address holds the entry.
    pub fn require_whitelisted(
        &self,
        address: &Address,
        kind: WhitelistKind,
    ) -> Result<(), RegistryError> {
        if self.is_whitelisted(address, kind) {
            Ok(())
        } else {
            Err(RegistryError::NotWhitelisted(address.clone()))
        }
    }

    fn set(&self, kind: WhitelistKind) -> &HashSet<Address> {
        match kind {
            WhitelistKind::ProfileCreator => &self.profile_creators,
            WhitelistKind::FollowModule => &self.follow_modules,
            WhitelistKind::CollectModule => &self.collect_modules,
            WhitelistKind::ReferenceModule => &self.reference_modules,
        }
    }

    fn set_mut(&mut self, kind: WhitelistKind) -> &mut HashSet<Address> {
        match kind {
            WhitelistKind::ProfileCreator => &mut self.profile_creators,
            WhitelistKind::FollowModule => &mut self.follow_modules,
            WhitelistKind::CollectModule => &mut self.collect_modules,
            WhitelistKind::ReferenceModule => &mut self.reference_modules,
        }
    }
}

/// Typed validation surface over `AccessController` for the three module
/// kinds.
pub struct ModuleRegistry;

impl ModuleRegistry {
    /// Validate a module address for attachment.
    ///
    /// `None` denotes "no module attached": it is always valid, bypasses the
    /// whitelist entirely, and downstream hooks are skipped.
    pub fn require_module_whitelisted(
        access: &AccessController,
        module: Option<&ModuleAddress>,
        kind: ModuleKind,
    ) -> Result<(), RegistryError> {
        let Some(address) = module else {
            return Ok(());
        };

        // Module whitelists are keyed by the same address space as accounts.
        let as_address = Address::new(address.0.clone());
        if access.is_whitelisted(&as_address, kind.whitelist_kind()) {
            Ok(())
        } else {
            Err(RegistryError::ModuleNotWhitelisted {
                address: address.clone(),
                kind,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    #[test]
    fn whitelist_kinds_are_independent() {
        let mut access = AccessController::new();
        access.set_whitelisted(&addr("0xa"), WhitelistKind::FollowModule, true);

        assert!(access.is_whitelisted(&addr("0xa"), WhitelistKind::FollowModule));
        assert!(!access.is_whitelisted(&addr("0xa"), WhitelistKind::CollectModule));
        assert!(!access.is_whitelisted(&addr("0xa"), WhitelistKind::ProfileCreator));
    }

    #[test]
    fn set_whitelisted_is_idempotent() {
        let mut access = AccessController::new();

        assert!(access.set_whitelisted(&addr("0xa"), WhitelistKind::ProfileCreator, true));
        assert!(!access.set_whitelisted(&addr("0xa"), WhitelistKind::ProfileCreator, true));
        assert!(access.is_whitelisted(&addr("0xa"), WhitelistKind::ProfileCreator));

        assert!(access.set_whitelisted(&addr("0xa"), WhitelistKind::ProfileCreator, false));
        assert!(!access.set_whitelisted(&addr("0xa"), WhitelistKind::ProfileCreator, false));
        assert!(!access.is_whitelisted(&addr("0xa"), WhitelistKind::ProfileCreator));
    }

    #[test]
    fn require_whitelisted_names_the_address() {
        let access = AccessController::new();
        let err = access
            .require_whitelisted(&addr("0xb"), WhitelistKind::ProfileCreator)
            .unwrap_err();
        assert_eq!(err, RegistryError::NotWhitelisted(addr("0xb")));
    }

    #[test]
    fn absent_module_bypasses_the_whitelist() {
        let access = AccessController::new();
        ModuleRegistry::require_module_whitelisted(&access, None, ModuleKind::Follow).unwrap();
    }

    #[test]
    fn module_validation_checks_the_matching_kind() {
        let mut access = AccessController::new();
        let module = ModuleAddress::new("0xmod");
        access.set_whitelisted(&addr("0xmod"), WhitelistKind::FollowModule, true);

        ModuleRegistry::require_module_whitelisted(&access, Some(&module), ModuleKind::Follow)
            .unwrap();

        let err = ModuleRegistry::require_module_whitelisted(
            &access,
            Some(&module),
            ModuleKind::Reference,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::ModuleNotWhitelisted {
                address: module,
                kind: ModuleKind::Reference,
            }
        );
    }
}
