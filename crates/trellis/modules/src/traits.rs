use thiserror::Error;
use trellis_types::{Address, ProfileId, PubId, PubPointer};

/// Failure signaled by a module hook. The registry treats the reason as
/// opaque and surfaces it unchanged as `RegistryError::ModuleReverted`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// The policy rejected the operation.
    #[error("{0}")]
    Rejected(String),

    /// The init payload could not be decoded.
    #[error("invalid init data: {0}")]
    InvalidInitData(String),
}

/// Follow policy attached to a profile.
///
/// A profile with no follow module attached accepts every follow
/// unconditionally; these hooks only run when a module is attached.
pub trait FollowModule: Send + Sync {
    /// Called once when the module is attached to a profile, with the
    /// attachment's opaque configuration payload. A failure aborts the
    /// attaching operation.
    fn initialize(&self, profile_id: ProfileId, data: &[u8]) -> Result<(), ModuleError>;

    /// Approve or reject one follow request against the profile.
    fn process_follow(
        &self,
        follower: &Address,
        profile_id: ProfileId,
        data: &[u8],
    ) -> Result<(), ModuleError>;
}

impl std::fmt::Debug for dyn FollowModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn FollowModule")
    }
}

/// Collect policy attached to a publication at publish time.
pub trait CollectModule: Send + Sync {
    /// Called once when the publication is created. A failure aborts the
    /// publish and the previewed publication ID is not consumed.
    fn initialize(
        &self,
        profile_id: ProfileId,
        pub_id: PubId,
        data: &[u8],
    ) -> Result<(), ModuleError>;
}

/// Reference policy attached to a publication, governing whether other
/// publications may point at it.
pub trait ReferenceModule: Send + Sync {
    /// Called once when the publication is created.
    fn initialize(
        &self,
        profile_id: ProfileId,
        pub_id: PubId,
        data: &[u8],
    ) -> Result<(), ModuleError>;

    /// Approve or reject a comment/mirror pointing at the governed
    /// publication. `source` is the previewed pointer of the publication
    /// being created.
    fn process_reference(
        &self,
        source: PubPointer,
        target_profile: ProfileId,
        target_pub: PubId,
        data: &[u8],
    ) -> Result<(), ModuleError>;
}
