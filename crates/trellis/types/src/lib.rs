//! Trellis core types - identifiers, records, and the shared error taxonomy.
//!
//! Identity in the registry is append-only: profile IDs, publication IDs, and
//! follow-token IDs are dense sequences allocated by the registry, never
//! random and never reused.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An account identifier - a caller, profile owner, or follower.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The address a module implementation is installed at.
///
/// "No module attached" is modeled as `Option<ModuleAddress>` = `None`
/// rather than a zero sentinel; an absent module bypasses whitelist checks
/// and its hooks default to approve.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleAddress(pub String);

impl ModuleAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }
}

impl std::fmt::Display for ModuleAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Profile identifier, globally sequential from 1.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProfileId(pub u64);

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Publication identifier, sequential from 1 within one authoring profile.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PubId(pub u64);

impl std::fmt::Display for PubId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Follow-token identifier, sequential from 1 within one target profile.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FollowTokenId(pub u64);

impl std::fmt::Display for FollowTokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fully qualified publication reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PubPointer {
    pub profile_id: ProfileId,
    pub pub_id: PubId,
}

impl std::fmt::Display for PubPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.profile_id, self.pub_id)
    }
}

/// The whitelist an address can be granted membership in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WhitelistKind {
    ProfileCreator,
    FollowModule,
    CollectModule,
    ReferenceModule,
}

impl std::fmt::Display for WhitelistKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WhitelistKind::ProfileCreator => "profile-creator",
            WhitelistKind::FollowModule => "follow-module",
            WhitelistKind::CollectModule => "collect-module",
            WhitelistKind::ReferenceModule => "reference-module",
        };
        write!(f, "{label}")
    }
}

/// The three module capability kinds the registry dispatches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    Follow,
    Collect,
    Reference,
}

impl ModuleKind {
    /// The whitelist governing attachment of this module kind.
    pub fn whitelist_kind(&self) -> WhitelistKind {
        match self {
            ModuleKind::Follow => WhitelistKind::FollowModule,
            ModuleKind::Collect => WhitelistKind::CollectModule,
            ModuleKind::Reference => WhitelistKind::ReferenceModule,
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ModuleKind::Follow => "follow",
            ModuleKind::Collect => "collect",
            ModuleKind::Reference => "reference",
        };
        write!(f, "{label}")
    }
}

/// A registered profile. Identity is append-only: the record is never
/// deleted, and `handle` is immutable after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: ProfileId,
    pub owner: Address,
    pub handle: String,
    pub image_uri: String,
    pub follow_module: Option<ModuleAddress>,
    pub follow_nft_uri: String,
    pub created_at: DateTime<Utc>,
}

/// What a publication is, relative to other publications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicationKind {
    /// Standalone content.
    Post,
    /// Content responding to another publication.
    Comment { target: PubPointer },
    /// Contentless re-publication of another publication.
    Mirror { target: PubPointer },
}

/// A stored publication. Immutable once committed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub profile_id: ProfileId,
    pub pub_id: PubId,
    pub kind: PublicationKind,
    /// `None` for mirrors, which carry no content of their own.
    pub content_uri: Option<String>,
    pub collect_module: Option<ModuleAddress>,
    pub reference_module: Option<ModuleAddress>,
    pub published_at: DateTime<Utc>,
}

/// Ownership record of one follow relationship.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FollowTokenRecord {
    pub token_id: FollowTokenId,
    pub profile_id: ProfileId,
    pub owner: Address,
    pub minted_at: DateTime<Utc>,
}

/// Inputs to profile creation. `to` is the creator and initial owner, and
/// must be whitelisted as a profile creator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateProfileRequest {
    pub to: Address,
    pub handle: String,
    pub image_uri: String,
    pub follow_module: Option<ModuleAddress>,
    pub follow_module_init_data: Vec<u8>,
    pub follow_nft_uri: String,
}

/// Inputs to a standalone post.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostRequest {
    pub profile_id: ProfileId,
    pub content_uri: String,
    pub collect_module: Option<ModuleAddress>,
    pub collect_module_init_data: Vec<u8>,
    pub reference_module: Option<ModuleAddress>,
    pub reference_module_init_data: Vec<u8>,
}

/// Inputs to a comment. The target publication's reference module (if any)
/// must approve the cross-reference.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentRequest {
    pub profile_id: ProfileId,
    pub content_uri: String,
    pub target: PubPointer,
    /// Opaque payload handed to the target's `process_reference` hook.
    pub reference_data: Vec<u8>,
    pub collect_module: Option<ModuleAddress>,
    pub collect_module_init_data: Vec<u8>,
    pub reference_module: Option<ModuleAddress>,
    pub reference_module_init_data: Vec<u8>,
}

/// Inputs to a mirror.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MirrorRequest {
    pub profile_id: ProfileId,
    pub target: PubPointer,
    /// Opaque payload handed to the target's `process_reference` hook.
    pub reference_data: Vec<u8>,
    pub reference_module: Option<ModuleAddress>,
    pub reference_module_init_data: Vec<u8>,
}

/// Operation-log entry appended when (and only when) an operation commits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RegistryEvent {
    WhitelistUpdated {
        address: Address,
        kind: WhitelistKind,
        enabled: bool,
        at: DateTime<Utc>,
    },
    GovernanceTransferred {
        from: Address,
        to: Address,
        at: DateTime<Utc>,
    },
    ProfileCreated {
        profile_id: ProfileId,
        owner: Address,
        handle: String,
        at: DateTime<Utc>,
    },
    FollowModuleSet {
        profile_id: ProfileId,
        module: Option<ModuleAddress>,
        at: DateTime<Utc>,
    },
    ProfileImageUriSet {
        profile_id: ProfileId,
        at: DateTime<Utc>,
    },
    Followed {
        follower: Address,
        profile_id: ProfileId,
        token_id: FollowTokenId,
        at: DateTime<Utc>,
    },
    PublicationCreated {
        profile_id: ProfileId,
        pub_id: PubId,
        kind: PublicationKind,
        at: DateTime<Utc>,
    },
}

/// The registry error taxonomy. Every variant aborts the entire enclosing
/// operation; no partial state survives a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("address {0} lacks the required whitelist entry")]
    NotWhitelisted(Address),

    #[error("caller {0} is not the governance address")]
    NotGovernance(Address),

    #[error("handle '{0}' is already taken")]
    HandleTaken(String),

    #[error("handle '{handle}' is invalid: {reason}")]
    HandleInvalid { handle: String, reason: String },

    #[error("module {address} is not whitelisted as a {kind} module")]
    ModuleNotWhitelisted {
        address: ModuleAddress,
        kind: ModuleKind,
    },

    #[error("no {kind} module is installed at {address}")]
    ModuleNotInstalled {
        address: ModuleAddress,
        kind: ModuleKind,
    },

    #[error("profile {0} does not exist")]
    ProfileDoesNotExist(ProfileId),

    #[error("publication {0} does not exist")]
    PublicationDoesNotExist(PubPointer),

    #[error("caller {caller} does not own profile {profile_id}")]
    NotProfileOwner {
        caller: Address,
        profile_id: ProfileId,
    },

    #[error("batch inputs have mismatched lengths: {profiles} profile ids, {datas} data payloads")]
    ArrayLengthMismatch { profiles: usize, datas: usize },

    #[error("module {address} reverted: {reason}")]
    ModuleReverted {
        address: ModuleAddress,
        reason: String,
    },

    #[error("registry lock poisoned")]
    Internal,
}
