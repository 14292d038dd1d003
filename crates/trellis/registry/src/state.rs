use std::collections::{BTreeMap, HashMap};

use trellis_types::{
    Address, FollowTokenId, FollowTokenRecord, ProfileId, ProfileRecord, PubId, PubPointer,
    PublicationRecord, RegistryError,
};

/// The single explicitly-owned container for all registry state.
///
/// Records are append-only: profiles, publications, and follow tokens are
/// inserted exactly once at commit time and never removed, so every ID
/// sequence stays dense (1..N) by construction and "next ID" is always a
/// pure preview with nothing to roll back.
#[derive(Clone, Debug, Default)]
pub struct RegistryState {
    profiles: BTreeMap<ProfileId, ProfileRecord>,
    /// Lowercased handle -> profile; the key normalization is what makes
    /// handle uniqueness case-insensitive.
    handles: HashMap<String, ProfileId>,
    publications: HashMap<ProfileId, Vec<PublicationRecord>>,
    follow_tokens: HashMap<ProfileId, Vec<FollowTokenRecord>>,
}

impl RegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── profiles ────────────────────────────────────────────────────

    pub fn profile(&self, id: ProfileId) -> Option<&ProfileRecord> {
        self.profiles.get(&id)
    }

    pub fn require_profile(&self, id: ProfileId) -> Result<&ProfileRecord, RegistryError> {
        self.profiles
            .get(&id)
            .ok_or(RegistryError::ProfileDoesNotExist(id))
    }

    /// Shared owner-gate precondition: resolves the profile and checks that
    /// `caller` is its current owner.
    pub fn require_owner(
        &self,
        caller: &Address,
        id: ProfileId,
    ) -> Result<&ProfileRecord, RegistryError> {
        let profile = self.require_profile(id)?;
        if &profile.owner == caller {
            Ok(profile)
        } else {
            Err(RegistryError::NotProfileOwner {
                caller: caller.clone(),
                profile_id: id,
            })
        }
    }

    pub(crate) fn profile_mut(&mut self, id: ProfileId) -> Result<&mut ProfileRecord, RegistryError> {
        self.profiles
            .get_mut(&id)
            .ok_or(RegistryError::ProfileDoesNotExist(id))
    }

    pub fn profile_count(&self) -> u64 {
        self.profiles.len() as u64
    }

    /// The ID the next successful creation will receive. Pure preview; the
    /// sequence advances only when `insert_profile` commits.
    pub fn next_profile_id(&self) -> ProfileId {
        ProfileId(self.profiles.len() as u64 + 1)
    }

    pub fn profile_id_by_handle(&self, handle: &str) -> Option<ProfileId> {
        self.handles.get(&handle.to_lowercase()).copied()
    }

    pub fn handle_taken(&self, handle: &str) -> bool {
        self.handles.contains_key(&handle.to_lowercase())
    }

    /// Commit a new profile record. The record's ID must be the previewed
    /// next ID; this is the only path that advances the profile sequence.
    pub(crate) fn insert_profile(&mut self, record: ProfileRecord) {
        debug_assert_eq!(record.id, self.next_profile_id());
        self.handles
            .insert(record.handle.to_lowercase(), record.id);
        self.profiles.insert(record.id, record);
    }

    // ── publications ────────────────────────────────────────────────

    pub fn publication(&self, pointer: PubPointer) -> Option<&PublicationRecord> {
        self.publications
            .get(&pointer.profile_id)
            .and_then(|pubs| pubs.get((pointer.pub_id.0 as usize).checked_sub(1)?))
    }

    pub fn require_publication(
        &self,
        pointer: PubPointer,
    ) -> Result<&PublicationRecord, RegistryError> {
        self.publication(pointer)
            .ok_or(RegistryError::PublicationDoesNotExist(pointer))
    }

    pub fn publication_count(&self, profile_id: ProfileId) -> u64 {
        self.publications
            .get(&profile_id)
            .map(|pubs| pubs.len() as u64)
            .unwrap_or(0)
    }

    pub fn next_pub_id(&self, profile_id: ProfileId) -> PubId {
        PubId(self.publication_count(profile_id) + 1)
    }

    pub(crate) fn push_publication(&mut self, record: PublicationRecord) {
        debug_assert_eq!(record.pub_id, self.next_pub_id(record.profile_id));
        self.publications
            .entry(record.profile_id)
            .or_default()
            .push(record);
    }

    // ── follow tokens ───────────────────────────────────────────────

    pub fn follow_tokens(&self, profile_id: ProfileId) -> &[FollowTokenRecord] {
        self.follow_tokens
            .get(&profile_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_following(&self, follower: &Address, profile_id: ProfileId) -> bool {
        self.follow_tokens(profile_id)
            .iter()
            .any(|token| &token.owner == follower)
    }

    pub fn next_follow_token_id(&self, profile_id: ProfileId) -> FollowTokenId {
        FollowTokenId(self.follow_tokens(profile_id).len() as u64 + 1)
    }

    pub(crate) fn push_follow_token(&mut self, record: FollowTokenRecord) {
        debug_assert_eq!(
            record.token_id,
            self.next_follow_token_id(record.profile_id)
        );
        self.follow_tokens
            .entry(record.profile_id)
            .or_default()
            .push(record);
    }
}
