//! End-to-end flows through the hub: governance setup, profile creation,
//! module attachment, following, and publishing, with the operation log
//! checked along the way.

use std::sync::Arc;

use trellis_hub::Hub;
use trellis_modules::{
    AllowlistFollowModule, DenyFollowModule, DenyReferenceModule, OpenFollowModule,
    OpenReferenceModule, ToggleCollectModule,
};
use trellis_types::{
    Address, CommentRequest, CreateProfileRequest, FollowTokenId, MirrorRequest, ModuleAddress,
    PostRequest, ProfileId, PubId, PubPointer, PublicationKind, RegistryError, RegistryEvent,
    WhitelistKind,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn addr(s: &str) -> Address {
    Address::new(s)
}

fn module_addr(s: &str) -> ModuleAddress {
    ModuleAddress::new(s)
}

struct Fixture {
    hub: Hub,
    governance: Address,
    toggle: Arc<ToggleCollectModule>,
}

/// A hub with one whitelisted creator (`0xalice`), an open follow module,
/// a toggle collect module, and an open reference module, all installed
/// and whitelisted.
fn fixture() -> Fixture {
    init_tracing();
    let governance = addr("0xgov");
    let hub = Hub::new(governance.clone());
    let toggle = Arc::new(ToggleCollectModule::new());

    hub.install_follow_module(module_addr("0xfollow-open"), Arc::new(OpenFollowModule))
        .unwrap();
    hub.install_collect_module(module_addr("0xcollect-toggle"), toggle.clone())
        .unwrap();
    hub.install_reference_module(module_addr("0xref-open"), Arc::new(OpenReferenceModule))
        .unwrap();

    hub.whitelist_profile_creator(&governance, &addr("0xalice"), true)
        .unwrap();
    hub.whitelist_follow_module(&governance, &addr("0xfollow-open"), true)
        .unwrap();
    hub.whitelist_collect_module(&governance, &addr("0xcollect-toggle"), true)
        .unwrap();
    hub.whitelist_reference_module(&governance, &addr("0xref-open"), true)
        .unwrap();

    Fixture {
        hub,
        governance,
        toggle,
    }
}

fn profile_request(to: &str, handle: &str) -> CreateProfileRequest {
    CreateProfileRequest {
        to: addr(to),
        handle: handle.to_string(),
        image_uri: "ipfs://avatar".to_string(),
        follow_module: Some(module_addr("0xfollow-open")),
        follow_module_init_data: vec![],
        follow_nft_uri: "ipfs://follow-nft".to_string(),
    }
}

fn post_request(profile_id: ProfileId) -> PostRequest {
    PostRequest {
        profile_id,
        content_uri: "ipfs://post".to_string(),
        collect_module: Some(module_addr("0xcollect-toggle")),
        collect_module_init_data: serde_json::to_vec(&true).unwrap(),
        reference_module: Some(module_addr("0xref-open")),
        reference_module_init_data: vec![],
    }
}

#[test]
fn full_lifecycle_from_whitelist_to_mirror() {
    let fx = fixture();
    let hub = &fx.hub;
    let alice = addr("0xalice");
    let bob = addr("0xbob");

    // First profile takes ID 1.
    let alice_profile = hub.create_profile(&profile_request("0xalice", "token.id_1")).unwrap();
    assert_eq!(alice_profile, ProfileId(1));
    assert_eq!(
        hub.profile_id_by_handle("TOKEN.ID_1").unwrap(),
        Some(alice_profile)
    );

    hub.whitelist_profile_creator(&fx.governance, &bob, true)
        .unwrap();
    let bob_profile = hub.create_profile(&profile_request("0xbob", "bob")).unwrap();
    assert_eq!(bob_profile, ProfileId(2));
    assert_eq!(hub.profile_count().unwrap(), 2);

    // Bob follows both profiles in one batch; per-profile sequences start
    // at 1 independently.
    let tokens = hub
        .follow(&bob, &[alice_profile, bob_profile], &[vec![], vec![]])
        .unwrap();
    assert_eq!(tokens, vec![FollowTokenId(1), FollowTokenId(1)]);
    assert!(hub.is_following(&bob, alice_profile).unwrap());
    assert_eq!(hub.follow_tokens(alice_profile).unwrap()[0].owner, bob);

    // Alice posts with collection toggled on.
    let post_id = hub.post(&alice, &post_request(alice_profile)).unwrap();
    assert_eq!(post_id, PubId(1));
    assert!(fx.toggle.is_enabled(alice_profile, post_id));

    let pointer = PubPointer {
        profile_id: alice_profile,
        pub_id: post_id,
    };

    // Bob comments on the post from his own profile.
    let comment_id = hub
        .comment(
            &bob,
            &CommentRequest {
                profile_id: bob_profile,
                content_uri: "ipfs://comment".to_string(),
                target: pointer,
                reference_data: vec![],
                collect_module: None,
                collect_module_init_data: vec![],
                reference_module: None,
                reference_module_init_data: vec![],
            },
        )
        .unwrap();
    assert_eq!(comment_id, PubId(1));

    // And mirrors it; the mirror record carries no content.
    let mirror_id = hub
        .mirror(
            &bob,
            &MirrorRequest {
                profile_id: bob_profile,
                target: pointer,
                reference_data: vec![],
                reference_module: None,
                reference_module_init_data: vec![],
            },
        )
        .unwrap();
    assert_eq!(mirror_id, PubId(2));

    let mirror = hub
        .publication(PubPointer {
            profile_id: bob_profile,
            pub_id: mirror_id,
        })
        .unwrap()
        .unwrap();
    assert_eq!(mirror.content_uri, None);
    assert_eq!(mirror.kind, PublicationKind::Mirror { target: pointer });

    // The log holds one entry per committed state change: 4 whitelistings
    // from setup, 1 more for bob, 2 profiles, 2 follow tokens, 3
    // publications.
    let events = hub.events().unwrap();
    assert_eq!(events.len(), 12);
    let followed = events
        .iter()
        .filter(|event| matches!(event, RegistryEvent::Followed { .. }))
        .count();
    assert_eq!(followed, 2);
}

#[test]
fn first_profile_first_token_first_publication() {
    let fx = fixture();
    let hub = &fx.hub;
    let alice = addr("0xalice");
    let bob = addr("0xbob");

    let profile = hub.create_profile(&profile_request("0xalice", "token.id_1")).unwrap();
    assert_eq!(profile, ProfileId(1));

    let tokens = hub.follow(&bob, &[profile], &[vec![]]).unwrap();
    assert_eq!(tokens, vec![FollowTokenId(1)]);
    assert_eq!(hub.follow_tokens(profile).unwrap()[0].owner, bob);

    let pub_id = hub
        .post(
            &alice,
            &PostRequest {
                profile_id: profile,
                content_uri: "ipfs://QmFirst".to_string(),
                collect_module: Some(module_addr("0xcollect-toggle")),
                collect_module_init_data: serde_json::to_vec(&true).unwrap(),
                reference_module: None,
                reference_module_init_data: vec![],
            },
        )
        .unwrap();
    assert_eq!(pub_id, PubId(1));

    let stored = hub
        .publication(PubPointer {
            profile_id: profile,
            pub_id,
        })
        .unwrap()
        .unwrap();
    assert_eq!(stored.kind, PublicationKind::Post);
    assert_eq!(stored.content_uri.as_deref(), Some("ipfs://QmFirst"));
    assert!(fx.toggle.is_enabled(profile, pub_id));
}

#[test]
fn handles_collide_case_insensitively_across_callers() {
    let fx = fixture();
    let hub = &fx.hub;

    hub.create_profile(&profile_request("0xalice", "ghost.eth"))
        .unwrap();

    hub.whitelist_profile_creator(&fx.governance, &addr("0xbob"), true)
        .unwrap();
    let err = hub
        .create_profile(&profile_request("0xbob", "ghost.eth"))
        .unwrap_err();
    assert_eq!(err, RegistryError::HandleTaken("ghost.eth".to_string()));

    // The losing attempt must not have consumed an ID.
    assert_eq!(hub.profile_count().unwrap(), 1);
}

#[test]
fn one_rejected_element_voids_the_whole_follow_batch() {
    let fx = fixture();
    let hub = &fx.hub;
    let alice = addr("0xalice");
    let bob = addr("0xbob");

    hub.install_follow_module(
        module_addr("0xfollow-deny"),
        Arc::new(DenyFollowModule::new("followers closed")),
    )
    .unwrap();
    hub.whitelist_follow_module(&fx.governance, &addr("0xfollow-deny"), true)
        .unwrap();

    let open = hub.create_profile(&profile_request("0xalice", "open")).unwrap();
    let mut closed_request = profile_request("0xalice", "closed");
    closed_request.follow_module = Some(module_addr("0xfollow-deny"));
    let closed = hub.create_profile(&closed_request).unwrap();

    let events_before = hub.events().unwrap().len();
    let err = hub
        .follow(&bob, &[open, closed], &[vec![], vec![]])
        .unwrap_err();
    assert!(matches!(err, RegistryError::ModuleReverted { .. }));

    // Even the approved first element left no trace.
    assert!(!hub.is_following(&bob, open).unwrap());
    assert!(hub.follow_tokens(open).unwrap().is_empty());
    assert_eq!(hub.events().unwrap().len(), events_before);

    // Retrying against only the open profile succeeds and still mints
    // token 1.
    let tokens = hub.follow(&bob, &[open], &[vec![]]).unwrap();
    assert_eq!(tokens, vec![FollowTokenId(1)]);
    assert_eq!(hub.events().unwrap().len(), events_before + 1);
}

#[test]
fn modules_must_be_both_installed_and_whitelisted_to_attach() {
    let fx = fixture();
    let hub = &fx.hub;

    // Installed but never whitelisted.
    hub.install_follow_module(
        module_addr("0xfollow-rogue"),
        Arc::new(OpenFollowModule),
    )
    .unwrap();
    let mut request = profile_request("0xalice", "rogue");
    request.follow_module = Some(module_addr("0xfollow-rogue"));
    let err = hub.create_profile(&request).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::ModuleNotWhitelisted { .. }
    ));

    // Whitelisted but never installed.
    hub.whitelist_follow_module(&fx.governance, &addr("0xfollow-ghost"), true)
        .unwrap();
    let mut request = profile_request("0xalice", "ghost");
    request.follow_module = Some(module_addr("0xfollow-ghost"));
    let err = hub.create_profile(&request).unwrap_err();
    assert!(matches!(err, RegistryError::ModuleNotInstalled { .. }));

    assert_eq!(hub.profile_count().unwrap(), 0);
}

#[test]
fn swapping_the_follow_module_gates_only_future_follows() {
    let fx = fixture();
    let hub = &fx.hub;
    let alice = addr("0xalice");
    let bob = addr("0xbob");
    let carol = addr("0xcarol");

    let profile = hub.create_profile(&profile_request("0xalice", "alice")).unwrap();
    hub.follow(&bob, &[profile], &[vec![]]).unwrap();

    // Swap to an allowlist admitting only carol.
    hub.install_follow_module(
        module_addr("0xfollow-allowlist"),
        Arc::new(AllowlistFollowModule::new()),
    )
    .unwrap();
    hub.whitelist_follow_module(&fx.governance, &addr("0xfollow-allowlist"), true)
        .unwrap();
    hub.set_follow_module(
        &alice,
        profile,
        Some(module_addr("0xfollow-allowlist")),
        &serde_json::to_vec(&["0xcarol"]).unwrap(),
    )
    .unwrap();

    let err = hub.follow(&bob, &[profile], &[vec![]]).unwrap_err();
    assert!(matches!(err, RegistryError::ModuleReverted { .. }));
    let tokens = hub.follow(&carol, &[profile], &[vec![]]).unwrap();
    assert_eq!(tokens, vec![FollowTokenId(2)]);

    // Bob's earlier token is untouched by the swap.
    assert!(hub.is_following(&bob, profile).unwrap());

    // Detaching the module reopens the profile to everyone.
    hub.set_follow_module(&alice, profile, None, &[]).unwrap();
    hub.follow(&addr("0xdave"), &[profile], &[vec![]]).unwrap();
}

#[test]
fn only_the_owner_may_mutate_a_profile() {
    let fx = fixture();
    let hub = &fx.hub;
    let bob = addr("0xbob");

    let profile = hub.create_profile(&profile_request("0xalice", "alice")).unwrap();

    let err = hub
        .set_profile_image_uri(&bob, profile, "ipfs://vandalism")
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::NotProfileOwner {
            caller: bob.clone(),
            profile_id: profile,
        }
    );
    let err = hub.set_follow_module(&bob, profile, None, &[]).unwrap_err();
    assert_eq!(
        err,
        RegistryError::NotProfileOwner {
            caller: bob,
            profile_id: profile,
        }
    );

    hub.set_profile_image_uri(&addr("0xalice"), profile, "ipfs://new-avatar")
        .unwrap();
    assert_eq!(
        hub.profile(profile).unwrap().unwrap().image_uri,
        "ipfs://new-avatar"
    );
}

#[test]
fn a_target_reference_module_vetoes_comments_and_mirrors() {
    let fx = fixture();
    let hub = &fx.hub;
    let alice = addr("0xalice");

    hub.install_reference_module(
        module_addr("0xref-deny"),
        Arc::new(DenyReferenceModule::new("no derivatives")),
    )
    .unwrap();
    hub.whitelist_reference_module(&fx.governance, &addr("0xref-deny"), true)
        .unwrap();

    let profile = hub.create_profile(&profile_request("0xalice", "alice")).unwrap();
    let mut request = post_request(profile);
    request.reference_module = Some(module_addr("0xref-deny"));
    let post_id = hub.post(&alice, &request).unwrap();
    let pointer = PubPointer {
        profile_id: profile,
        pub_id: post_id,
    };

    let err = hub
        .mirror(
            &alice,
            &MirrorRequest {
                profile_id: profile,
                target: pointer,
                reference_data: vec![],
                reference_module: None,
                reference_module_init_data: vec![],
            },
        )
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::ModuleReverted {
            address: module_addr("0xref-deny"),
            reason: "no derivatives".to_string(),
        }
    );
    assert_eq!(hub.publication_count(profile).unwrap(), 1);
}

#[test]
fn referencing_a_missing_publication_fails() {
    let fx = fixture();
    let hub = &fx.hub;
    let alice = addr("0xalice");

    let profile = hub.create_profile(&profile_request("0xalice", "alice")).unwrap();
    let missing = PubPointer {
        profile_id: profile,
        pub_id: PubId(42),
    };

    let err = hub
        .comment(
            &alice,
            &CommentRequest {
                profile_id: profile,
                content_uri: "ipfs://orphan".to_string(),
                target: missing,
                reference_data: vec![],
                collect_module: None,
                collect_module_init_data: vec![],
                reference_module: None,
                reference_module_init_data: vec![],
            },
        )
        .unwrap_err();
    assert_eq!(err, RegistryError::PublicationDoesNotExist(missing));
}

#[test]
fn de_whitelisting_a_creator_blocks_new_profiles_only() {
    let fx = fixture();
    let hub = &fx.hub;
    let alice = addr("0xalice");

    let profile = hub.create_profile(&profile_request("0xalice", "alice")).unwrap();

    hub.whitelist_profile_creator(&fx.governance, &alice, false)
        .unwrap();
    assert!(!hub
        .is_whitelisted(&alice, WhitelistKind::ProfileCreator)
        .unwrap());

    let err = hub
        .create_profile(&profile_request("0xalice", "second"))
        .unwrap_err();
    assert_eq!(err, RegistryError::NotWhitelisted(alice.clone()));

    // The existing profile and its owner's writes are unaffected.
    hub.set_profile_image_uri(&alice, profile, "ipfs://still-mine")
        .unwrap();
}
