use flashcards_core::db::open_db_in_memory;
use flashcards_core::{
    AccountService, GenerationSessionService, Principal, Proposal, ProposalDraft, ProposalStatus,
    SessionListQuery, SessionUpdate, StoreError, ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn registered_user(conn: &Connection) -> Principal {
    let principal = Principal::user(Uuid::new_v4());
    AccountService::try_new(conn)
        .unwrap()
        .register_user(&principal)
        .unwrap();
    principal
}

#[test]
fn create_accepts_source_text_within_bounds() {
    let conn = open_db_in_memory().unwrap();
    let service = GenerationSessionService::try_new(&conn).unwrap();
    let alice = registered_user(&conn);

    for len in [1000, 1001, 5000, 9999, 10000] {
        let session = service.create_session(&alice, "s".repeat(len)).unwrap();
        assert_eq!(session.owner, alice.user_id().unwrap());
        assert!(session.proposals.is_empty());
        assert_eq!(session.generated_count, 0);
        assert_eq!(session.accepted_count, 0);

        let loaded = service.get_session(&alice, session.id).unwrap();
        assert_eq!(loaded.source_text.chars().count(), len);
        assert_eq!(loaded.id, session.id);
    }
}

#[test]
fn create_rejects_source_text_out_of_bounds() {
    let conn = open_db_in_memory().unwrap();
    let service = GenerationSessionService::try_new(&conn).unwrap();
    let alice = registered_user(&conn);

    for len in [0, 1, 999, 10001, 20000] {
        let err = service.create_session(&alice, "s".repeat(len)).unwrap_err();
        assert!(
            matches!(
                err,
                StoreError::Validation(ValidationError::SourceTextLength { actual }) if actual == len
            ),
            "length {len} should fail validation, got {err:?}"
        );
    }

    let listed = service
        .list_sessions(&alice, &SessionListQuery::default())
        .unwrap();
    assert!(listed.is_empty());
}

#[test]
fn storage_check_rejects_short_source_text_written_directly() {
    let conn = open_db_in_memory().unwrap();
    let alice = registered_user(&conn);

    let err = conn
        .execute(
            "INSERT INTO flashcards_gen_sessions (id, user_id, source_text) VALUES (?1, ?2, 'short');",
            [
                Uuid::new_v4().to_string(),
                alice.user_id().unwrap().to_string(),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        StoreError::from(err),
        StoreError::Validation(ValidationError::Constraint(_))
    ));
}

#[test]
fn create_for_unregistered_user_is_a_reference_error() {
    let conn = open_db_in_memory().unwrap();
    let service = GenerationSessionService::try_new(&conn).unwrap();
    let stranger = Principal::user(Uuid::new_v4());

    let err = service
        .create_session(&stranger, "s".repeat(1000))
        .unwrap_err();
    assert!(matches!(err, StoreError::Reference(_)));
}

#[test]
fn append_proposals_adds_pending_items_and_counts_them() {
    let conn = open_db_in_memory().unwrap();
    let service = GenerationSessionService::try_new(&conn).unwrap();
    let alice = registered_user(&conn);
    let session = service.create_session(&alice, "s".repeat(1200)).unwrap();

    let updated = service
        .append_proposals(
            &alice,
            session.id,
            vec![ProposalDraft::new("q1", "a1"), ProposalDraft::new("q2", "a2")],
        )
        .unwrap();
    assert_eq!(updated.generated_count, 2);
    assert_eq!(updated.accepted_count, 0);
    assert!(updated
        .proposals
        .iter()
        .all(|p| p.status == ProposalStatus::Pending));

    let again = service
        .append_proposals(&alice, session.id, vec![ProposalDraft::new("q3", "a3")])
        .unwrap();
    assert_eq!(again.generated_count, 3);

    let loaded = service.get_session(&alice, session.id).unwrap();
    let fronts: Vec<&str> = loaded.proposals.iter().map(|p| p.front.as_str()).collect();
    assert_eq!(fronts, ["q1", "q2", "q3"]);
    assert_eq!(loaded.generated_count, 3);
    assert!(loaded.updated_at >= loaded.created_at);
}

#[test]
fn update_session_writes_only_supplied_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = GenerationSessionService::try_new(&conn).unwrap();
    let alice = registered_user(&conn);
    let session = service.create_session(&alice, "s".repeat(1000)).unwrap();

    let proposals = vec![Proposal::pending("front", "back")];
    let updated = service
        .update_session(
            &alice,
            session.id,
            SessionUpdate {
                proposals: Some(proposals.clone()),
                ..SessionUpdate::default()
            },
        )
        .unwrap();
    // Counters are caller-maintained, not derived from proposals.
    assert_eq!(updated.generated_count, 0);
    assert_eq!(updated.proposals, proposals);

    let updated = service
        .update_session(
            &alice,
            session.id,
            SessionUpdate {
                generated_count: Some(7),
                accepted_count: Some(2),
                ..SessionUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.proposals, proposals);

    let loaded = service.get_session(&alice, session.id).unwrap();
    assert_eq!(loaded.generated_count, 7);
    assert_eq!(loaded.accepted_count, 2);
    assert_eq!(loaded.proposals, proposals);
}

#[test]
fn update_session_rejects_duplicate_proposal_ids() {
    let conn = open_db_in_memory().unwrap();
    let service = GenerationSessionService::try_new(&conn).unwrap();
    let alice = registered_user(&conn);
    let session = service.create_session(&alice, "s".repeat(1000)).unwrap();

    let proposal = Proposal::pending("q", "a");
    let err = service
        .update_session(
            &alice,
            session.id,
            SessionUpdate {
                proposals: Some(vec![proposal.clone(), proposal]),
                ..SessionUpdate::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::DuplicateProposalId(_))
    ));
}

#[test]
fn set_proposal_status_moves_one_proposal() {
    let conn = open_db_in_memory().unwrap();
    let service = GenerationSessionService::try_new(&conn).unwrap();
    let alice = registered_user(&conn);
    let session = service.create_session(&alice, "s".repeat(1000)).unwrap();
    let session = service
        .append_proposals(
            &alice,
            session.id,
            vec![ProposalDraft::new("q1", "a1"), ProposalDraft::new("q2", "a2")],
        )
        .unwrap();
    let target = session.proposals[1].id;

    let updated = service
        .set_proposal_status(&alice, session.id, target, ProposalStatus::Rejected)
        .unwrap();
    assert_eq!(
        updated.proposal(target).unwrap().status,
        ProposalStatus::Rejected
    );
    assert_eq!(updated.count_with_status(ProposalStatus::Pending), 1);

    let err = service
        .set_proposal_status(&alice, session.id, Uuid::new_v4(), ProposalStatus::Accepted)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::UnknownProposal(_))
    ));
}

#[test]
fn list_sessions_pages_through_own_rows() {
    let conn = open_db_in_memory().unwrap();
    let service = GenerationSessionService::try_new(&conn).unwrap();
    let alice = registered_user(&conn);
    for _ in 0..5 {
        service.create_session(&alice, "s".repeat(1000)).unwrap();
    }

    let first = service
        .list_sessions(
            &alice,
            &SessionListQuery {
                limit: Some(2),
                offset: 0,
            },
        )
        .unwrap();
    let rest = service
        .list_sessions(
            &alice,
            &SessionListQuery {
                limit: Some(10),
                offset: 2,
            },
        )
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(rest.len(), 3);
    assert!(first
        .iter()
        .all(|session| rest.iter().all(|other| other.id != session.id)));
}

#[test]
fn delete_session_removes_row() {
    let conn = open_db_in_memory().unwrap();
    let service = GenerationSessionService::try_new(&conn).unwrap();
    let alice = registered_user(&conn);
    let session = service.create_session(&alice, "s".repeat(1000)).unwrap();

    service.delete_session(&alice, session.id).unwrap();
    let err = service.get_session(&alice, session.id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = service.delete_session(&alice, session.id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn source_text_with_nul_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let service = GenerationSessionService::try_new(&conn).unwrap();
    let alice = registered_user(&conn);

    let mut text = "a".repeat(999);
    text.insert(500, '\0');
    assert_eq!(text.chars().count(), 1000);

    let err = service.create_session(&alice, text).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::NulCharacter {
            field: "source_text"
        })
    ));
    assert!(service
        .list_sessions(&alice, &SessionListQuery::default())
        .unwrap()
        .is_empty());
}
