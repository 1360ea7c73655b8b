//! Atomicity of the session set and code redemption under concurrent callers.

use std::sync::Arc;

use idp_model::{OAuthSession, Subject};
use idp_storage::{OAuthSessionStore, SubjectStore};
use idp_storage_memory::MemoryStore;
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_logins_never_lose_a_session() {
    let store = Arc::new(MemoryStore::new());
    let idp_id = Uuid::new_v4();
    let subject = Subject::new(idp_id, "jane@example.com", "Jane", "Doe", "hash");
    store.create_subject(&subject).await.unwrap();

    let handles: Vec<_> = (0..64)
        .map(|i| {
            let store = Arc::clone(&store);
            let subject_id = subject.id;
            tokio::spawn(async move {
                store
                    .add_session(idp_id, subject_id, &format!("session-{i}"))
                    .await
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let stored = store.get_subject(idp_id, subject.id).await.unwrap().unwrap();
    assert_eq!(stored.session_ids.len(), 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_redemptions_succeed_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let idp_id = Uuid::new_v4();
    let session = OAuthSession::new(
        idp_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        vec!["openid".to_string()],
        "0123456789abcdef",
    );
    store.create_oauth_session(&session).await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = Arc::clone(&store);
            let id = session.id;
            tokio::spawn(async move {
                store
                    .redeem_oauth_session(idp_id, id, &format!("token-{i}"))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let stored = store
        .get_oauth_session_by_code(idp_id, "0123456789abcdef")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.consumed);
    assert!(stored.access_token.is_some());
}
