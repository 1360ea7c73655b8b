//! SP-initiated and IdP-initiated login through the orchestrator.

mod common;

use idp_core::{messages, ErrorKind};
use idp_model::TransactionKind;
use idp_protocol_saml::bindings::HttpPostBinding;
use idp_protocol_saml::signature::XmlSignatureValidator;
use idp_protocol_saml::xml::Element;
use idp_protocol_saml::{
    status_codes, CredentialSubmission, LoginOutcome, SamlError, SamlFlow, SamlPostback, SamlSettings,
};
use idp_storage::{SubjectStore, TransactionStore};

use common::{authn_request, fixture, logout_request, PASSWORD};

fn postback(outcome: LoginOutcome) -> SamlPostback {
    match outcome {
        LoginOutcome::Postback(postback) => postback,
        LoginOutcome::Prompt(prompt) => panic!("expected postback, got prompt {:?}", prompt.error),
    }
}

fn decode_response(postback: &SamlPostback) -> (String, Element) {
    let xml = HttpPostBinding::decode(&postback.saml_response).unwrap();
    let root = Element::parse(&xml).unwrap();
    (xml, root)
}

#[tokio::test]
async fn active_session_skips_prompt() {
    let fx = fixture().await;
    fx.store.add_session(fx.idp.id, fx.subject.id, "existing").await.unwrap();
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    let outcome = flow
        .login_request("acme", &authn_request("req-1", "urn:test:sp", false), Some("existing"))
        .await
        .unwrap();
    let postback = postback(outcome);
    assert_eq!(postback.destination, "https://sp.example.com/acs");

    let (xml, root) = decode_response(&postback);
    assert_eq!(root.attribute("InResponseTo"), Some("req-1"));
    assert_eq!(root.attribute("Destination"), Some("https://sp.example.com/acs"));
    let status = root.child("Status").unwrap();
    assert_eq!(status.child("StatusCode").unwrap().attribute("Value"), Some(status_codes::SUCCESS));
    assert_eq!(status.child("StatusMessage").unwrap().text(), "Login successful");

    let assertion = root.child("Assertion").unwrap();
    let confirmation = assertion
        .child("Subject")
        .and_then(|s| s.child("SubjectConfirmation"))
        .and_then(|c| c.child("SubjectConfirmationData"))
        .unwrap();
    assert_eq!(confirmation.attribute("InResponseTo"), Some("req-1"));
    assert_eq!(confirmation.attribute("Recipient"), Some("https://sp.example.com/recipient"));
    assert_eq!(
        assertion.child("Subject").unwrap().child("NameID").unwrap().text(),
        "jane@example.com"
    );

    XmlSignatureValidator::embedded().validate(&xml).unwrap();

    let stored = fx.store.get_subject(fx.idp.id, fx.subject.id).await.unwrap().unwrap();
    assert!(stored.session_ids.contains("existing"));
    assert!(stored.session_ids.contains(&postback.session_id));
}

#[tokio::test]
async fn attributes_follow_profile_then_custom_order() {
    let fx = fixture().await;
    fx.store.add_session(fx.idp.id, fx.subject.id, "s").await.unwrap();
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    let outcome = flow
        .login_request("acme", &authn_request("req-2", "urn:test:sp", false), Some("s"))
        .await
        .unwrap();
    let (_, root) = decode_response(&postback(outcome));

    let statement = root.child("Assertion").unwrap().child("AttributeStatement").unwrap();
    let names: Vec<&str> = statement
        .child_elements()
        .filter_map(|a| a.attribute("Name"))
        .collect();
    assert_eq!(names, ["firstName", "lastName", "email", "dept"]);
    for attribute in statement.child_elements() {
        assert!(attribute.child("AttributeValue").is_some());
    }
}

#[tokio::test]
async fn force_authn_prompts_despite_session() {
    let fx = fixture().await;
    fx.store.add_session(fx.idp.id, fx.subject.id, "existing").await.unwrap();
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    let outcome = flow
        .login_request("acme", &authn_request("req-3", "urn:test:sp", true), Some("existing"))
        .await
        .unwrap();
    let LoginOutcome::Prompt(prompt) = outcome else {
        panic!("expected prompt");
    };
    assert_eq!(prompt.request_id, "req-3");
    assert_eq!(prompt.sp.unwrap().entity_id, "urn:test:sp");
    assert!(prompt.error.is_none());

    let recorded = fx
        .store
        .find_transaction(fx.idp.id, TransactionKind::LoginRequest, "req-3")
        .await
        .unwrap();
    assert!(recorded.is_some());
}

#[tokio::test]
async fn credential_submission_issues_response() {
    let fx = fixture().await;
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    let LoginOutcome::Prompt(prompt) = flow
        .login_request("acme", &authn_request("req-4", "urn:test:sp", false), None)
        .await
        .unwrap()
    else {
        panic!("expected prompt");
    };

    let wrong = CredentialSubmission {
        request_id: prompt.request_id.clone(),
        email: "jane@example.com".into(),
        password: "nope".into(),
    };
    let LoginOutcome::Prompt(retry) = flow.submit_credentials("acme", &wrong).await.unwrap() else {
        panic!("expected re-prompt");
    };
    assert_eq!(retry.error.as_deref(), Some(messages::INCORRECT_CREDENTIALS));

    let right = CredentialSubmission {
        password: PASSWORD.into(),
        email: "JANE@example.com".into(),
        ..wrong
    };
    let postback = postback(flow.submit_credentials("acme", &right).await.unwrap());
    let (_, root) = decode_response(&postback);
    assert_eq!(root.attribute("InResponseTo"), Some("req-4"));

    let transactions = fx.store.list_transactions(fx.idp.id).await.unwrap();
    let kinds: Vec<TransactionKind> = transactions.iter().map(|t| t.kind()).collect();
    assert_eq!(kinds, [TransactionKind::LoginRequest, TransactionKind::LoginResponse]);
}

#[tokio::test]
async fn unknown_request_id_reprompts() {
    let fx = fixture().await;
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    let submission = CredentialSubmission {
        request_id: "never-sent".into(),
        email: "jane@example.com".into(),
        password: PASSWORD.into(),
    };
    let LoginOutcome::Prompt(prompt) = flow.submit_credentials("acme", &submission).await.unwrap() else {
        panic!("expected prompt");
    };
    assert_eq!(prompt.error.as_deref(), Some(messages::INVALID_LOGIN_REQUEST));
    assert!(prompt.sp.is_none());
}

#[tokio::test]
async fn unknown_issuer_is_not_found() {
    let fx = fixture().await;
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    let err = flow
        .login_request("acme", &authn_request("req-5", "urn:other", false), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("\"urn:other\""));
}

#[tokio::test]
async fn logout_message_rejected_on_login_endpoint() {
    let fx = fixture().await;
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    let err = flow
        .login_request("acme", &logout_request("lo", "urn:test:sp", "jane@example.com"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SamlError::LogoutOnLoginEndpoint));
    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn malformed_request_is_parse_failure() {
    let fx = fixture().await;
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    let err = flow.login_request("acme", "bm90IGRlZmxhdGVk", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolParseFailure);
}

#[tokio::test]
async fn unknown_idp_is_not_found() {
    let fx = fixture().await;
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    let err = flow
        .login_request("nobody", &authn_request("r", "urn:test:sp", false), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SamlError::IdentityProviderNotFound));
}

#[tokio::test]
async fn idp_initiated_login() {
    let fx = fixture().await;
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    let err = flow.initiate_login("acme", None, Some("s")).await.unwrap_err();
    assert!(matches!(err, SamlError::MissingEntityId));

    let err = flow.initiate_login("acme", Some("urn:test:sp"), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    fx.store.add_session(fx.idp.id, fx.subject.id, "s").await.unwrap();
    let err = flow.initiate_login("acme", Some("urn:missing"), Some("s")).await.unwrap_err();
    assert_eq!(err.to_string(), "There is no SP with the given EntityID");

    let postback = flow.initiate_login("acme", Some("urn:test:sp"), Some("s")).await.unwrap();
    let (xml, root) = decode_response(&postback);
    assert!(root.attribute("InResponseTo").is_none());
    XmlSignatureValidator::embedded().validate(&xml).unwrap();
}

#[tokio::test]
async fn signing_failure_writes_no_response_audit() {
    let fx = fixture().await;
    let mut broken = fx.idp.clone();
    broken.code = "broken".into();
    broken.id = uuid::Uuid::new_v4();
    broken.private_key = String::new();
    idp_storage::IdentityProviderStore::create_identity_provider(&fx.store, &broken)
        .await
        .unwrap();
    let sp = idp_model::ServiceProvider::new(broken.id, "SP", "urn:test:sp", "https://sp.example.com/acs");
    idp_storage::ServiceProviderStore::create_service_provider(&fx.store, &sp)
        .await
        .unwrap();
    let subject = idp_model::Subject::new(broken.id, "joe@example.com", "Joe", "Bloggs", "hash");
    fx.store.create_subject(&subject).await.unwrap();
    fx.store.add_session(broken.id, subject.id, "joe").await.unwrap();

    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());
    let err = flow
        .login_request("broken", &authn_request("req-6", "urn:test:sp", false), Some("joe"))
        .await
        .unwrap_err();
    assert!(matches!(err, SamlError::MissingPrivateKey));

    let kinds: Vec<TransactionKind> = fx
        .store
        .list_transactions(broken.id)
        .await
        .unwrap()
        .iter()
        .map(|t| t.kind())
        .collect();
    assert_eq!(kinds, [TransactionKind::LoginRequest]);
    let stored = fx.store.get_subject(broken.id, subject.id).await.unwrap().unwrap();
    assert_eq!(stored.session_ids.len(), 1);
}

#[tokio::test]
async fn idp_sign_in_and_out() {
    let fx = fixture().await;
    let flow = SamlFlow::new(&fx.store, &fx.hasher, SamlSettings::default());

    assert_eq!(flow.sign_in(&fx.idp, "jane@example.com", "wrong").await.unwrap(), None);

    let first = flow.sign_in(&fx.idp, "jane@example.com", PASSWORD).await.unwrap().unwrap();
    let second = flow.sign_in(&fx.idp, "JANE@example.com", PASSWORD).await.unwrap().unwrap();
    assert_ne!(first, second);
    let subject = fx.store.get_subject(fx.idp.id, fx.subject.id).await.unwrap().unwrap();
    assert!(subject.session_ids.contains(&first) && subject.session_ids.contains(&second));

    assert!(flow.sign_out(&fx.idp, Some(&first)).await.unwrap());
    let subject = fx.store.get_subject(fx.idp.id, fx.subject.id).await.unwrap().unwrap();
    assert!(subject.session_ids.is_empty());
    assert!(!flow.sign_out(&fx.idp, Some(&second)).await.unwrap());
    assert!(!flow.sign_out(&fx.idp, None).await.unwrap());
}
