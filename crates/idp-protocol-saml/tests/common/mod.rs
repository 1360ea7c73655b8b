#![allow(dead_code)]

use idp_auth::{PasswordHasherService, PasswordPolicy};
use idp_model::{CustomAttribute, IdentityProvider, ServiceProvider, Subject};
use idp_protocol_saml::bindings::HttpRedirectBinding;
use idp_storage::{AttributeStore, IdentityProviderStore, ServiceProviderStore, SubjectStore};
use idp_storage_memory::MemoryStore;

pub const KEY: &str = include_str!("../fixtures/idp-key.pem");
pub const CERT: &str = include_str!("../fixtures/idp-cert.pem");
pub const PASSWORD: &str = "correct horse battery staple";

pub struct Fixture {
    pub store: MemoryStore,
    pub hasher: PasswordHasherService,
    pub idp: IdentityProvider,
    pub sp: ServiceProvider,
    pub subject: Subject,
}

pub async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let hasher = PasswordHasherService::new(PasswordPolicy::for_testing());

    let idp = IdentityProvider::new("acme", "Acme Corp", KEY, CERT);
    store.create_identity_provider(&idp).await.unwrap();

    let sp = ServiceProvider::new(idp.id, "Test SP", "urn:test:sp", "https://sp.example.com/acs")
        .with_recipient("https://sp.example.com/recipient")
        .with_service_url("https://sp.example.com/logged-out");
    store.create_service_provider(&sp).await.unwrap();

    let department = CustomAttribute::new(idp.id, "department").with_mapping("dept");
    store.create_attribute(&department).await.unwrap();

    let subject = Subject::new(idp.id, "Jane@Example.com", "Jane", "Doe", hasher.hash(PASSWORD).unwrap())
        .with_attribute(department.id, "R&D");
    store.create_subject(&subject).await.unwrap();

    Fixture {
        store,
        hasher,
        idp,
        sp,
        subject,
    }
}

pub fn authn_request(id: &str, issuer: &str, force_authn: bool) -> String {
    let xml = format!(
        r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{id}" Version="2.0" ForceAuthn="{force_authn}" AssertionConsumerServiceURL="https://sp.example.com/acs"><saml:Issuer>{issuer}</saml:Issuer></samlp:AuthnRequest>"#
    );
    HttpRedirectBinding::encode(&xml).unwrap()
}

pub fn logout_request(id: &str, issuer: &str, name_id: &str) -> String {
    let xml = format!(
        r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{id}" Version="2.0"><saml:Issuer>{issuer}</saml:Issuer><saml:NameID>{name_id}</saml:NameID></samlp:LogoutRequest>"#
    );
    HttpRedirectBinding::encode(&xml).unwrap()
}
