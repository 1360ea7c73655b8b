use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use idp_model::{
    CustomAttribute, IdentityProvider, OAuthSession, ProtocolTransaction, ServiceProvider, Subject,
    TransactionKind,
};
use idp_storage::{
    AttributeStore, IdentityProviderStore, OAuthSessionStore, ServiceProviderStore, StorageError,
    StorageResult, SubjectStore, TransactionStore,
};

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    idps: DashMap<Uuid, IdentityProvider>,
    idp_codes: DashMap<String, Uuid>,

    service_providers: RwLock<Vec<ServiceProvider>>,

    subjects: DashMap<Uuid, Subject>,
    subject_emails: DashMap<(Uuid, String), Uuid>,

    attributes: RwLock<Vec<CustomAttribute>>,

    transactions: RwLock<Vec<ProtocolTransaction>>,

    oauth_sessions: DashMap<Uuid, OAuthSession>,
    oauth_codes: DashMap<(Uuid, String), Uuid>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("idps", &self.idps.len())
            .field("subjects", &self.subjects.len())
            .field("transactions", &self.transactions.read().len())
            .field("oauth_sessions", &self.oauth_sessions.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProviderStore for MemoryStore {
    async fn create_identity_provider(&self, idp: &IdentityProvider) -> StorageResult<()> {
        match self.idp_codes.entry(idp.code.to_lowercase()) {
            Entry::Occupied(_) => Err(StorageError::duplicate("IdentityProvider", "code", &idp.code)),
            Entry::Vacant(slot) => {
                slot.insert(idp.id);
                self.idps.insert(idp.id, idp.clone());
                Ok(())
            }
        }
    }

    async fn get_identity_provider(&self, code: &str) -> StorageResult<Option<IdentityProvider>> {
        let Some(id) = self.idp_codes.get(&code.to_lowercase()).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.idps.get(&id).map(|r| r.value().clone()))
    }

    async fn get_identity_provider_by_id(&self, id: Uuid) -> StorageResult<Option<IdentityProvider>> {
        Ok(self.idps.get(&id).map(|r| r.value().clone()))
    }
}

#[async_trait]
impl ServiceProviderStore for MemoryStore {
    async fn create_service_provider(&self, sp: &ServiceProvider) -> StorageResult<()> {
        let mut sps = self.service_providers.write();

        for existing in sps.iter().filter(|s| s.idp_id == sp.idp_id) {
            if existing.entity_id == sp.entity_id {
                return Err(StorageError::duplicate("ServiceProvider", "entity_id", &sp.entity_id));
            }
            if let Some(client_id) = &sp.oauth2_client_id {
                if existing.oauth2_client_id.as_ref() == Some(client_id) {
                    return Err(StorageError::duplicate("ServiceProvider", "oauth2_client_id", client_id));
                }
            }
        }

        sps.push(sp.clone());
        Ok(())
    }

    async fn get_service_provider(&self, idp_id: Uuid, id: Uuid) -> StorageResult<Option<ServiceProvider>> {
        Ok(self
            .service_providers
            .read()
            .iter()
            .find(|s| s.idp_id == idp_id && s.id == id)
            .cloned())
    }

    async fn get_service_provider_by_entity_id(
        &self,
        idp_id: Uuid,
        entity_id: &str,
    ) -> StorageResult<Option<ServiceProvider>> {
        Ok(self
            .service_providers
            .read()
            .iter()
            .find(|s| s.idp_id == idp_id && s.entity_id == entity_id)
            .cloned())
    }

    async fn get_service_provider_by_client_id(
        &self,
        idp_id: Uuid,
        client_id: &str,
    ) -> StorageResult<Option<ServiceProvider>> {
        Ok(self
            .service_providers
            .read()
            .iter()
            .find(|s| s.idp_id == idp_id && s.oauth2_client_id.as_deref() == Some(client_id))
            .cloned())
    }

    async fn get_service_provider_by_credentials(
        &self,
        idp_id: Uuid,
        id: Uuid,
        client_id: &str,
        client_secret: &str,
    ) -> StorageResult<Option<ServiceProvider>> {
        Ok(self
            .service_providers
            .read()
            .iter()
            .find(|s| {
                s.idp_id == idp_id
                    && s.id == id
                    && s.oauth2_client_id.as_deref() == Some(client_id)
                    && s.oauth2_client_secret.as_deref() == Some(client_secret)
            })
            .cloned())
    }

    async fn list_service_providers(&self, idp_id: Uuid) -> StorageResult<Vec<ServiceProvider>> {
        Ok(self
            .service_providers
            .read()
            .iter()
            .filter(|s| s.idp_id == idp_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubjectStore for MemoryStore {
    async fn create_subject(&self, subject: &Subject) -> StorageResult<()> {
        match self.subject_emails.entry((subject.idp_id, subject.email.to_lowercase())) {
            Entry::Occupied(_) => Err(StorageError::duplicate("Subject", "email", &subject.email)),
            Entry::Vacant(slot) => {
                slot.insert(subject.id);
                self.subjects.insert(subject.id, subject.clone());
                Ok(())
            }
        }
    }

    async fn get_subject(&self, idp_id: Uuid, id: Uuid) -> StorageResult<Option<Subject>> {
        Ok(self
            .subjects
            .get(&id)
            .filter(|s| s.idp_id == idp_id)
            .map(|s| s.value().clone()))
    }

    async fn get_subject_by_email(&self, idp_id: Uuid, email: &str) -> StorageResult<Option<Subject>> {
        let Some(id) = self
            .subject_emails
            .get(&(idp_id, email.to_lowercase()))
            .map(|r| *r.value())
        else {
            return Ok(None);
        };
        self.get_subject(idp_id, id).await
    }

    async fn get_subject_by_session(&self, idp_id: Uuid, session_id: &str) -> StorageResult<Option<Subject>> {
        Ok(self
            .subjects
            .iter()
            .find(|s| s.idp_id == idp_id && s.session_ids.contains(session_id))
            .map(|s| s.value().clone()))
    }

    async fn add_session(&self, idp_id: Uuid, subject_id: Uuid, session_id: &str) -> StorageResult<()> {
        let mut subject = self
            .subjects
            .get_mut(&subject_id)
            .filter(|s| s.idp_id == idp_id)
            .ok_or_else(|| StorageError::not_found("Subject", subject_id))?;

        subject.session_ids.insert(session_id.to_string());
        tracing::debug!(subject = %subject_id, sessions = subject.session_ids.len(), "Session added");
        Ok(())
    }

    async fn clear_sessions(&self, idp_id: Uuid, subject_id: Uuid) -> StorageResult<()> {
        let mut subject = self
            .subjects
            .get_mut(&subject_id)
            .filter(|s| s.idp_id == idp_id)
            .ok_or_else(|| StorageError::not_found("Subject", subject_id))?;

        let cleared = subject.session_ids.len();
        subject.session_ids.clear();
        tracing::debug!(subject = %subject_id, cleared, "Sessions cleared");
        Ok(())
    }
}

#[async_trait]
impl AttributeStore for MemoryStore {
    async fn create_attribute(&self, attribute: &CustomAttribute) -> StorageResult<()> {
        self.attributes.write().push(attribute.clone());
        Ok(())
    }

    async fn list_attributes(&self, idp_id: Uuid) -> StorageResult<Vec<CustomAttribute>> {
        Ok(self
            .attributes
            .read()
            .iter()
            .filter(|a| a.idp_id == idp_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn record_transaction(&self, transaction: &ProtocolTransaction) -> StorageResult<()> {
        self.transactions.write().push(transaction.clone());
        Ok(())
    }

    async fn find_transaction(
        &self,
        idp_id: Uuid,
        kind: TransactionKind,
        id: &str,
    ) -> StorageResult<Option<ProtocolTransaction>> {
        Ok(self
            .transactions
            .read()
            .iter()
            .rev()
            .find(|t| t.idp_id == idp_id && t.kind() == kind && t.id == id)
            .cloned())
    }

    async fn list_transactions(&self, idp_id: Uuid) -> StorageResult<Vec<ProtocolTransaction>> {
        Ok(self
            .transactions
            .read()
            .iter()
            .filter(|t| t.idp_id == idp_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OAuthSessionStore for MemoryStore {
    async fn create_oauth_session(&self, session: &OAuthSession) -> StorageResult<()> {
        match self.oauth_codes.entry((session.idp_id, session.code.clone())) {
            Entry::Occupied(_) => Err(StorageError::duplicate("OAuthSession", "code", "<redacted>")),
            Entry::Vacant(slot) => {
                slot.insert(session.id);
                self.oauth_sessions.insert(session.id, session.clone());
                Ok(())
            }
        }
    }

    async fn get_oauth_session_by_code(&self, idp_id: Uuid, code: &str) -> StorageResult<Option<OAuthSession>> {
        let Some(id) = self
            .oauth_codes
            .get(&(idp_id, code.to_string()))
            .map(|r| *r.value())
        else {
            return Ok(None);
        };
        Ok(self.oauth_sessions.get(&id).map(|s| s.value().clone()))
    }

    async fn get_oauth_session_by_access_token(
        &self,
        idp_id: Uuid,
        access_token: &str,
    ) -> StorageResult<Option<OAuthSession>> {
        Ok(self
            .oauth_sessions
            .iter()
            .find(|s| s.idp_id == idp_id && s.access_token.as_deref() == Some(access_token))
            .map(|s| s.value().clone()))
    }

    async fn redeem_oauth_session(&self, idp_id: Uuid, id: Uuid, access_token: &str) -> StorageResult<bool> {
        let mut session = self
            .oauth_sessions
            .get_mut(&id)
            .filter(|s| s.idp_id == idp_id)
            .ok_or_else(|| StorageError::not_found("OAuthSession", id))?;

        if session.consumed {
            return Ok(false);
        }
        session.consumed = true;
        session.access_token = Some(access_token.to_string());
        Ok(true)
    }
}
