use crate::document::Document;
use crate::domain::loan::LoanRecord;
use crate::error::UploadError;
use crate::extraction::LoanExtractor;
use crate::session::{SessionAction, SessionState};
use std::path::Path;
use tokio::sync::RwLock;

/// Shared handle to the session. Every transition runs under the write lock,
/// so concurrent uploads append without losing records.
#[derive(Debug, Default)]
pub struct SessionStore {
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dispatch(&self, action: SessionAction) {
        let mut guard = self.state.write().await;
        let current = std::mem::take(&mut *guard);
        *guard = current.apply(action);
    }

    /// Applies `action` only if no logout happened since `generation` was read.
    pub async fn dispatch_in(&self, generation: u64, action: SessionAction) -> bool {
        let mut guard = self.state.write().await;
        if guard.generation() != generation {
            return false;
        }
        let current = std::mem::take(&mut *guard);
        *guard = current.apply(action);
        true
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation()
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }
}

/// Analyzes one document and, on success, adds it to the session as the
/// selected record. On failure the session is left untouched. A record whose
/// session was logged out mid-analysis is returned but not added.
pub async fn upload(
    store: &SessionStore,
    extractor: &LoanExtractor,
    document: Document,
) -> Result<LoanRecord, UploadError> {
    let generation = store.generation().await;
    let record = extractor.extract_document(document).await?;
    let added = store
        .dispatch_in(generation, SessionAction::RecordAdded(record.clone()))
        .await;
    if !added {
        tracing::warn!(loan_id = %record.id, "session ended during analysis; record not kept");
    }
    Ok(record)
}

/// Reads `path` and uploads it.
pub async fn upload_file(
    store: &SessionStore,
    extractor: &LoanExtractor,
    path: &Path,
    mime_type: Option<&str>,
) -> Result<LoanRecord, UploadError> {
    let document = Document::read_from_path(path, mime_type).await?;
    upload(store, extractor, document).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EXTRACTION_MESSAGE, FILE_READ_MESSAGE};
    use crate::extraction::tests::{acme_response, StubModel, PNG_BYTES};
    use crate::llm::{DocumentModel, ExtractionRequest, Provider};
    use crate::session::user::UserProfile;
    use std::sync::Arc;

    fn png() -> Document {
        Document::new(PNG_BYTES.to_vec(), "image/png")
    }

    #[tokio::test]
    async fn successful_upload_prepends_and_selects() {
        let store = SessionStore::new();
        let extractor = LoanExtractor::new(StubModel::replying(acme_response()));

        let first = upload(&store, &extractor, png()).await.unwrap();
        let second = upload(&store, &extractor, png()).await.unwrap();

        let state = store.snapshot().await;
        assert_eq!(state.loans().len(), 2);
        assert_eq!(state.loans()[0].id, second.id);
        assert_eq!(state.loans()[1].id, first.id);
        assert_eq!(state.selected().unwrap().id, second.id);
    }

    #[tokio::test]
    async fn failed_upload_leaves_session_unchanged() {
        let store = SessionStore::new();
        let ok = LoanExtractor::new(StubModel::replying(acme_response()));
        let existing = upload(&store, &ok, png()).await.unwrap();

        let failing = LoanExtractor::new(StubModel::failing("connection refused"));
        let err = upload(&store, &failing, png()).await.unwrap_err();
        assert!(matches!(err, UploadError::Extraction(_)));
        assert_eq!(err.to_string(), EXTRACTION_MESSAGE);

        let state = store.snapshot().await;
        assert_eq!(state.loans().len(), 1);
        assert_eq!(state.loans()[0].id, existing.id);
        assert_eq!(state.selected().unwrap().id, existing.id);
    }

    #[tokio::test]
    async fn unreadable_file_never_reaches_the_model() {
        let store = SessionStore::new();
        let model = StubModel::replying(acme_response());
        let extractor = LoanExtractor::new(model);

        let err = upload_file(&store, &extractor, Path::new("/no/such/loan.pdf"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::FileRead(_)));
        assert_eq!(err.to_string(), FILE_READ_MESSAGE);
        assert!(store.snapshot().await.loans().is_empty());
    }

    /// Logs the session out while the model is still answering.
    struct LogoutDuringCall {
        store: Arc<SessionStore>,
    }

    #[async_trait::async_trait]
    impl DocumentModel for LogoutDuringCall {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn generate(&self, _request: &ExtractionRequest) -> anyhow::Result<String> {
            self.store.dispatch(SessionAction::LoggedOut).await;
            Ok(acme_response().to_string())
        }
    }

    #[tokio::test]
    async fn logout_during_analysis_discards_record() {
        let store = Arc::new(SessionStore::new());
        let user = UserProfile {
            email: "a@b.c".to_string(),
            display_name: "a".to_string(),
        };
        store.dispatch(SessionAction::LoggedIn(user)).await;

        let extractor = LoanExtractor::new(Arc::new(LogoutDuringCall {
            store: store.clone(),
        }));
        let record = upload(&store, &extractor, png()).await.unwrap();
        assert_eq!(record.lender_name, "Acme Bank");

        let state = store.snapshot().await;
        assert!(state.user().is_none());
        assert!(state.loans().is_empty());
        assert!(state.selected().is_none());
    }

    #[tokio::test]
    async fn dispatch_in_rejects_stale_generation() {
        let store = SessionStore::new();
        let before = store.generation().await;
        store.dispatch(SessionAction::LoggedOut).await;
        assert!(!store.dispatch_in(before, SessionAction::SelectionCleared).await);
        let now = store.generation().await;
        assert!(store.dispatch_in(now, SessionAction::SelectionCleared).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_uploads_all_land() {
        let store = Arc::new(SessionStore::new());
        let extractor = LoanExtractor::new(StubModel::replying(acme_response()));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            let extractor = extractor.clone();
            handles.push(tokio::spawn(async move {
                upload(&store, &extractor, png()).await.map(|r| r.id)
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }

        let state = store.snapshot().await;
        assert_eq!(state.loans().len(), 32);
        for id in ids {
            assert!(state.find(id).is_some());
        }
    }
}
