#[cfg(test)]
mod tests {
    use crate::error::{Result, TesseractError};
    use crate::session::message::Message;
    use crate::session::model::{ChatSession, DEFAULT_SESSION_TITLE};
    use crate::session::repository::{SessionRepository, StorageSlot};
    use crate::session::store::ChatSessionStore;
    use crate::user::UserIdentity;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // Mock SessionRepository for testing
    #[derive(Default)]
    struct MockSessionRepository {
        slots: Mutex<HashMap<String, Vec<ChatSession>>>,
        corrupt: AtomicBool,
        fail_writes: AtomicBool,
        saves: AtomicUsize,
    }

    impl MockSessionRepository {
        fn new() -> Self {
            Self::default()
        }

        fn with_sessions(slot: &StorageSlot, sessions: Vec<ChatSession>) -> Self {
            let repo = Self::new();
            repo.slots.lock().unwrap().insert(slot.key(), sessions);
            repo
        }

        fn stored(&self, slot: &StorageSlot) -> Vec<ChatSession> {
            self.slots
                .lock()
                .unwrap()
                .get(&slot.key())
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl SessionRepository for MockSessionRepository {
        async fn load(&self, slot: &StorageSlot) -> Result<Vec<ChatSession>> {
            if self.corrupt.load(Ordering::SeqCst) {
                return Err(TesseractError::Serialization {
                    format: "JSON".to_string(),
                    message: "expected value at line 1 column 1".to_string(),
                });
            }
            Ok(self.stored(slot))
        }

        async fn save(&self, slot: &StorageSlot, sessions: &[ChatSession]) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(TesseractError::storage("quota exceeded"));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.slots
                .lock()
                .unwrap()
                .insert(slot.key(), sessions.to_vec());
            Ok(())
        }
    }

    fn guest_slot() -> StorageSlot {
        StorageSlot::new("tesseract-chats", "guest")
    }

    #[tokio::test]
    async fn test_load_empty_slot_creates_session() {
        let repo = Arc::new(MockSessionRepository::new());
        let store = ChatSessionStore::load(repo.clone(), guest_slot()).await;

        assert_eq!(store.sessions().len(), 1);
        let active = store.active_session().unwrap();
        assert_eq!(active.title, DEFAULT_SESSION_TITLE);
        assert!(active.is_empty());
        // The fresh session is written through
        assert_eq!(repo.stored(&guest_slot()).len(), 1);
    }

    #[tokio::test]
    async fn test_load_activates_first_stored_session() {
        let first = ChatSession::new();
        let second = ChatSession::new();
        let repo = Arc::new(MockSessionRepository::with_sessions(
            &guest_slot(),
            vec![first.clone(), second],
        ));

        let store = ChatSessionStore::load(repo, guest_slot()).await;

        assert_eq!(store.sessions().len(), 2);
        assert_eq!(store.active_session_id(), Some(first.id.as_str()));
    }

    #[tokio::test]
    async fn test_unreadable_slot_is_not_fatal() {
        let repo = Arc::new(MockSessionRepository::new());
        repo.corrupt.store(true, Ordering::SeqCst);

        let mut store = ChatSessionStore::load(repo, guest_slot()).await;

        assert_eq!(store.sessions().len(), 1);
        assert!(store.active_session().unwrap().is_empty());
        assert!(store.take_load_error().unwrap().is_serialization());
        assert!(store.take_load_error().is_none());
    }

    #[tokio::test]
    async fn test_readable_slot_clears_load_error() {
        let repo = Arc::new(MockSessionRepository::new());
        repo.corrupt.store(true, Ordering::SeqCst);
        let mut store = ChatSessionStore::load(repo.clone(), guest_slot()).await;

        repo.corrupt.store(false, Ordering::SeqCst);
        store
            .switch_slot(StorageSlot::new("tesseract-chats", "uid-1"))
            .await;

        assert!(store.take_load_error().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_dropped_on_load() {
        let session = ChatSession::new();
        let repo = Arc::new(MockSessionRepository::with_sessions(
            &guest_slot(),
            vec![session.clone(), session.clone()],
        ));

        let store = ChatSessionStore::load(repo, guest_slot()).await;
        assert_eq!(store.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_create_session_prepends_and_activates() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo.clone(), guest_slot()).await;
        let original = store.active_session_id().unwrap().to_string();

        let created = store.create_session().await;

        assert_eq!(store.sessions()[0].id, created);
        assert_eq!(store.sessions()[1].id, original);
        assert_eq!(store.active_session_id(), Some(created.as_str()));
        assert_eq!(repo.stored(&guest_slot()).len(), 2);
    }

    #[tokio::test]
    async fn test_switch_session() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo, guest_slot()).await;
        let first = store.active_session_id().unwrap().to_string();
        store.create_session().await;

        store.switch_session(&first).unwrap();
        assert_eq!(store.active_session_id(), Some(first.as_str()));

        let err = store.switch_session("chat-missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.active_session_id(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn test_delete_only_session_creates_new_chat() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo.clone(), guest_slot()).await;
        let only = store.active_session_id().unwrap().to_string();
        store.append_to_active(Message::user("bye")).await.unwrap();

        store.delete_session(&only).await.unwrap();

        assert_eq!(store.sessions().len(), 1);
        let active = store.active_session().unwrap();
        assert_ne!(active.id, only);
        assert_eq!(active.title, "New Chat");
        assert!(active.is_empty());
        assert_eq!(repo.stored(&guest_slot()), store.sessions().to_vec());
    }

    #[tokio::test]
    async fn test_delete_active_moves_to_first_remaining() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo, guest_slot()).await;
        let older = store.active_session_id().unwrap().to_string();
        let newer = store.create_session().await;

        store.delete_session(&newer).await.unwrap();

        assert_eq!(store.active_session_id(), Some(older.as_str()));
        assert_eq!(store.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_inactive_keeps_active() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo, guest_slot()).await;
        let older = store.active_session_id().unwrap().to_string();
        let newer = store.create_session().await;

        store.delete_session(&older).await.unwrap();

        assert_eq!(store.active_session_id(), Some(newer.as_str()));
        assert!(store.delete_session(&older).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_clear_all_twice_leaves_one_empty_session() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo.clone(), guest_slot()).await;
        store.create_session().await;
        store.append_to_active(Message::user("hi")).await.unwrap();

        store.clear_all().await;
        let id = store.clear_all().await;

        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.active_session_id(), Some(id.as_str()));
        assert!(store.active_session().unwrap().is_empty());
        assert_eq!(repo.stored(&guest_slot()).len(), 1);
    }

    #[tokio::test]
    async fn test_messages_are_append_only() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo, guest_slot()).await;
        let tracked = store.active_session_id().unwrap().to_string();

        let mut previous_len = 0;
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            let message = if i % 2 == 0 {
                Message::user(*text)
            } else {
                Message::model(*text)
            };
            store.append_message(&tracked, message).await.unwrap();
            // Unrelated mutations must not shrink the tracked session
            store.create_session().await;
            store.rename_session(&tracked, text).await;
            store.switch_session(&tracked).unwrap();

            let len = store.active_session().unwrap().len();
            assert!(len > previous_len);
            previous_len = len;
        }

        let contents: Vec<_> = store
            .active_session()
            .unwrap()
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_rename_merges_by_id() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo.clone(), guest_slot()).await;
        let target = store.active_session_id().unwrap().to_string();
        // Session moves from index 0 to index 1 before the title arrives
        store.create_session().await;

        assert!(store.rename_session(&target, "  Rust Traits  ").await);

        assert_eq!(store.get(&target).unwrap().title, "Rust Traits");
        assert_eq!(store.sessions()[0].title, "New Chat");
        let stored = repo.stored(&guest_slot());
        assert_eq!(stored[1].title, "Rust Traits");
    }

    #[tokio::test]
    async fn test_rename_of_deleted_session_is_ignored() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo, guest_slot()).await;
        let target = store.active_session_id().unwrap().to_string();
        store.delete_session(&target).await.unwrap();

        assert!(!store.rename_session(&target, "Late title").await);
        let survivor = store.sessions()[0].id.clone();
        assert!(!store.rename_session(&survivor, "   ").await);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_not_fatal() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo.clone(), guest_slot()).await;
        repo.fail_writes.store(true, Ordering::SeqCst);

        let id = store.append_to_active(Message::user("hi")).await.unwrap();

        assert_eq!(store.get(&id).unwrap().len(), 1);
        let err = store.take_persist_error().unwrap();
        assert!(err.to_string().contains("quota exceeded"));
        assert!(store.take_persist_error().is_none());
    }

    #[tokio::test]
    async fn test_switch_slot_isolates_users() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo.clone(), guest_slot()).await;
        store.append_to_active(Message::user("guest says hi")).await.unwrap();

        let user_slot = StorageSlot::new("tesseract-chats", "uid-1");
        store.switch_slot(user_slot.clone()).await;

        assert_eq!(store.slot(), &user_slot);
        assert!(store.active_session().unwrap().is_empty());
        assert_eq!(repo.stored(&guest_slot())[0].len(), 1);

        store.switch_slot(guest_slot()).await;
        assert_eq!(store.active_session().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_switch_user_uses_identity_slot() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo.clone(), guest_slot()).await;

        store
            .switch_user(&UserIdentity::authenticated("uid-9", None))
            .await;
        assert_eq!(store.slot().key(), "tesseract-chats-uid-9");

        store.switch_user(&UserIdentity::guest()).await;
        assert_eq!(store.slot(), &guest_slot());
    }

    #[tokio::test]
    async fn test_every_mutation_writes_through() {
        let repo = Arc::new(MockSessionRepository::new());
        let mut store = ChatSessionStore::load(repo.clone(), guest_slot()).await;
        let baseline = repo.saves.load(Ordering::SeqCst);

        let id = store.create_session().await;
        store.append_message(&id, Message::user("a")).await.unwrap();
        store.rename_session(&id, "A").await;
        store.switch_session(&id).unwrap();

        // switch_session does not touch the collection
        assert_eq!(repo.saves.load(Ordering::SeqCst), baseline + 3);
        assert_eq!(repo.stored(&guest_slot()), store.sessions().to_vec());
    }
}
