//! Wiring of configuration, storage and the Gemini client.

use crate::render;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tesseract_application::chat_controller::LOAD_FAILED_NOTICE;
use tesseract_application::{
    AuxiliaryFlowService, ChatController, Notification, NotificationCallback,
};
use tesseract_core::config::RootConfig;
use tesseract_core::session::{ChatSessionStore, StorageSlot};
use tesseract_core::user::{UserIdentity, UserService};
use tesseract_infrastructure::{
    ConfigBasedUserService, ConfigService, JsonSessionRepository, SecretServiceImpl,
    TesseractPaths,
};
use tesseract_interaction::{AiGateway, GeminiApiClient};

/// Everything resolved before the first command runs.
pub struct AppContext {
    pub paths: TesseractPaths,
    pub config: RootConfig,
    pub identity: UserIdentity,
}

impl AppContext {
    /// Reads config.toml (creating it if missing) and the current identity.
    pub fn load(home: Option<&Path>) -> Result<Self> {
        let paths = TesseractPaths::new(home);
        let config_service =
            ConfigService::from_paths(&paths).context("Failed to resolve config.toml path")?;
        let config = config_service.get_config();
        let identity = ConfigBasedUserService::new(config_service).current_identity();

        Ok(Self {
            paths,
            config,
            identity,
        })
    }

    fn repository(&self) -> Result<Arc<JsonSessionRepository>> {
        let repository = JsonSessionRepository::default_location(&self.paths)
            .context("Failed to resolve chats directory")?;
        tracing::debug!("[AppContext] Chats directory: {:?}", repository.dir());
        Ok(Arc::new(repository))
    }

    /// Opens the current user's chat store without touching the network.
    pub async fn open_store(&self) -> Result<ChatSessionStore> {
        let slot = StorageSlot::for_user(self.config.storage.namespace.as_str(), &self.identity);
        let mut store = ChatSessionStore::load(self.repository()?, slot).await;
        if store.take_load_error().is_some() {
            render::print_notification(Notification::Warning(LOAD_FAILED_NOTICE.to_string()));
        }
        Ok(store)
    }

    /// Builds the Gemini client from secret.json and the `[model]` settings.
    pub async fn completion_client(&self) -> Result<Arc<GeminiApiClient>> {
        let secrets = SecretServiceImpl::from_paths(&self.paths)
            .context("Failed to prepare secret.json")?;
        let client = GeminiApiClient::try_from_secrets(&secrets, &self.config.model)
            .await
            .context("Gemini is not configured")?;
        Ok(Arc::new(client))
    }

    pub async fn flows(&self) -> Result<AuxiliaryFlowService> {
        Ok(AuxiliaryFlowService::new(self.completion_client().await?))
    }

    /// Builds the chat controller for the current user.
    pub async fn controller(&self, notifier: NotificationCallback) -> Result<ChatController> {
        let client = self.completion_client().await?;
        let controller = ChatController::load(
            self.repository()?,
            &self.config.storage.namespace,
            self.identity.clone(),
            AiGateway::new(client.clone()),
            AuxiliaryFlowService::new(client),
        )
        .await
        .with_notifier(notifier)
        .await;
        Ok(controller)
    }
}
