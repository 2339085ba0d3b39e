//! Application state wiring all services together.
//!
//! Services are generic over repository/backend traits; AppState pins them
//! to the concrete infra implementations. One database pool, one completion
//! backend, and one extractor client are constructed here and injected --
//! there are no ambient globals.

use std::sync::Arc;

use clarimed_core::chat::service::ChatLedgerService;
use clarimed_core::quota::QuotaGate;
use clarimed_core::session::SessionOrchestrator;
use clarimed_core::subscription::service::SubscriptionService;
use clarimed_infra::config::{COMPLETION_API_KEY_VAR, MERCHANT_SECRET_VAR, load_secrets};
use clarimed_infra::extract::HttpTextExtractor;
use clarimed_infra::llm::create_backend;
use clarimed_infra::llm::openai_compat::OpenAiCompatBackend;
use clarimed_infra::sqlite::billing::SqliteActivationLog;
use clarimed_infra::sqlite::chat::SqliteChatLedger;
use clarimed_infra::sqlite::pool::DatabasePool;
use clarimed_infra::sqlite::report::SqliteReportStore;
use clarimed_infra::sqlite::token::SqliteTokenStore;
use clarimed_infra::sqlite::user::SqliteUserStore;
use clarimed_types::config::{AppConfig, Secrets};
use clarimed_types::error::ConfigError;
use clarimed_types::plan::PlanCatalog;
use secrecy::ExposeSecret;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteOrchestrator = SessionOrchestrator<
    SqliteUserStore,
    SqliteActivationLog,
    SqliteChatLedger,
    SqliteReportStore,
    HttpTextExtractor,
    OpenAiCompatBackend,
>;

pub type ConcreteSubscriptionService = SubscriptionService<SqliteUserStore, SqliteActivationLog>;

pub type ConcreteChatService = ChatLedgerService<SqliteChatLedger>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub subscription_service: Arc<ConcreteSubscriptionService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub users: Arc<SqliteUserStore>,
    pub tokens: Arc<SqliteTokenStore>,
    pub config: Arc<AppConfig>,
    pub secrets: Secrets,
}

impl AppState {
    /// Initialize the application state: resolve credentials, connect to the
    /// database, wire services.
    ///
    /// A missing completion API key is fatal here rather than surfacing as a
    /// failure on the first question.
    pub async fn init(db_url: &str, config: AppConfig) -> anyhow::Result<Self> {
        let secrets = load_secrets();

        let api_key = secrets
            .completion_api_key
            .as_ref()
            .map(|key| key.expose_secret());
        let backend = create_backend(&config.completion, api_key)
            .map_err(|_| ConfigError::MissingCredential(COMPLETION_API_KEY_VAR.to_string()))?;

        if secrets.merchant_secret.is_none() {
            tracing::warn!(
                "{MERCHANT_SECRET_VAR} not set; payment callbacks will be rejected"
            );
        }

        let db_pool = DatabasePool::new(db_url).await?;

        // The orchestrator owns its own store instances; they all share the
        // one pool underneath.
        let quota = QuotaGate::new(
            SubscriptionService::new(
                SqliteUserStore::new(db_pool.clone()),
                SqliteActivationLog::new(db_pool.clone()),
                PlanCatalog::default(),
            ),
            SqliteChatLedger::new(db_pool.clone()),
        );
        let orchestrator = SessionOrchestrator::new(
            quota,
            SqliteChatLedger::new(db_pool.clone()),
            SqliteReportStore::new(db_pool.clone()),
            HttpTextExtractor::new(&config.extract),
            backend,
            &config,
        );

        // Separate instances for the handlers that bypass the orchestrator
        // (billing, login, session reads).
        let subscription_service = SubscriptionService::new(
            SqliteUserStore::new(db_pool.clone()),
            SqliteActivationLog::new(db_pool.clone()),
            PlanCatalog::default(),
        );
        let chat_service = ChatLedgerService::new(SqliteChatLedger::new(db_pool.clone()));

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            subscription_service: Arc::new(subscription_service),
            chat_service: Arc::new(chat_service),
            users: Arc::new(SqliteUserStore::new(db_pool.clone())),
            tokens: Arc::new(SqliteTokenStore::new(db_pool)),
            config: Arc::new(config),
            secrets,
        })
    }
}
