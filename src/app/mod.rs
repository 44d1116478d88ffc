pub mod serve;

// re-export
pub use serve::serve;

use std::{collections::HashSet, net::SocketAddr, sync::Arc};

use axum::http::HeaderValue;
use derive_more::Deref;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    config::AppConfig,
    database::{DbManager, DocumentStore},
    email_client::{EmailClient, Mailer},
    templ_manager::TemplateManager,
    web::types::ValidEmail,
    Result,
};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
    pub allowed_origins: HashSet<HeaderValue>,
}
impl App {
    pub fn new(
        app_state: AppState,
        listener: TcpListener,
        allowed_origins: HashSet<HeaderValue>,
    ) -> Self {
        App {
            app_state,
            listener,
            allowed_origins,
        }
    }

    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let AppConfig {
            net_config,
            db_config,
            email_config,
            cors_config,
        } = config;

        let notifications = match email_config.valid_recipients()? {
            Some(recipients) => {
                let email_client = EmailClient::new(email_config.valid_sender()?, &email_config)?;
                info!(
                    "{:<20} - Sending notifications to {} recipient(s)",
                    "notifications",
                    recipients.len()
                );
                Some(Notifications::new(
                    Arc::new(email_client),
                    recipients,
                    email_config.subject,
                ))
            }
            None => {
                info!("{:<20} - No recipients, notifications disabled", "notifications");
                None
            }
        };

        let dm = DbManager::init(&db_config).await?;
        dm.migrate().await?;
        let tm = TemplateManager::init()?;

        let app_state = AppState::new(Arc::new(dm), tm, notifications);
        let allowed_origins = cors_config.origin_set()?;

        let addr = SocketAddr::from((net_config.host, net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener, allowed_origins);
        Ok(app)
    }
}

/// Where and how to announce new submissions.
/// Only exists if there is at least one recipient configured.
pub struct Notifications {
    pub mailer: Arc<dyn Mailer>,
    pub recipients: Vec<ValidEmail>,
    pub subject: String,
}

impl Notifications {
    pub fn new(mailer: Arc<dyn Mailer>, recipients: Vec<ValidEmail>, subject: String) -> Self {
        Notifications {
            mailer,
            recipients,
            subject,
        }
    }
}

pub struct InternalState {
    pub store: Arc<dyn DocumentStore>,
    pub templ_mgr: TemplateManager,
    pub notifications: Option<Notifications>,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        templ_mgr: TemplateManager,
        notifications: Option<Notifications>,
    ) -> Self {
        AppState(Arc::new(InternalState {
            store,
            templ_mgr,
            notifications,
        }))
    }
}
