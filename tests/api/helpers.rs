//! Spawns the real router on a random port, backed by in-memory test doubles.
use std::{
    collections::HashSet,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use axum::http::HeaderValue;
use enlist::{
    app::Notifications,
    database::{self, DocumentStore},
    email_client::{self, Mailer},
    init_dbg_tracing,
    templ_manager::TemplateManager,
    web::types::ValidEmail,
    App, AppState,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;

/// Trying to bind port 0 will trigger an OS scan for an available port
/// which will then be bound to the application.
const TEST_SOCK_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 0);

pub const ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "https://codercatclub.github.io",
    "https://codercat.tk",
];

/// Set `TEST_LOG` to see the server logs.
fn init_test_subscriber() {
    static SUBSCRIBER: OnceLock<()> = OnceLock::new();
    SUBSCRIBER.get_or_init(|| {
        if std::env::var("TEST_LOG").is_ok() {
            init_dbg_tracing();
        }
    });
}

// ###################################
// ->   TEST DOUBLES
// ###################################
/// Keeps every inserted document in memory.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<(String, Value)>>,
    delay: Option<Duration>,
    failure: Option<String>,
}

impl MemoryStore {
    pub fn documents(&self) -> Vec<(String, Value)> {
        self.documents
            .lock()
            .map(|docs| docs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: &str, document: Value) -> database::Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = &self.failure {
            return Err(database::Error::Other(failure.clone()));
        }

        self.documents
            .lock()
            .map_err(|er| database::Error::Other(er.to_string()))?
            .push((collection.to_string(), document));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Records every email instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_plain(
        &self,
        recipients: &[ValidEmail],
        subject: &str,
        body: &str,
    ) -> email_client::Result<()> {
        if self.fail {
            return Err(email_client::Error::NoRecipients);
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentEmail {
                recipients: recipients.iter().map(ToString::to_string).collect(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        }
        Ok(())
    }
}

// ###################################
// ->   TEST APP
// ###################################
#[derive(Default)]
pub struct TestAppOptions {
    pub recipients: Vec<&'static str>,
    pub store_delay: Option<Duration>,
    pub store_failure: Option<&'static str>,
    pub mailer_fails: bool,
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub http_client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    /// An app without notification recipients.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(TestAppOptions::default()).await
    }

    pub async fn spawn_with(options: TestAppOptions) -> Result<Self> {
        init_test_subscriber();

        let store = Arc::new(MemoryStore {
            delay: options.store_delay,
            failure: options.store_failure.map(str::to_string),
            ..Default::default()
        });
        let mailer = Arc::new(RecordingMailer {
            fail: options.mailer_fails,
            ..Default::default()
        });

        let notifications = if options.recipients.is_empty() {
            None
        } else {
            let recipients = options
                .recipients
                .iter()
                .map(ValidEmail::parse)
                .collect::<Result<Vec<_>, _>>()?;
            Some(Notifications::new(
                mailer.clone(),
                recipients,
                "New applicant".to_string(),
            ))
        };

        let app_state = AppState::new(store.clone(), TemplateManager::init()?, notifications);
        let allowed_origins = ALLOWED_ORIGINS
            .into_iter()
            .map(HeaderValue::from_static)
            .collect::<HashSet<_>>();

        let listener = TcpListener::bind(TEST_SOCK_ADDR).await?;
        let addr = listener.local_addr()?;
        info!("Listening on {addr}");

        tokio::spawn(enlist::serve(App::new(app_state, listener, allowed_origins)));

        Ok(TestApp {
            addr,
            http_client: reqwest::Client::new(),
            store,
            mailer,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn post_subscribe(&self, body: impl Into<reqwest::Body>) -> Result<reqwest::Response> {
        let res = self
            .http_client
            .post(self.url("/v1/subscribe"))
            .body(body)
            .send()
            .await?;
        Ok(res)
    }

    pub async fn post_subscribe_json(&self, body: &Value) -> Result<reqwest::Response> {
        let res = self
            .http_client
            .post(self.url("/v1/subscribe"))
            .json(body)
            .send()
            .await?;
        Ok(res)
    }
}

/// Reads the `{"error": ...}` message out of a failed response.
pub async fn error_message(res: reqwest::Response) -> Result<String> {
    let body: Value = res.json().await?;
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("no error message in: {body}"))?;
    Ok(message.to_string())
}
