use std::time::Duration;

use axum::{body::Bytes, extract::State, http::StatusCode};
use strum_macros::AsRefStr;
use tracing::info;

use crate::{
    app::Notifications,
    database::{self, APPLICANT_COLLECTION},
    email_client,
    templ_manager::TemplateManager,
    web::{
        types::{DataParsingError, DeserSubmission, ValidSubmission},
        ClientError, WebResult,
    },
    AppState,
};

/// Upper bound for storing a single submission.
pub const PERSIST_TIMEOUT: Duration = Duration::from_secs(5);

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum SubscribeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Validation(#[from] DataParsingError),
    #[error(transparent)]
    Storage(#[from] database::Error),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl SubscribeError {
    /// Every failure ends up as a 500 with the message exposed as is.
    /// A failed notification looks the same even though the submission was already stored.
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use SubscribeError::*;

        let message = self.to_string();
        let client_error = match self {
            Decode(_) | Validation(_) => ClientError::InvalidInput(message),
            Storage(_) | Notification(_) => ClientError::ServiceError(message),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, client_error)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("please send a request body")]
    EmptyBody,
    #[error("error decoding request body. {0}")]
    Malformed(#[source] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("error rendering the notification: {0}")]
    Template(#[from] tera::Error),
    #[error(transparent)]
    EmailClient(#[from] email_client::Error),
}

// ###################################
// ->   API
// ###################################
/// decode -> validate -> persist -> notify
#[tracing::instrument(name = "Receiving a new submission", skip(app_state, body))]
pub async fn subscribe(State(app_state): State<AppState>, body: Bytes) -> WebResult<StatusCode> {
    let submission = decode_submission(&body)?;
    let submission = ValidSubmission::try_from(submission).map_err(SubscribeError::from)?;

    persist_submission(&app_state, &submission).await?;

    if let Some(notifications) = &app_state.notifications {
        send_notification(&app_state.templ_mgr, notifications, &submission)
            .await
            .map_err(SubscribeError::from)?;
    }

    info!("SUCCESS");
    Ok(StatusCode::OK)
}

// ###################################
// ->   HELPERS
// ###################################
fn decode_submission(body: &[u8]) -> Result<DeserSubmission, SubscribeError> {
    if body.is_empty() {
        return Err(DecodeError::EmptyBody.into());
    }

    let submission = serde_json::from_slice(body).map_err(DecodeError::Malformed)?;
    Ok(submission)
}

#[tracing::instrument(
    name = "Saving the submission to the database",
    skip(app_state, submission),
    fields(applicant_email = %submission.email)
)]
async fn persist_submission(
    app_state: &AppState,
    submission: &ValidSubmission,
) -> Result<(), SubscribeError> {
    let document = serde_json::to_value(submission)
        .map_err(|er| database::Error::Other(format!("error encoding the submission. {er}")))?;

    tokio::time::timeout(
        PERSIST_TIMEOUT,
        app_state.store.insert_one(APPLICANT_COLLECTION, document),
    )
    .await
    .map_err(|_| database::Error::Timeout(PERSIST_TIMEOUT))??;

    Ok(())
}

#[tracing::instrument(
    name = "Sending the new applicant notification",
    skip_all,
    fields(recipients = notifications.recipients.len())
)]
async fn send_notification(
    templ_mgr: &TemplateManager,
    notifications: &Notifications,
    submission: &ValidSubmission,
) -> Result<(), NotificationError> {
    let body = templ_mgr.render_notification(submission)?;

    notifications
        .mailer
        .send_plain(&notifications.recipients, &notifications.subject, &body)
        .await?;

    Ok(())
}
