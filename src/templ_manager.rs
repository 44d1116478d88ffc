use tera::{Context, Tera};
use tracing::info;

use crate::web::types::ValidSubmission;

pub const NOTIFICATION_TEMPLATE: &str = "notification.txt";

/// Holds the templates used for outgoing emails.
/// They are embedded in the binary, so a missing `templates` dir at runtime doesn't matter.
#[derive(Debug)]
pub struct TemplateManager {
    tera: Tera,
}

impl TemplateManager {
    pub fn init() -> Result<Self, tera::Error> {
        info!(
            "{:<20} - Initializing the Template manager",
            "templ manager"
        );
        let mut tera = Tera::default();
        tera.add_raw_template(
            NOTIFICATION_TEMPLATE,
            include_str!("../templates/notification.txt"),
        )?;

        Ok(Self { tera })
    }

    /// Renders the plain text summary of a new submission.
    pub fn render_notification(&self, submission: &ValidSubmission) -> Result<String, tera::Error> {
        let mut ctx = Context::new();
        ctx.insert("email", submission.email.as_ref());
        ctx.insert("answers", &submission.answers);

        self.tera.render(NOTIFICATION_TEMPLATE, &ctx)
    }
}
