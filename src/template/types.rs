use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notification::Channel;

use super::substitution::render;

/// A named, reusable subject/body pattern.
///
/// Saving a template under an existing name replaces it; there is no versioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Unique template name
    pub name: String,

    /// Advisory channel; not enforced against notifications rendered from it
    pub channel: String,

    /// Subject text with {{path}} placeholders
    pub subject_template: String,

    /// Body text with {{path}} placeholders
    pub body_template: String,

    /// When this version of the template was saved
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        channel: Channel,
        subject_template: impl Into<String>,
        body_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            channel: channel.as_str().to_string(),
            subject_template: subject_template.into(),
            body_template: body_template.into(),
            created_at: Utc::now(),
        }
    }

    /// Render subject and body against `context`
    pub fn render(&self, context: &serde_json::Value) -> RenderedTemplate {
        RenderedTemplate {
            subject: render(&self.subject_template, context),
            body: render(&self.body_template, context),
            channel: self.channel.clone(),
        }
    }
}

/// A rendered template ready for notification creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body: String,
    /// Channel carried over from the template
    pub channel: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_subject_and_body() {
        let template = Template::new(
            "welcome",
            Channel::Email,
            "Welcome {{name}}!",
            "Hello {{name}}, your code is {{code}}.",
        );

        let rendered = template.render(&json!({"name": "Alice", "code": "XYZ"}));
        assert_eq!(rendered.subject, "Welcome Alice!");
        assert_eq!(rendered.body, "Hello Alice, your code is XYZ.");
        assert_eq!(rendered.channel, "email");
    }

    #[test]
    fn test_render_missing_variable_in_body() {
        let template = Template::new("partial", Channel::Slack, "Hi {{name}}", "Your ref is {{ref}}");

        let rendered = template.render(&json!({"name": "Bob"}));
        assert_eq!(rendered.subject, "Hi Bob");
        assert_eq!(rendered.body, "Your ref is {{ref}}");
    }
}
