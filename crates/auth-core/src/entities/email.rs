//! Email template and email log entities

use chrono::{DateTime, Utc};

/// A stored, localized mail template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub id: i64,
    pub name: String,
    pub lang: String,
    pub subject: String,
    pub content: String,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl EmailTemplate {
    /// Render subject and content, substituting `{key}` placeholders
    pub fn render(&self, vars: &[(&str, &str)]) -> (String, String) {
        (
            render_placeholders(&self.subject, vars),
            render_placeholders(&self.content, vars),
        )
    }
}

/// Replace every `{key}` in `text` with its value. Unknown placeholders stay.
pub fn render_placeholders(text: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(text.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

/// Delivery outcome recorded for each mail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum EmailStatus {
    Failed = 0,
    Sent = 1,
}

impl From<EmailStatus> for i16 {
    fn from(status: EmailStatus) -> Self {
        status as i16
    }
}

/// A mail delivery record waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmailLog {
    pub to_email: String,
    pub subject: String,
    pub content: String,
    pub template_name: Option<String>,
    pub status: EmailStatus,
    pub error_msg: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_placeholders() {
        let out = render_placeholders(
            "Code {code} for {app_name}, {code} again, {unknown}",
            &[("code", "123456"), ("app_name", "F.st")],
        );
        assert_eq!(out, "Code 123456 for F.st, 123456 again, {unknown}");
    }

    #[test]
    fn test_template_render() {
        let template = EmailTemplate {
            id: 1,
            name: "register_code".to_string(),
            lang: "en-US".to_string(),
            subject: "[{app_name}] Registration Code".to_string(),
            content: "<b>{code}</b> valid {expire_minutes} min".to_string(),
            enabled: true,
            updated_at: Utc::now(),
        };
        let (subject, content) = template.render(&[
            ("app_name", "F.st"),
            ("code", "000042"),
            ("expire_minutes", "60"),
        ]);
        assert_eq!(subject, "[F.st] Registration Code");
        assert_eq!(content, "<b>000042</b> valid 60 min");
    }
}
