//! Mail dispatch
//!
//! `MailTransport` is the delivery abstraction. `SmtpMailTransport` sends over
//! SMTP (implicit TLS or opportunistic STARTTLS) and `LogMailTransport` only
//! logs (development). `MailDispatcher` renders the stored template for the
//! requested language (falling back to built-in bilingual texts), sends under
//! a timeout, and records the outcome in the email log from a detached task.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth_common::MailConfig;
use auth_core::entities::{render_placeholders, EmailStatus, NewEmailLog};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, instrument, warn};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Upper bound for one delivery attempt
pub const MAIL_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Template names known to the dispatcher
pub const REGISTER_CODE_TEMPLATE: &str = "register_code";
pub const RESET_PASSWORD_TEMPLATE: &str = "reset_password";

/// Language tags templates are stored under
pub const LANG_ZH_CN: &str = "zh-CN";
pub const LANG_EN_US: &str = "en-US";

/// A fully rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    /// HTML body
    pub body: String,
}

/// Mail delivery errors
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("no sender address configured")]
    MissingSender,

    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Mail delivery abstraction
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver a message or return an error describing why it failed
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Development transport that logs instead of sending
#[derive(Debug, Clone, Default)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        info!(to = %mail.to, subject = %mail.subject, "Mail logged instead of sent");
        Ok(())
    }
}

/// SMTP transport
///
/// Non-ASCII sender names and subjects are RFC 2047 encoded by the message
/// builder.
#[derive(Clone)]
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    from: Mailbox,
}

impl SmtpMailTransport {
    /// Build from the SMTP settings. The display name falls back to `app_name`.
    pub fn from_config(config: &MailConfig, app_name: &str) -> Result<Self, MailError> {
        let host = config.smtp_host.as_deref().unwrap_or_default();
        let address: Address = config
            .sender_address()
            .ok_or(MailError::MissingSender)?
            .parse()?;
        let name = config
            .from_name
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| app_name.to_string());

        let builder = if config.smtp_implicit_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .tls(Tls::Opportunistic(TlsParameters::new(host.to_string())?))
        };
        let mut builder = builder
            .port(config.port())
            .timeout(Some(MAIL_SEND_TIMEOUT));
        if let Some(user) = config.smtp_username.clone() {
            let password = config.smtp_password.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(user, password));
        }

        Ok(Self {
            transport: builder.build(),
            host: host.to_string(),
            from: Mailbox::new(Some(name), address),
        })
    }

    /// Assemble the MIME message for `mail`
    fn build_message(&self, mail: &OutgoingMail) -> Result<Message, MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.body.clone())?;
        Ok(message)
    }
}

impl std::fmt::Debug for SmtpMailTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailTransport")
            .field("host", &self.host)
            .field("from", &self.from.email)
            .finish()
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    #[instrument(skip(self, mail), fields(to = %mail.to, host = %self.host))]
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = self.build_message(mail)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Pick the transport the configuration asks for, if any.
///
/// SMTP wins over log-only mode. With neither, or with unusable SMTP
/// settings, mail is unavailable.
pub fn transport_from_config(
    config: &MailConfig,
    app_name: &str,
) -> Option<Arc<dyn MailTransport>> {
    if config.has_smtp() {
        return match SmtpMailTransport::from_config(config, app_name) {
            Ok(transport) => Some(Arc::new(transport)),
            Err(e) => {
                error!(error = %e, "SMTP settings unusable; mail disabled");
                None
            }
        };
    }
    if config.log_only {
        warn!("MAIL_LOG_ONLY is set; outgoing mail will only be logged");
        return Some(Arc::new(LogMailTransport));
    }
    None
}

/// Map the request `lang` field, then `Accept-Language`, to a template language
pub fn resolve_language(lang: Option<&str>, accept_language: Option<&str>) -> &'static str {
    let requested = lang
        .filter(|l| !l.trim().is_empty())
        .or(accept_language.filter(|l| !l.trim().is_empty()));

    match requested {
        Some(l) if l.to_ascii_lowercase().contains("zh") => LANG_ZH_CN,
        _ => LANG_EN_US,
    }
}

/// Built-in (subject, body) used when no enabled template is stored
fn fallback_template(name: &str, lang: &str) -> (&'static str, &'static str) {
    match (name, lang) {
        (REGISTER_CODE_TEMPLATE, LANG_ZH_CN) => (
            "【{app_name}】注册验证码",
            "您的验证码是：{code}，有效期{expire_minutes}分钟。",
        ),
        (REGISTER_CODE_TEMPLATE, _) => (
            "[{app_name}] Registration Code",
            "Your code is: {code}, valid for {expire_minutes} minutes.",
        ),
        (RESET_PASSWORD_TEMPLATE, LANG_ZH_CN) => (
            "【{app_name}】密码重置请求",
            "请点击以下链接重置密码：<br><a href=\"{link}\">{link}</a><br>或者使用验证码：{code}<br>有效期{expire_minutes}分钟。",
        ),
        _ => (
            "[{app_name}] Password Reset Request",
            "Click the link below to reset your password:<br><a href=\"{link}\">{link}</a><br>Or use the code: {code}<br>Valid for {expire_minutes} minutes.",
        ),
    }
}

/// Renders and delivers templated mail
pub struct MailDispatcher<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MailDispatcher<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Render a template in `lang`, substituting `vars` plus `{app_name}`.
    ///
    /// A failed template lookup is logged and falls back to the built-in text.
    #[instrument(skip(self, vars))]
    pub async fn render(
        &self,
        template: &str,
        lang: &str,
        vars: &[(&str, &str)],
    ) -> (String, String) {
        let app_name = self.ctx.config().app.name.as_str();
        let mut all_vars = vec![("app_name", app_name)];
        all_vars.extend_from_slice(vars);

        match self.ctx.email_template_repo().find_enabled(template, lang).await {
            Ok(Some(tpl)) => return tpl.render(&all_vars),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Template lookup failed, using built-in text"),
        }

        let (subject, body) = fallback_template(template, lang);
        (
            render_placeholders(subject, &all_vars),
            render_placeholders(body, &all_vars),
        )
    }

    /// Send a rendered mail and record the outcome.
    ///
    /// Fails with `MailUnavailable` when no transport is configured (nothing is
    /// logged then) and `MailDelivery` when the transport errors or times out.
    #[instrument(skip(self, subject, body), fields(to = %to))]
    pub async fn deliver(
        &self,
        to: &str,
        template: &str,
        subject: String,
        body: String,
    ) -> ServiceResult<()> {
        let Some(transport) = self.ctx.mail_transport() else {
            warn!("Mail requested but no transport is configured");
            return Err(ServiceError::MailUnavailable);
        };

        let mail = OutgoingMail {
            to: to.to_string(),
            subject,
            body,
        };

        let outcome = match tokio::time::timeout(MAIL_SEND_TIMEOUT, transport.send(&mail)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "mail send timed out after {}s",
                MAIL_SEND_TIMEOUT.as_secs()
            )),
        };

        let log = NewEmailLog {
            to_email: mail.to,
            subject: mail.subject,
            content: mail.body,
            template_name: Some(template.to_string()),
            status: if outcome.is_ok() {
                EmailStatus::Sent
            } else {
                EmailStatus::Failed
            },
            error_msg: outcome.as_ref().err().cloned(),
        };
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = ctx.email_log_repo().create(&log).await {
                error!(error = %e, to = %log.to_email, "Failed to write email log");
            }
        });

        outcome.map_err(|reason| {
            error!(reason = %reason, "Mail delivery failed");
            ServiceError::MailDelivery(reason)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[test]
    fn test_resolve_language() {
        assert_eq!(resolve_language(Some("zh"), None), LANG_ZH_CN);
        assert_eq!(resolve_language(Some("zh-TW"), Some("en")), LANG_ZH_CN);
        assert_eq!(resolve_language(Some("en"), Some("zh-CN")), LANG_EN_US);
        assert_eq!(resolve_language(None, Some("zh-CN,zh;q=0.9")), LANG_ZH_CN);
        assert_eq!(resolve_language(Some(""), Some("fr-FR")), LANG_EN_US);
        assert_eq!(resolve_language(None, None), LANG_EN_US);
    }

    #[test]
    fn test_transport_from_config() {
        assert!(transport_from_config(&MailConfig::default(), "App").is_none());

        let log_only = MailConfig {
            log_only: true,
            ..MailConfig::default()
        };
        assert!(transport_from_config(&log_only, "App").is_some());

        let smtp = MailConfig {
            smtp_host: Some("smtp.example.com".into()),
            smtp_username: Some("mailer@example.com".into()),
            smtp_password: Some("secret".into()),
            smtp_implicit_tls: true,
            ..MailConfig::default()
        };
        assert!(transport_from_config(&smtp, "App").is_some());

        let starttls = MailConfig {
            smtp_implicit_tls: false,
            log_only: true,
            ..smtp.clone()
        };
        assert!(transport_from_config(&starttls, "App").is_some());

        // No sender and no SMTP login to fall back to
        let no_sender = MailConfig {
            smtp_host: Some("smtp.example.com".into()),
            ..MailConfig::default()
        };
        assert!(transport_from_config(&no_sender, "App").is_none());
    }

    #[test]
    fn test_smtp_message_headers() {
        let config = MailConfig {
            smtp_host: Some("smtp.example.com".into()),
            from_address: Some("no-reply@example.com".into()),
            ..MailConfig::default()
        };
        let transport = SmtpMailTransport::from_config(&config, "F.st").unwrap();
        let mail = OutgoingMail {
            to: "a@x.com".into(),
            subject: "【F.st】注册验证码".into(),
            body: "<b>123456</b>".into(),
        };
        let raw = String::from_utf8(transport.build_message(&mail).unwrap().formatted())
            .unwrap()
            .to_lowercase();
        assert!(raw.contains("<no-reply@example.com>"));
        assert!(raw.contains("to: a@x.com"));
        // Non-ASCII subject goes out encoded
        assert!(raw.contains("subject: =?utf-8?b?"));
        assert!(raw.contains("content-type: text/html; charset=utf-8"));

        let bad = OutgoingMail {
            to: "not an address".into(),
            ..mail
        };
        assert!(matches!(
            transport.build_message(&bad),
            Err(MailError::Address(_))
        ));
    }

    #[tokio::test]
    async fn test_render_falls_back_to_builtin_text() {
        let harness = TestHarness::new();
        let (subject, body) = MailDispatcher::new(&harness.ctx)
            .render(
                REGISTER_CODE_TEMPLATE,
                LANG_EN_US,
                &[("code", "012345"), ("expire_minutes", "60")],
            )
            .await;
        assert_eq!(subject, "[TestApp] Registration Code");
        assert_eq!(body, "Your code is: 012345, valid for 60 minutes.");
    }

    #[tokio::test]
    async fn test_render_prefers_stored_template() {
        let harness = TestHarness::new();
        harness.templates.insert(
            RESET_PASSWORD_TEMPLATE,
            LANG_ZH_CN,
            "{app_name} 重置",
            "链接 {link} 验证码 {code}",
        );
        let (subject, body) = MailDispatcher::new(&harness.ctx)
            .render(
                RESET_PASSWORD_TEMPLATE,
                LANG_ZH_CN,
                &[("code", "999999"), ("link", "http://x/#/r")],
            )
            .await;
        assert_eq!(subject, "TestApp 重置");
        assert_eq!(body, "链接 http://x/#/r 验证码 999999");
    }

    #[tokio::test]
    async fn test_deliver_without_transport() {
        let harness = TestHarness::builder().without_mail().build();
        let err = MailDispatcher::new(&harness.ctx)
            .deliver("a@x.com", REGISTER_CODE_TEMPLATE, "s".into(), "b".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::MailUnavailable));
        assert!(harness.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_deliver_failure_is_logged() {
        let harness = TestHarness::new();
        harness.mailer.fail_next();
        let err = MailDispatcher::new(&harness.ctx)
            .deliver("a@x.com", REGISTER_CODE_TEMPLATE, "s".into(), "b".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::MailDelivery(_)));

        let logs = harness.email_logs.wait_for(1).await;
        assert_eq!(logs[0].status, EmailStatus::Failed);
        assert!(logs[0].error_msg.is_some());
    }
}
