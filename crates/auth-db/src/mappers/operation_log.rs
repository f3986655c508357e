//! Operation log and email template mappers

use auth_core::entities::{EmailTemplate, OperationLog};
use auth_core::traits::NamedCount;

use crate::models::{EmailTemplateModel, NamedCountModel, OperationLogModel};

impl From<OperationLogModel> for OperationLog {
    fn from(model: OperationLogModel) -> Self {
        OperationLog {
            id: model.id,
            user_id: model.user_id,
            username: model.username,
            module: model.module,
            action: model.action,
            method: model.method,
            path: model.path,
            ip: model.ip,
            user_agent: model.user_agent,
            request_body: model.request_body,
            response_body: model.response_body,
            status_code: model.status_code,
            duration_ms: model.duration_ms,
            created_at: model.created_at,
        }
    }
}

impl From<NamedCountModel> for NamedCount {
    fn from(model: NamedCountModel) -> Self {
        NamedCount {
            name: model.name,
            count: model.count,
        }
    }
}

impl From<EmailTemplateModel> for EmailTemplate {
    fn from(model: EmailTemplateModel) -> Self {
        EmailTemplate {
            id: model.id,
            name: model.name,
            lang: model.lang,
            subject: model.subject,
            content: model.content,
            enabled: model.status == 1,
            updated_at: model.updated_at,
        }
    }
}
