//! Verification code entity <-> model mapper

use auth_core::entities::VerificationCode;
use auth_core::error::DomainError;

use crate::models::VerificationCodeModel;

/// Convert a row into the entity, rejecting purposes the domain does not know
impl TryFrom<VerificationCodeModel> for VerificationCode {
    type Error = DomainError;

    fn try_from(model: VerificationCodeModel) -> Result<Self, Self::Error> {
        let purpose = model
            .purpose
            .parse()
            .map_err(DomainError::DatabaseError)?;

        Ok(VerificationCode {
            id: model.id,
            email: model.email,
            code: model.code,
            purpose,
            expires_at: model.expires_at,
            is_used: model.is_used,
            is_deleted: model.is_deleted,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
