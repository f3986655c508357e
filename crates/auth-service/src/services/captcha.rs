//! Human verification (Geetest v4 server-side validation)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth_common::CaptchaConfig;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{instrument, warn};

use super::error::{ServiceError, ServiceResult};

const GEETEST_VALIDATE_URL: &str = "https://gcaptcha4.geetest.com/validate";
const GEETEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Proof fields produced by the client-side widget
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CaptchaProof {
    pub lot_number: String,
    pub captcha_output: String,
    pub pass_token: String,
    pub gen_time: String,
    pub captcha_id: String,
}

/// Human verification abstraction
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    /// `Ok(true)` only when the provider confirms the proof
    async fn verify(&self, proof: &CaptchaProof) -> ServiceResult<bool>;
}

#[derive(Serialize)]
struct ValidateForm<'a> {
    lot_number: &'a str,
    captcha_output: &'a str,
    pass_token: &'a str,
    gen_time: &'a str,
    captcha_id: &'a str,
    sign_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    result: String,
    #[serde(default)]
    reason: Option<String>,
}

/// `hex(HMAC-SHA256(key, lot_number))`
pub(crate) fn sign_token(key: &str, lot_number: &str) -> ServiceResult<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes())
        .map_err(|e| ServiceError::internal(format!("Invalid HMAC key: {e}")))?;
    mac.update(lot_number.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Geetest v4 validator
#[derive(Clone)]
pub struct GeetestVerifier {
    client: reqwest::Client,
    captcha_id: String,
    captcha_key: String,
    endpoint: String,
}

impl GeetestVerifier {
    pub fn new(captcha_id: impl Into<String>, captcha_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            captcha_id: captcha_id.into(),
            captcha_key: captcha_key.into(),
            endpoint: GEETEST_VALIDATE_URL.to_string(),
        }
    }

    /// Point at a different validation endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl std::fmt::Debug for GeetestVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeetestVerifier")
            .field("captcha_id", &self.captcha_id)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl HumanVerifier for GeetestVerifier {
    #[instrument(skip(self, proof), fields(lot_number = %proof.lot_number))]
    async fn verify(&self, proof: &CaptchaProof) -> ServiceResult<bool> {
        if proof.captcha_id != self.captcha_id {
            warn!("Captcha rejected: captcha_id mismatch");
            return Ok(false);
        }

        let sign_token = sign_token(&self.captcha_key, &proof.lot_number)?;
        let form = ValidateForm {
            lot_number: &proof.lot_number,
            captcha_output: &proof.captcha_output,
            pass_token: &proof.pass_token,
            gen_time: &proof.gen_time,
            captcha_id: &proof.captcha_id,
            sign_token: &sign_token,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(GEETEST_TIMEOUT)
            .form(&form)
            .send()
            .await;

        // Provider trouble counts as a failed check, not as a server error
        let body = match response {
            Ok(resp) => resp.json::<ValidateResponse>().await,
            Err(e) => Err(e),
        };
        match body {
            Ok(r) if r.result == "success" => Ok(true),
            Ok(r) => {
                warn!(reason = r.reason.as_deref().unwrap_or(""), "Captcha rejected");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Captcha provider unreachable");
                Ok(false)
            }
        }
    }
}

/// Build the verifier when the gate is active
pub fn verifier_from_config(config: &CaptchaConfig) -> Option<Arc<dyn HumanVerifier>> {
    if !config.is_active() {
        return None;
    }
    let (Some(id), Some(key)) = (config.captcha_id.as_deref(), config.captcha_key.as_deref())
    else {
        return None;
    };
    Some(Arc::new(GeetestVerifier::new(id, key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_token_known_vector() {
        let token = sign_token("key", "The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            token,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[tokio::test]
    async fn test_mismatched_captcha_id_rejected_without_network() {
        let verifier = GeetestVerifier::new("expected-id", "key")
            .with_endpoint("http://127.0.0.1:1/validate");
        let proof = CaptchaProof {
            captcha_id: "other-id".to_string(),
            ..CaptchaProof::default()
        };
        assert!(!verifier.verify(&proof).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_provider_counts_as_rejection() {
        let verifier =
            GeetestVerifier::new("id", "key").with_endpoint("http://127.0.0.1:1/validate");
        let proof = CaptchaProof {
            captcha_id: "id".to_string(),
            lot_number: "lot".to_string(),
            ..CaptchaProof::default()
        };
        assert!(!verifier.verify(&proof).await.unwrap());
    }

    #[test]
    fn test_verifier_from_config() {
        assert!(verifier_from_config(&CaptchaConfig::default()).is_none());

        let half = CaptchaConfig {
            enabled: true,
            captcha_id: Some("id".into()),
            captcha_key: None,
        };
        assert!(verifier_from_config(&half).is_none());

        let full = CaptchaConfig {
            enabled: true,
            captcha_id: Some("id".into()),
            captcha_key: Some("key".into()),
        };
        assert!(verifier_from_config(&full).is_some());
    }
}
