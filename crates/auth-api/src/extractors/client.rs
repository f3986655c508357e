//! Request metadata extractors
//!
//! Client address, captcha proof headers and the preferred language.
//! None of them reject a request.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, Extensions, HeaderMap},
};
use auth_service::CaptchaProof;

/// Address recorded when nothing better is known
pub const UNKNOWN_IP: &str = "unknown";

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn resolve(headers: &HeaderMap, extensions: &Extensions) -> Self {
        let forwarded = header_str(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let ip = forwarded
            .or_else(|| header_str(headers, "x-real-ip"))
            .map(ToString::to_string)
            .or_else(|| {
                extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| UNKNOWN_IP.to_string());
        ClientIp(ip)
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::resolve(&parts.headers, &parts.extensions)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp::from_parts(parts))
    }
}

/// Geetest proof sent in `X-Geetest-*` headers; `None` when no header is present
#[derive(Debug, Clone, Default)]
pub struct CaptchaHeaders(pub Option<CaptchaProof>);

#[async_trait]
impl<S> FromRequestParts<S> for CaptchaHeaders
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let get = |name: &str| header_str(&parts.headers, name).map(ToString::to_string);
        let lot_number = get("x-geetest-lot-number");
        let captcha_output = get("x-geetest-captcha-output");
        let pass_token = get("x-geetest-pass-token");
        let gen_time = get("x-geetest-gen-time");
        let captcha_id = get("x-geetest-captcha-id");

        let any = [&lot_number, &captcha_output, &pass_token, &gen_time, &captcha_id]
            .iter()
            .any(|v| v.is_some());
        if !any {
            return Ok(CaptchaHeaders(None));
        }

        Ok(CaptchaHeaders(Some(CaptchaProof {
            lot_number: lot_number.unwrap_or_default(),
            captcha_output: captcha_output.unwrap_or_default(),
            pass_token: pass_token.unwrap_or_default(),
            gen_time: gen_time.unwrap_or_default(),
            captcha_id: captcha_id.unwrap_or_default(),
        })))
    }
}

/// Raw `Accept-Language` header
#[derive(Debug, Clone, Default)]
pub struct AcceptLanguage(pub Option<String>);

impl AcceptLanguage {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AcceptLanguage
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AcceptLanguage(
            header_str(&parts.headers, header::ACCEPT_LANGUAGE.as_str()).map(ToString::to_string),
        ))
    }
}
