//! HTTP digest authentication (RFC 2617) over `reqwest`.
//!
//! The first request goes out bare; a `401` carries the challenge, which is
//! answered and kept so later requests authenticate up front with an
//! increasing nonce count. A fresh `401` replaces the stored challenge.

use digest_auth::{AuthContext, WwwAuthenticateHeader};
use labrack_domain::endpoint::Credentials;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};

use crate::error::DigestHttpError;

pub(crate) struct DigestClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    challenge: Option<WwwAuthenticateHeader>,
}

impl DigestClient {
    pub(crate) fn new(http: reqwest::Client, base_url: String, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            challenge: None,
        }
    }

    /// GET `path` (with query) and return the body.
    pub(crate) async fn get(&mut self, path: &str) -> Result<String, DigestHttpError> {
        let mut response = self.send(path).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!(path, "answering digest challenge");
            self.challenge = Some(parse_challenge(&response)?);
            response = self.send(path).await?;
        }

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.challenge = None;
            }
            tracing::warn!(path, status = status.as_u16(), "request rejected");
            return Err(DigestHttpError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    async fn send(&mut self, path: &str) -> Result<reqwest::Response, DigestHttpError> {
        let mut request = self.http.get(format!("{}{path}", self.base_url));
        if let Some(challenge) = self.challenge.as_mut() {
            let context = AuthContext::new(
                self.credentials.user.as_str(),
                self.credentials.password.as_str(),
                path,
            );
            let answer = challenge
                .respond(&context)
                .map_err(|err| DigestHttpError::Challenge(err.to_string()))?;
            request = request.header(AUTHORIZATION, answer.to_header_string());
        }
        Ok(request.send().await?)
    }
}

fn parse_challenge(response: &reqwest::Response) -> Result<WwwAuthenticateHeader, DigestHttpError> {
    let header = response
        .headers()
        .get(WWW_AUTHENTICATE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| DigestHttpError::Challenge("missing WWW-Authenticate header".into()))?;
    digest_auth::parse(header).map_err(|err| DigestHttpError::Challenge(err.to_string()))
}
