use std::{future::ready, sync::Arc};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{Error, UploadError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub(crate) enum TokenError {
    #[error("Token is not shaped like user.expiry.signature")]
    Malformed,

    #[error("Token signature does not match")]
    Signature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid signing key")]
    Key,
}

/// Signs and checks bearer tokens of the form `{user_id}.{expires_unix}.{hex signature}`
#[derive(Clone)]
pub(crate) struct TokenAuthority {
    secret: Arc<[u8]>,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority").finish_non_exhaustive()
    }
}

impl TokenAuthority {
    pub(crate) fn new(secret: &str) -> Self {
        TokenAuthority {
            secret: Arc::from(secret.as_bytes()),
        }
    }

    pub(crate) fn issue(
        &self,
        user_id: Uuid,
        valid_for: time::Duration,
    ) -> Result<String, TokenError> {
        let expires = (OffsetDateTime::now_utc() + valid_for).unix_timestamp();

        self.issue_until(user_id, expires)
    }

    fn issue_until(&self, user_id: Uuid, expires: i64) -> Result<String, TokenError> {
        let signature = self.mac(user_id, expires)?.finalize().into_bytes();

        Ok(format!("{user_id}.{expires}.{}", hex::encode(signature)))
    }

    /// The user a token was issued to, if its signature holds and it hasn't expired
    pub(crate) fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc().unix_timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<Uuid, TokenError> {
        let mut parts = token.split('.');

        let (Some(user_id), Some(expires), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let user_id: Uuid = user_id.parse().map_err(|_| TokenError::Malformed)?;
        let expires: i64 = expires.parse().map_err(|_| TokenError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        self.mac(user_id, expires)?
            .verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        if now >= expires {
            return Err(TokenError::Expired);
        }

        Ok(user_id)
    }

    fn mac(&self, user_id: Uuid, expires: i64) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::Key)?;
        mac.update(user_id.to_string().as_bytes());
        mac.update(b".");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }
}

/// The authenticated caller
#[derive(Clone, Copy, Debug)]
pub(crate) struct Identity {
    pub(crate) user_id: Uuid,
}

impl Identity {
    fn from_request_sync(req: &HttpRequest) -> Result<Self, Error> {
        let Some(tokens) = req.app_data::<web::Data<TokenAuthority>>() else {
            tracing::error!("Token authority is not configured");
            return Err(UploadError::MissingToken.into());
        };

        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(UploadError::MissingToken)?;

        let user_id = tokens.verify(token).map_err(|e| {
            tracing::debug!("Rejected token: {e}");
            UploadError::from(e)
        })?;

        Ok(Identity { user_id })
    }
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::from_request_sync(req))
    }
}
