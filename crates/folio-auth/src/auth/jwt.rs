//! JWT token issuance and validation.

use folio_core::db::unix_timestamp;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};

use super::claims::{Claims, TokenKind};
use super::{SignedToken, TokenError, TokenSigner};

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl KeyPair {
    fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }
}

/// HS256 signer with separate secrets for access and refresh tokens.
pub struct JwtManager {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl JwtManager {
    /// Create a new `JwtManager` from both secrets and lifetimes.
    pub fn new(
        access_secret: &[u8],
        access_ttl_secs: i64,
        refresh_secret: &[u8],
        refresh_ttl_secs: i64,
    ) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            access: KeyPair::new(access_secret, access_ttl_secs),
            refresh: KeyPair::new(refresh_secret, refresh_ttl_secs),
            validation,
        }
    }

    const fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}

impl TokenSigner for JwtManager {
    fn issue(&self, user_id: &str, kind: TokenKind) -> Result<SignedToken, TokenError> {
        let keys = self.keys(kind);
        let now = unix_timestamp();
        let exp = now
            .checked_add(keys.ttl_secs)
            .ok_or_else(|| TokenError::Signing("token lifetime overflows".into()))?;

        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: user_id.to_string(),
            iat: now,
            exp,
            token_type: kind.as_str().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(SignedToken {
            token,
            expires_at: exp,
        })
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
                .map_err(|e| match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                })?;

        if !data.claims.is_kind(kind) {
            return Err(TokenError::Invalid);
        }
        Ok(data.claims)
    }
}

/// Hash a token for storage (we don't store raw tokens).
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
