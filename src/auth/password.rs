use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error(transparent)]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// bcrypt on the blocking pool
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let plain = plain.to_string();
        let cost = self.cost;
        Ok(tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??)
    }

    /// A malformed stored hash never matches
    pub async fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError> {
        let plain = plain.to_string();
        let hash = hash.to_string();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash)).await?;
        Ok(verified.unwrap_or(false))
    }
}

/// One-time password reset token; only the digest is stored
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub plain: String,
    pub digest: String,
}

impl ResetToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let plain = hex::encode(bytes);
        let digest = Self::digest(&plain);
        Self { plain, digest }
    }

    pub fn digest(plain: &str) -> String {
        hex::encode(Sha256::digest(plain.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("pass1234").await.unwrap();
        assert!(hasher.verify("pass1234", &hash).await.unwrap());
        assert!(!hasher.verify("wrong-password", &hash).await.unwrap());
        assert!(!hasher.verify("pass1234", "not-a-hash").await.unwrap());
    }

    #[test]
    fn test_reset_token_digest() {
        let token = ResetToken::generate();
        assert_eq!(token.plain.len(), 64);
        assert_eq!(token.digest, ResetToken::digest(&token.plain));
        assert_ne!(token.plain, token.digest);
    }
}
