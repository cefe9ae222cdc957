use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
        rand_core::OsRng,
    },
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),
    #[error("stored password hash is malformed: {0}")]
    MalformedDigest(password_hash::Error),
    #[error("hashing task was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// PasswordHasher
///
/// Seam for the one-way password digest. Both calls are CPU bound and are
/// expected to run off the async executor.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String, HashError>;
    /// `Ok(false)` on a wrong password, `Err` only when the stored digest cannot be used.
    async fn verify(&self, password: &str, digest: &str) -> Result<bool, HashError>;
}

pub type HasherState = Arc<dyn PasswordHasher>;

/// Argon2Hasher
///
/// Argon2id digests in PHC string format.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    /// Custom cost parameters (memory KiB, iterations, lanes). Tests use tiny ones.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, HashError> {
        let params = Params::new(m_cost, t_cost, p_cost, None).map_err(HashError::Params)?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, password: &str) -> Result<String, HashError> {
        let argon2 = self.argon2();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(HashError::Hash)
        })
        .await?
    }

    async fn verify(&self, password: &str, digest: &str) -> Result<bool, HashError> {
        let argon2 = self.argon2();
        let password = password.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&digest).map_err(HashError::MalformedDigest)?;
            match argon2.verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(password_hash::Error::Password) => Ok(false),
                Err(e) => Err(HashError::Hash(e)),
            }
        })
        .await?
    }
}
