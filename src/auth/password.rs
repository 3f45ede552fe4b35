use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::error;

use crate::config::PasswordConfig;

/// Argon2id hashing with a pre-computed decoy hash for lookup misses.
#[derive(Clone)]
pub struct Passwords {
    params: Params,
    decoy_hash: Arc<str>,
}

impl Passwords {
    pub fn new(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, 1, None).map_err(|e| {
            error!(error = %e, "invalid argon2 params");
            anyhow::anyhow!("invalid argon2 params: {e}")
        })?;
        let mut passwords = Self {
            params,
            decoy_hash: Arc::from(""),
        };
        let decoy = passwords.hash(&uuid::Uuid::new_v4().to_string())?;
        passwords.decoy_hash = Arc::from(decoy);
        Ok(passwords)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Cost parameters come from the PHC string, not from `self`.
    pub fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(self
            .argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// Verifies against `stored`, or burns an equivalent amount of work on the
    /// decoy hash and reports a mismatch when there is nothing to compare to.
    pub fn verify_or_decoy(&self, plain: &str, stored: Option<&str>) -> anyhow::Result<bool> {
        match stored.filter(|h| !h.is_empty()) {
            Some(hash) => self.verify(plain, hash),
            None => {
                let _ = self.verify(plain, &self.decoy_hash)?;
                Ok(false)
            }
        }
    }

    pub async fn hash_blocking(&self, plain: String) -> anyhow::Result<String> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.hash(&plain))
            .await
            .context("password hash task")?
    }

    pub async fn verify_blocking(
        &self,
        plain: String,
        stored: Option<String>,
    ) -> anyhow::Result<bool> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.verify_or_decoy(&plain, stored.as_deref()))
            .await
            .context("password verify task")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Passwords {
        Passwords::new(&PasswordConfig {
            memory_kib: 256,
            iterations: 1,
        })
        .expect("valid params")
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let pw = cheap();
        let hash = pw.hash("Secur3P@ssw0rd!").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(pw.verify("Secur3P@ssw0rd!", &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let pw = cheap();
        let hash = pw.hash("correct-horse-battery-staple").unwrap();
        assert!(!pw.verify("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let pw = cheap();
        let a = pw.hash("same").unwrap();
        let b = pw.hash("same").unwrap();
        assert_ne!(a, b);
        assert!(pw.verify("same", &a).unwrap());
        assert!(pw.verify("same", &b).unwrap());
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = cheap().verify("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn decoy_path_never_matches() {
        let pw = cheap();
        assert!(!pw.verify_or_decoy("anything", None).unwrap());
        assert!(!pw.verify_or_decoy("anything", Some("")).unwrap());
    }

    #[test]
    fn hashes_from_other_params_still_verify() {
        let strong = Passwords::new(&PasswordConfig {
            memory_kib: 512,
            iterations: 2,
        })
        .unwrap();
        let hash = strong.hash("kirkanen").unwrap();
        assert!(cheap().verify("kirkanen", &hash).unwrap());
    }

    #[test]
    fn rejects_impossible_params() {
        assert!(Passwords::new(&PasswordConfig {
            memory_kib: 1,
            iterations: 1,
        })
        .is_err());
    }

    #[tokio::test]
    async fn blocking_wrappers_agree_with_sync_api() {
        let pw = cheap();
        let hash = pw.hash_blocking("kirkanen".into()).await.unwrap();
        assert!(pw
            .verify_blocking("kirkanen".into(), Some(hash.clone()))
            .await
            .unwrap());
        assert!(!pw.verify_blocking("nope".into(), Some(hash)).await.unwrap());
        assert!(!pw.verify_blocking("nope".into(), None).await.unwrap());
    }
}
