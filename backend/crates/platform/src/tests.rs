//! Cross-module tests for the platform crate

#[cfg(test)]
mod throttle_by_signature_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::cache::MemoryCache;
    use crate::clock::ManualClock;
    use crate::rate_limit::{ThrottleConfig, ThrottleGate};
    use crate::signature::{ClientInfo, RequestSignature};

    #[derive(Debug, PartialEq)]
    struct Tripped(u64);

    impl From<crate::rate_limit::ThrottleStoreError> for Tripped {
        fn from(_: crate::rate_limit::ThrottleStoreError) -> Self {
            Tripped(0)
        }
    }

    fn client(ip: &str) -> ClientInfo {
        ClientInfo::new(Some(ip.parse().unwrap()), Some("agent".to_string()))
    }

    #[tokio::test]
    async fn test_buckets_are_per_client() {
        let clock = Arc::new(ManualClock::new(0));
        let gate = ThrottleGate::new(Arc::new(MemoryCache::new(clock.clone())), clock);
        let config = ThrottleConfig::per_minutes(1, 1);

        let a = config.by(RequestSignature::for_client("register", &client("10.0.0.1")).hash());
        let b = config.by(RequestSignature::for_client("register", &client("10.0.0.2")).hash());

        gate.attempt(&a, Tripped).await.unwrap().hit();
        assert!(gate.attempt(&a, Tripped).await.is_err());
        assert!(gate.attempt(&b, Tripped).await.is_ok());
    }

    #[tokio::test]
    async fn test_buckets_are_per_namespace() {
        let clock = Arc::new(ManualClock::new(0));
        let gate = ThrottleGate::new(Arc::new(MemoryCache::new(clock.clone())), clock.clone());
        let config = ThrottleConfig::per_minutes(1, 1);
        let info = client("10.0.0.1");

        let register = config.by(RequestSignature::for_client("register", &info).hash());
        let forgot = config.by(RequestSignature::for_client("password_forgot", &info).hash());

        gate.attempt(&register, Tripped).await.unwrap().hit();
        assert!(gate.attempt(&forgot, Tripped).await.is_ok());

        clock.advance(Duration::from_secs(59));
        assert_eq!(gate.attempt(&register, Tripped).await.unwrap_err(), Tripped(1));
    }
}

#[cfg(test)]
mod token_storage_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::cache::{KeyValueStore, MemoryCache};
    use crate::clock::ManualClock;
    use crate::crypto::{constant_time_eq, random_hex, sha256_hex};

    #[tokio::test]
    async fn test_digest_only_storage_consumes_once() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = MemoryCache::new(clock.clone());

        let token = random_hex(32);
        let digest = sha256_hex(token.as_bytes());
        cache
            .put("password_reset:users:a@b.c", digest, Some(Duration::from_secs(3600)))
            .await
            .unwrap();

        let supplied = sha256_hex(token.as_bytes());
        let check = |stored: &str| constant_time_eq(stored.as_bytes(), supplied.as_bytes());

        assert!(cache.take_if("password_reset:users:a@b.c", check).await.unwrap());
        assert!(!cache.take_if("password_reset:users:a@b.c", check).await.unwrap());
    }
}

#[cfg(test)]
mod signed_link_tests {
    use crate::clock::{Clock, ManualClock};
    use crate::crypto::sha256_hex;
    use crate::signed_url::{HmacUrlSigner, SignedUrlError, UrlSigner};

    #[test]
    fn test_verification_link_lifecycle() {
        let clock = ManualClock::new(1_700_000_000_000);
        let signer = HmacUrlSigner::new(b"app-key".to_vec());

        let params = vec![
            ("id".to_string(), "42".to_string()),
            ("hash".to_string(), sha256_hex(b"a@b.c")),
            ("guard".to_string(), "users".to_string()),
        ];
        let url = signer.sign("/email/verify", &params, clock.now_secs() + 3600);

        assert!(signer.verify(&url, clock.now_secs()).is_ok());
        clock.advance(std::time::Duration::from_secs(3600));
        assert_eq!(signer.verify(&url, clock.now_secs()), Err(SignedUrlError::Expired));
    }
}
