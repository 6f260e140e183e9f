//! Key material for WireGuard peers
//!
//! Keypairs follow the `wg genkey` / `wg pubkey` convention: 32 random bytes
//! clamped as an X25519 scalar, public key derived by base-point
//! multiplication. Pre-shared keys are 32 unclamped random bytes. Everything
//! is exchanged as standard base64 with padding (44 characters).

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{Error, Result};

/// Length of every key in raw bytes
pub const KEY_LENGTH: usize = 32;

/// Length of a key in base64 text
pub const KEY_BASE64_LENGTH: usize = 44;

/// Clamp raw bytes into a valid X25519 private scalar
pub fn clamp_private_key(bytes: &mut [u8; KEY_LENGTH]) {
    bytes[0] &= 0xF8;
    bytes[31] &= 0x7F;
    bytes[31] |= 0x40;
}

/// X25519 keypair for one tunnel endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    private_key: [u8; KEY_LENGTH],
    public_key: [u8; KEY_LENGTH],
}

impl KeyPair {
    /// Generate a new random keypair from the operating system's RNG
    pub fn generate() -> Result<Self> {
        KeyGenerator::os().generate()
    }

    /// Derive the keypair for an existing private key.
    ///
    /// The private key is clamped first, so the stored bytes always match
    /// what `wg` would write.
    pub fn from_private_key(mut private_key: [u8; KEY_LENGTH]) -> Self {
        clamp_private_key(&mut private_key);
        let secret = StaticSecret::from(private_key);
        let public = PublicKey::from(&secret);
        Self {
            private_key,
            public_key: public.to_bytes(),
        }
    }

    /// Derive the keypair for a base64-encoded private key
    pub fn from_private_key_base64(b64: &str) -> Result<Self> {
        Ok(Self::from_private_key(decode_key(b64)?))
    }

    pub fn private_key(&self) -> &[u8; KEY_LENGTH] {
        &self.private_key
    }

    pub fn public_key(&self) -> &[u8; KEY_LENGTH] {
        &self.public_key
    }

    /// Private key as base64, the `PrivateKey =` value
    pub fn private_key_base64(&self) -> String {
        BASE64.encode(self.private_key)
    }

    /// Public key as base64, the `PublicKey =` value
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.public_key)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_base64())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Symmetric pre-shared key mixed into a peer pair's handshake
#[derive(Clone, PartialEq, Eq)]
pub struct PresharedKey([u8; KEY_LENGTH]);

impl PresharedKey {
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_base64(b64: &str) -> Result<Self> {
        Ok(Self(decode_key(b64)?))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl fmt::Debug for PresharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PresharedKey([REDACTED])")
    }
}

/// Draws key material from an injected random source.
///
/// Production code uses [`KeyGenerator::os`]; tests pass a seeded RNG so a
/// whole bundle is reproducible.
pub struct KeyGenerator<R> {
    rng: R,
}

impl KeyGenerator<OsRng> {
    pub fn os() -> Self {
        Self::new(OsRng)
    }
}

impl<R: RngCore + CryptoRng> KeyGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a clamped private key and its public key
    pub fn generate(&mut self) -> Result<KeyPair> {
        let bytes = self.random_key()?;
        Ok(KeyPair::from_private_key(bytes))
    }

    /// Generate a pre-shared key (no clamping)
    pub fn generate_psk(&mut self) -> Result<PresharedKey> {
        Ok(PresharedKey(self.random_key()?))
    }

    fn random_key(&mut self) -> Result<[u8; KEY_LENGTH]> {
        let mut bytes = [0u8; KEY_LENGTH];
        self.rng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| Error::KeyGenerationFailed(e.to_string()))?;
        Ok(bytes)
    }
}

/// Decode a base64 key and check its length
pub fn decode_key(b64: &str) -> Result<[u8; KEY_LENGTH]> {
    let bytes = BASE64
        .decode(b64.trim())
        .map_err(|e| Error::InvalidKey(e.to_string()))?;
    if bytes.len() != KEY_LENGTH {
        return Err(Error::InvalidKey(format!(
            "invalid key length: {} (expected {})",
            bytes.len(),
            KEY_LENGTH
        )));
    }
    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&bytes);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// RNG whose entropy source is permanently unavailable
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            panic!("BrokenRng has no entropy")
        }

        fn next_u64(&mut self) -> u64 {
            panic!("BrokenRng has no entropy")
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            panic!("BrokenRng has no entropy")
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn test_generated_keys_are_clamped() {
        let mut keys = KeyGenerator::new(StdRng::seed_from_u64(7));
        for _ in 0..1000 {
            let kp = keys.generate().unwrap();
            let private = kp.private_key_base64();
            let public = kp.public_key_base64();

            assert_eq!(private.len(), KEY_BASE64_LENGTH);
            assert_eq!(public.len(), KEY_BASE64_LENGTH);

            let raw = decode_key(&private).unwrap();
            assert_eq!(decode_key(&public).unwrap().len(), KEY_LENGTH);
            assert_eq!(raw[0] & 0x07, 0);
            assert_eq!(raw[31] & 0x80, 0);
            assert_eq!(raw[31] & 0x40, 0x40);
        }
    }

    #[test]
    fn test_public_key_matches_dalek() {
        let kp = KeyGenerator::new(StdRng::seed_from_u64(1)).generate().unwrap();
        let secret = StaticSecret::from(*kp.private_key());
        assert_eq!(PublicKey::from(&secret).as_bytes(), kp.public_key());
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = KeyGenerator::new(StdRng::seed_from_u64(42)).generate().unwrap();
        let b = KeyGenerator::new(StdRng::seed_from_u64(42)).generate().unwrap();
        assert_eq!(a, b);

        let c = KeyGenerator::new(StdRng::seed_from_u64(43)).generate().unwrap();
        assert_ne!(a.public_key(), c.public_key());
    }

    #[test]
    fn test_from_private_key_base64() {
        let kp = KeyPair::generate().unwrap();
        let restored = KeyPair::from_private_key_base64(&kp.private_key_base64()).unwrap();
        assert_eq!(restored.public_key_base64(), kp.public_key_base64());

        assert!(matches!(
            KeyPair::from_private_key_base64("c2hvcnQ="),
            Err(Error::InvalidKey(_))
        ));
        assert!(KeyPair::from_private_key_base64("not base64!").is_err());
    }

    #[test]
    fn test_rfc7748_base_point_vector() {
        // Alice's key from RFC 7748 section 6.1
        let private: [u8; 32] = [
            0x77, 0x07, 0x6d, 0x0a, 0x73, 0x18, 0xa5, 0x7d, 0x3c, 0x16, 0xc1, 0x72, 0x51, 0xb2,
            0x66, 0x45, 0xdf, 0x4c, 0x2f, 0x87, 0xeb, 0xc0, 0x99, 0x2a, 0xb1, 0x77, 0xfb, 0xa5,
            0x1d, 0xb9, 0x2c, 0x2a,
        ];
        let expected: [u8; 32] = [
            0x85, 0x20, 0xf0, 0x09, 0x89, 0x30, 0xa7, 0x54, 0x74, 0x8b, 0x7d, 0xdc, 0xb4, 0x3e,
            0xf7, 0x5a, 0x0d, 0xbf, 0x3a, 0x0d, 0x26, 0x38, 0x1a, 0xf4, 0xeb, 0xa4, 0xa9, 0x8e,
            0xaa, 0x9b, 0x4e, 0x6a,
        ];
        assert_eq!(KeyPair::from_private_key(private).public_key(), &expected);
    }

    #[test]
    fn test_psk_is_not_clamped() {
        let mut keys = KeyGenerator::new(StdRng::seed_from_u64(3));
        let unclamped = (0..64)
            .map(|_| keys.generate_psk().unwrap())
            .any(|psk| psk.as_bytes()[0] & 0x07 != 0 || psk.as_bytes()[31] & 0x80 != 0);
        assert!(unclamped);

        let psk = keys.generate_psk().unwrap();
        assert_eq!(psk.to_base64().len(), KEY_BASE64_LENGTH);
        assert_eq!(PresharedKey::from_base64(&psk.to_base64()).unwrap(), psk);
    }

    #[test]
    fn test_entropy_failure_is_fatal() {
        let mut keys = KeyGenerator::new(BrokenRng);
        let err = keys.generate().unwrap_err();
        assert!(matches!(err, Error::KeyGenerationFailed(_)));
        assert!(err.is_fatal());
        assert!(matches!(keys.generate_psk(), Err(Error::KeyGenerationFailed(_))));
    }

    #[test]
    fn test_debug_redacts_private_material() {
        let mut keys = KeyGenerator::new(StdRng::seed_from_u64(9));
        let kp = keys.generate().unwrap();
        let dbg = format!("{:?}", kp);
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains(&kp.private_key_base64()));

        let psk = keys.generate_psk().unwrap();
        assert!(!format!("{:?}", psk).contains(&psk.to_base64()));
    }
}
