//! Request signing for the Binance Pay API.
//!
//! Every request carries a fresh [`Nonce`], a millisecond [`TimestampMs`] and
//! an HMAC-SHA512 signature over
//!
//! ```text
//! {timestamp}\n{nonce}\n{json body}\n
//! ```
//!
//! keyed with the merchant API secret, hex-encoded in upper case. The signed
//! body bytes must be exactly the bytes sent on the wire, so [`Signer::envelope`]
//! serializes the body once and hands back both together.
//!
//! The same computation run in reverse authenticates incoming webhook
//! notifications, see [`Signer::verify`].

use std::fmt;

use hmac::{Hmac, Mac};
use rand::RngExt;
use rand::rng;
use serde::Serialize;
use sha2::Sha512;

use crate::error::SignatureError;
use crate::timestamp::TimestampMs;

type HmacSha512 = Hmac<Sha512>;

/// Length of a generated nonce.
pub const NONCE_LEN: usize = 32;

/// Characters a generated nonce is drawn from: `a-z` then `A-Z`.
pub const NONCE_ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Single-use random string included in the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nonce(String);

impl Nonce {
    /// Draws [`NONCE_LEN`] characters uniformly from [`NONCE_ALPHABET`].
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rng();
        let nonce = (0..NONCE_LEN)
            .map(|_| char::from(NONCE_ALPHABET[rng.random_range(0..NONCE_ALPHABET.len())]))
            .collect();
        Self(nonce)
    }

    /// Returns the nonce as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Nonce {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Nonce {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the canonical string that gets signed.
#[must_use]
pub fn signature_payload(timestamp: TimestampMs, nonce: &Nonce, body: &str) -> String {
    format!("{timestamp}\n{nonce}\n{body}\n")
}

/// HMAC-SHA512 of `payload` keyed with `secret`, upper-case hex.
#[must_use]
pub fn compute_signature(secret: &str, payload: &str) -> String {
    let mut mac = new_mac(secret);
    mac.update(payload.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}

fn new_mac(secret: &str) -> HmacSha512 {
    HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size")
}

/// Authentication values attached to one request.
///
/// The HTTP layer maps these onto the `BinancePay-*` headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    /// Value of `BinancePay-Timestamp`.
    pub timestamp: TimestampMs,
    /// Value of `BinancePay-Nonce`.
    pub nonce: Nonce,
    /// Value of `BinancePay-Certificate-SN` (the API key).
    pub certificate_sn: String,
    /// Value of `BinancePay-Signature`.
    pub signature: String,
}

/// A serialized request body together with the headers that sign it.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// JSON body, byte-for-byte what was signed.
    pub body: String,
    /// Signature headers for `body`.
    pub headers: SignatureHeaders,
}

/// Signs request bodies with a merchant API key pair.
#[derive(Clone)]
pub struct Signer {
    certificate_sn: String,
    secret: String,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("certificate_sn", &self.certificate_sn)
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Creates a signer from the API key (certificate serial number) and secret.
    #[must_use]
    pub fn new(certificate_sn: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            certificate_sn: certificate_sn.into(),
            secret: secret.into(),
        }
    }

    /// The API key sent as `BinancePay-Certificate-SN`.
    #[must_use]
    pub fn certificate_sn(&self) -> &str {
        &self.certificate_sn
    }

    /// Signs `body` with a fresh nonce and the current time.
    #[must_use]
    pub fn sign(&self, body: &str) -> SignatureHeaders {
        self.sign_at(body, Nonce::generate(), TimestampMs::now())
    }

    /// Signs `body` with the given nonce and timestamp.
    #[must_use]
    pub fn sign_at(&self, body: &str, nonce: Nonce, timestamp: TimestampMs) -> SignatureHeaders {
        let payload = signature_payload(timestamp, &nonce, body);
        let signature = compute_signature(&self.secret, &payload);
        SignatureHeaders {
            timestamp,
            nonce,
            certificate_sn: self.certificate_sn.clone(),
            signature,
        }
    }

    /// Serializes `body` to JSON once and signs exactly those bytes.
    ///
    /// Field order follows the struct declaration order of `T`.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `body` cannot be represented as JSON.
    pub fn envelope<T: Serialize + ?Sized>(&self, body: &T) -> Result<SignedRequest, serde_json::Error> {
        let body = serde_json::to_string(body)?;
        let headers = self.sign(&body);
        Ok(SignedRequest { body, headers })
    }

    /// Checks `signature` against the one this key would produce.
    ///
    /// Comparison is constant-time. Hex case is ignored.
    ///
    /// # Errors
    ///
    /// [`SignatureError::Malformed`] if `signature` is not hex,
    /// [`SignatureError::Mismatch`] if it does not match.
    pub fn verify(
        &self,
        timestamp: TimestampMs,
        nonce: &Nonce,
        body: &str,
        signature: &str,
    ) -> Result<(), SignatureError> {
        let expected = hex::decode(signature.trim())?;
        let mut mac = new_mac(&self.secret);
        mac.update(signature_payload(timestamp, nonce, body).as_bytes());
        mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SECRET: &str = "test-secret";

    fn signer() -> Signer {
        Signer::new("api-key", SECRET)
    }

    fn ts() -> TimestampMs {
        TimestampMs::from_millis(1_700_000_000_000)
    }

    #[test]
    fn test_payload_layout() {
        let payload = signature_payload(ts(), &Nonce::from("abc"), r#"{"a":1}"#);
        assert_eq!(payload, "1700000000000\nabc\n{\"a\":1}\n");
    }

    #[test]
    fn test_signature_is_upper_hex_sha512() {
        let sig = compute_signature(SECRET, "payload");
        assert_eq!(sig.len(), 128);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_known_hmac_sha512_vector() {
        // RFC 4231 test case 2.
        let sig = compute_signature("Jefe", "what do ya want for nothing?");
        assert_eq!(
            sig,
            "164B7A7BFCF819E2E395FBE73B56E0A387BD64222E831FD610270CD7EA2505549758BF75C05A994A6D034F65F8F0E6FDCAEAB1A34D4A6B4B636E070A38BCE737"
        );
    }

    #[test]
    fn test_sign_is_deterministic_for_fixed_nonce_and_time() {
        let a = signer().sign_at("{}", Nonce::from("n"), ts());
        let b = signer().sign_at("{}", Nonce::from("n"), ts());
        assert_eq!(a, b);
        assert_eq!(a.certificate_sn, "api-key");
    }

    #[test]
    fn test_signature_changes_with_each_input() {
        let base = signer().sign_at("{}", Nonce::from("n"), ts()).signature;
        let variants = [
            signer().sign_at(r#"{"x":1}"#, Nonce::from("n"), ts()).signature,
            signer().sign_at("{}", Nonce::from("m"), ts()).signature,
            signer()
                .sign_at("{}", Nonce::from("n"), TimestampMs::from_millis(1_700_000_000_001))
                .signature,
            Signer::new("api-key", "other-secret")
                .sign_at("{}", Nonce::from("n"), ts())
                .signature,
        ];
        let mut seen: HashSet<&str> = HashSet::from([base.as_str()]);
        for v in &variants {
            assert!(seen.insert(v.as_str()), "collision on {v}");
        }
    }

    #[test]
    fn test_nonce_length_and_alphabet() {
        for _ in 0..1000 {
            let nonce = Nonce::generate();
            assert_eq!(nonce.as_str().len(), NONCE_LEN);
            assert!(nonce.as_str().bytes().all(|b| b.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn test_nonce_distribution_is_roughly_uniform() {
        // 1000 samples x 32 positions = 32000 draws over 52 symbols, ~615 each.
        let mut counts = [0usize; 52];
        for _ in 0..1000 {
            for b in Nonce::generate().as_str().bytes() {
                let idx = NONCE_ALPHABET.iter().position(|&c| c == b).unwrap();
                counts[idx] += 1;
            }
        }
        for (i, &count) in counts.iter().enumerate() {
            assert!(
                (400..=850).contains(&count),
                "symbol {} drawn {count} times",
                char::from(NONCE_ALPHABET[i])
            );
        }
    }

    #[test]
    fn test_nonces_differ_between_requests() {
        assert_ne!(Nonce::generate(), Nonce::generate());
    }

    #[test]
    fn test_envelope_signs_the_serialized_bytes() {
        let signed = signer()
            .envelope(&serde_json::json!({"wallet": "SPOT_WALLET"}))
            .unwrap();
        assert_eq!(signed.body, r#"{"wallet":"SPOT_WALLET"}"#);
        let expected = compute_signature(
            SECRET,
            &signature_payload(signed.headers.timestamp, &signed.headers.nonce, &signed.body),
        );
        assert_eq!(signed.headers.signature, expected);
    }

    #[test]
    fn test_verify_accepts_own_signature_in_any_case() {
        let headers = signer().sign_at("{}", Nonce::from("n"), ts());
        signer()
            .verify(ts(), &Nonce::from("n"), "{}", &headers.signature)
            .unwrap();
        signer()
            .verify(ts(), &Nonce::from("n"), "{}", &headers.signature.to_lowercase())
            .unwrap();
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let headers = signer().sign_at("{}", Nonce::from("n"), ts());
        let err = signer()
            .verify(ts(), &Nonce::from("n"), r#"{"a":1}"#, &headers.signature)
            .unwrap_err();
        assert_eq!(err, SignatureError::Mismatch);

        let err = signer()
            .verify(ts(), &Nonce::from("n"), "{}", "not-hex")
            .unwrap_err();
        let copied = err;
        assert_eq!(
            copied,
            SignatureError::Malformed(hex::FromHexError::OddLength)
        );
        assert_eq!(err, copied);
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", signer());
        assert!(!rendered.contains(SECRET));
    }
}
