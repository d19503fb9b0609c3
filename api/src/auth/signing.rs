//! HMAC-SHA256 signing of session cookie values.
//!
//! A signed value has the form `{payload}.{signature}`, the signature being
//! the URL-safe unpadded base64 of the HMAC over the payload.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct SessionSigner {
    secret: [u8; 32],
}

impl SessionSigner {
    pub fn new(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    /// A signer with a freshly generated secret.
    pub fn random() -> Self {
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self::new(secret)
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        mac
    }

    /// Sign a payload: returns "payload.signature"
    pub fn sign(&self, payload: &str) -> String {
        let signature = URL_SAFE_NO_PAD.encode(self.mac(payload).finalize().into_bytes());
        format!("{}.{}", payload, signature)
    }

    /// Verify a signed value, returns the payload if the signature matches
    pub fn verify(&self, signed: &str) -> Option<String> {
        let (payload, signature) = signed.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        // verify_slice compares in constant time
        self.mac(payload)
            .verify_slice(&signature)
            .ok()
            .map(|_| payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let signer = SessionSigner::new([0u8; 32]);
        let user_id = "01HZX3K6T8W7Q2M5N4P9R0S1V2";

        let signed = signer.sign(user_id);
        assert!(signed.starts_with("01HZX3K6T8W7Q2M5N4P9R0S1V2."));
        assert_eq!(signer.verify(&signed), Some(user_id.to_string()));
    }

    #[test]
    fn test_verify_rejects_tampered_signature() {
        let signer = SessionSigner::new([0u8; 32]);
        let signed = signer.sign("user");

        let tampered = format!("{}x", signed);
        assert_eq!(signer.verify(&tampered), None);
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let signer = SessionSigner::new([0u8; 32]);
        let signed = signer.sign("original_user");

        let (_, signature) = signed.rsplit_once('.').unwrap();
        let tampered = format!("different_user.{}", signature);

        assert_eq!(signer.verify(&tampered), None);
    }

    #[test]
    fn test_verify_rejects_missing_signature() {
        let signer = SessionSigner::new([0u8; 32]);
        assert_eq!(signer.verify("no_signature_here"), None);
        assert_eq!(signer.verify(""), None);
        assert_eq!(signer.verify("."), None);
    }

    #[test]
    fn test_different_secrets_do_not_cross_verify() {
        let signer1 = SessionSigner::new([0u8; 32]);
        let signer2 = SessionSigner::new([1u8; 32]);

        let signed1 = signer1.sign("same_user");
        let signed2 = signer2.sign("same_user");

        assert_ne!(signed1, signed2);
        assert_eq!(signer1.verify(&signed2), None);
        assert_eq!(signer2.verify(&signed1), None);
    }

    #[test]
    fn test_random_signers_differ() {
        let signed1 = SessionSigner::random().sign("user");
        let signed2 = SessionSigner::random().sign("user");
        assert_ne!(signed1, signed2);
    }

    #[test]
    fn test_verify_rejects_extra_segment() {
        let signer = SessionSigner::new([0u8; 32]);
        let invalid = format!("{}.extra", signer.sign("test"));

        // rsplit_once takes the last dot, so the signature no longer matches
        assert_eq!(signer.verify(&invalid), None);
    }
}
