use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Checks that `header_signature` is the base64-encoded HMAC-SHA256 of the
/// raw request body under the channel secret. This is the only
/// authentication the webhook endpoint has.
///
/// The comparison runs in constant time; a header that is not valid base64
/// counts as a mismatch.
pub fn verify(header_signature: &str, body: &[u8], secret: &str) -> bool {
    let Ok(expected) = STANDARD.decode(header_signature) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("any key length is valid");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &str = "channel secret";

    #[test]
    fn test_valid_signature() {
        let body = br#"{"events":[{"replyToken":"T1"}]}"#;
        assert!(verify(&sign(body, SECRET), body, SECRET));
    }

    #[test]
    fn test_tampered_body() {
        let body = br#"{"events":[{"replyToken":"T1"}]}"#;
        let signature = sign(body, SECRET);

        let mut tampered = body.to_vec();
        tampered[10] ^= 1;
        assert!(!verify(&signature, &tampered, SECRET));
    }

    #[test]
    fn test_tampered_signature() {
        let body = br#"{"events":[{"replyToken":"T1"}]}"#;
        let signature = sign(body, SECRET);

        let mut chars = signature.into_bytes();
        chars[0] = if chars[0] == b'A' { b'B' } else { b'A' };
        assert!(!verify(&String::from_utf8(chars).unwrap(), body, SECRET));
    }

    #[test]
    fn test_wrong_secret() {
        let body = b"body";
        assert!(!verify(&sign(body, SECRET), body, "another secret"));
    }

    #[test]
    fn test_signature_not_base64() {
        assert!(!verify("definitely not base64!!!", b"body", SECRET));
    }

    #[test]
    fn test_empty_signature() {
        assert!(!verify("", b"body", SECRET));
    }
}
