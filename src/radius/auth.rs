//! Authenticator math and User-Password obscuring (RFC 2865 §3, §5.2)

use rand::Rng;

/// Random 16-byte Request Authenticator.
pub fn generate_request_authenticator() -> [u8; 16] {
    let mut authenticator = [0u8; 16];
    rand::thread_rng().fill(&mut authenticator[..]);
    authenticator
}

/// Verify a raw response datagram against the request it answers.
///
/// Response Authenticator = MD5(Code | ID | Length | Request Authenticator
/// | Attributes | Secret), so the check splices the request authenticator
/// into the raw bytes rather than re-encoding the packet.
pub fn verify_response_authenticator(
    raw: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> bool {
    if raw.len() < 20 {
        return false;
    }
    let mut data = Vec::with_capacity(raw.len() + secret.len());
    data.extend_from_slice(&raw[..4]);
    data.extend_from_slice(request_authenticator);
    data.extend_from_slice(&raw[20..]);
    data.extend_from_slice(secret);
    md5::compute(&data).0 == raw[4..20]
}

/// Obscure a User-Password attribute value.
///
/// The password is zero-padded to a 16-byte multiple; each block is XORed
/// with MD5(secret + previous block), seeded with the request authenticator.
pub fn obscure_user_password(password: &str, secret: &[u8], authenticator: &[u8; 16]) -> Vec<u8> {
    let mut padded = password.as_bytes().to_vec();
    let rem = padded.len() % 16;
    if rem != 0 || padded.is_empty() {
        padded.resize(padded.len() + (16 - rem) % 16, 0);
        if padded.is_empty() {
            padded.resize(16, 0);
        }
    }

    let mut result = Vec::with_capacity(padded.len());
    let mut previous: Vec<u8> = authenticator.to_vec();

    for chunk in padded.chunks(16) {
        let mut data = Vec::with_capacity(secret.len() + 16);
        data.extend_from_slice(secret);
        data.extend_from_slice(&previous);
        let hash = md5::compute(&data).0;

        let mut block = [0u8; 16];
        for (i, b) in block.iter_mut().enumerate() {
            *b = chunk[i] ^ hash[i];
        }

        previous = block.to_vec();
        result.extend_from_slice(&block);
    }

    result
}
