//! Hybrid credential encryption for controllers that require it
//!
//! A fresh AES-128-CBC key/IV pair encrypts the payload; the key||IV
//! concatenation is wrapped with RSA PKCS#1 v1.5 under the controller's
//! public key. The wrapped key is URL-safe unpadded base64 and the
//! ciphertext standard base64, the exact shape the controller's web client
//! submits.

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use anyhow::{Context, Result};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use rand::Rng;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

#[derive(Debug, Clone)]
pub struct EncryptedCredentials {
    /// RSA-wrapped AES key||IV, URL-safe base64 without padding.
    pub encrypted_key: String,
    /// AES-128-CBC ciphertext, standard base64.
    pub encrypted_data: String,
}

/// Encrypt `data` for the holder of `public_key_pem` (SPKI or PKCS#1 PEM).
pub fn rsa_aes_encrypt(data: &[u8], public_key_pem: &str) -> Result<EncryptedCredentials> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(public_key_pem))
        .context("invalid RSA public key PEM")?;

    let mut rng = rand::thread_rng();
    let mut aes_key = [0u8; 16];
    let mut aes_iv = [0u8; 16];
    rng.fill(&mut aes_key);
    rng.fill(&mut aes_iv);

    let ciphertext = Aes128CbcEnc::new(&aes_key.into(), &aes_iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(data);

    let mut key_iv = Vec::with_capacity(32);
    key_iv.extend_from_slice(&aes_key);
    key_iv.extend_from_slice(&aes_iv);
    let wrapped_key = public_key
        .encrypt(&mut rng, Pkcs1v15Encrypt, &key_iv)
        .context("RSA key wrap failed")?;

    Ok(EncryptedCredentials {
        encrypted_key: URL_SAFE_NO_PAD.encode(wrapped_key),
        encrypted_data: STANDARD.encode(ciphertext),
    })
}
