//! AES/CBC/PKCS#7 codec for the playback handshake
//!
//! Each protocol stage has its own fixed key and IV. The key strings are
//! used as raw ASCII bytes (24 of them, so the cipher is AES-192), which is
//! what the site's player does.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{MakoError, Result};

type Encryptor = cbc::Encryptor<aes::Aes192>;
type Decryptor = cbc::Decryptor<aes::Aes192>;

const PLAYLIST_KEY: &[u8; 24] = b"LTf7r/zM2VndHwP+4So6bw==";
const ENTITLEMENT_KEY: &[u8; 24] = b"YhnUaXMmltB6gd8p9SWleQ==";
const SHARED_IV: &[u8; 16] = b"theExact16Chars=";

/// Key material for one protocol stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyset {
    /// Decrypts the AJAX playlist response
    Playlist,
    /// Encrypts the entitlement request and decrypts its response
    Entitlement,
}

impl Keyset {
    fn key(self) -> &'static [u8; 24] {
        match self {
            Keyset::Playlist => PLAYLIST_KEY,
            Keyset::Entitlement => ENTITLEMENT_KEY,
        }
    }

    fn iv(self) -> &'static [u8; 16] {
        SHARED_IV
    }
}

/// Base64-decode, decrypt and unpad `ciphertext` into UTF-8 text
///
/// # Errors
/// Returns `CryptoError` on invalid base64, a wrong block length, bad
/// padding or non-UTF-8 plaintext. Never returns partial output.
pub fn decrypt(ciphertext: &str, keyset: Keyset) -> Result<String> {
    let bytes = STANDARD
        .decode(ciphertext.trim())
        .map_err(|e| MakoError::CryptoError(format!("invalid base64: {}", e)))?;

    let plain = Decryptor::new(keyset.key().into(), keyset.iv().into())
        .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
        .map_err(|_| MakoError::CryptoError(format!("{:?} decrypt failed: bad padding", keyset)))?;

    String::from_utf8(plain)
        .map_err(|_| MakoError::CryptoError("decrypted payload is not UTF-8".to_string()))
}

/// Pad, encrypt and base64-encode `plaintext`
pub fn encrypt(plaintext: &str, keyset: Keyset) -> String {
    let cipher = Encryptor::new(keyset.key().into(), keyset.iv().into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    STANDARD.encode(cipher)
}
