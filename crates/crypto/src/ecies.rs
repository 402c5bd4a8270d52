// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! ECIES over secp256k1.
//!
//! Wire layout: `[65-byte ephemeral public key][16-byte nonce][16-byte tag][ciphertext]`.
//! The symmetric key is HKDF-SHA256 over the uncompressed ephemeral key followed by the
//! uncompressed shared point, with no salt and no info. The layout matches what the
//! eciesjs tooling around the ledger contract produces, so ciphertexts written by either
//! side decrypt on the other.

use crate::{CryptoError, PublicKey, SecretKey, PUBLIC_KEY_LEN};
use aes_gcm::{
    aead::{consts::U16, Aead, KeyInit},
    aes::Aes256,
    AesGcm, Nonce,
};
use hkdf::Hkdf;
use k256::{elliptic_curve::sec1::ToEncodedPoint, AffinePoint};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Fixed overhead added to every plaintext.
pub const CIPHERTEXT_OVERHEAD: usize = PUBLIC_KEY_LEN + NONCE_LEN + TAG_LEN;

fn shared_point(secret: &k256::SecretKey, public: &k256::PublicKey) -> Zeroizing<Vec<u8>> {
    let point = public.to_projective() * *secret.to_nonzero_scalar();
    let affine = AffinePoint::from(point);
    Zeroizing::new(affine.to_encoded_point(false).as_bytes().to_vec())
}

fn derive_key(ephemeral: &[u8], shared: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let mut master = Zeroizing::new(Vec::with_capacity(ephemeral.len() + shared.len()));
    master.extend_from_slice(ephemeral);
    master.extend_from_slice(shared);

    let mut okm = Zeroizing::new([0u8; KEY_LEN]);
    Hkdf::<Sha256>::new(None, &master)
        .expand(&[], okm.as_mut())
        .map_err(|_| CryptoError::Encryption)?;
    Ok(okm)
}

pub(crate) fn encrypt(receiver: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = k256::SecretKey::random(&mut OsRng);
    let ephemeral_pk = ephemeral.public_key().to_encoded_point(false);
    let shared = shared_point(&ephemeral, receiver.as_k256());
    let key = derive_key(ephemeral_pk.as_bytes(), &shared)?;

    let cipher =
        Aes256Gcm16::new_from_slice(key.as_ref()).map_err(|_| CryptoError::Encryption)?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    // aes-gcm appends the tag; the wire format wants it in front of the body
    let sealed = cipher
        .encrypt(Nonce::<U16>::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::Encryption)?;
    let (body, tag) = sealed.split_at(sealed.len() - TAG_LEN);

    let mut out = Vec::with_capacity(CIPHERTEXT_OVERHEAD + body.len());
    out.extend_from_slice(ephemeral_pk.as_bytes());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(tag);
    out.extend_from_slice(body);
    Ok(out)
}

pub(crate) fn decrypt(secret: &SecretKey, data: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if data.len() < CIPHERTEXT_OVERHEAD {
        return Err(CryptoError::Decryption);
    }

    let (ephemeral_pk, rest) = data.split_at(PUBLIC_KEY_LEN);
    let (nonce, rest) = rest.split_at(NONCE_LEN);
    let (tag, body) = rest.split_at(TAG_LEN);

    let ephemeral =
        k256::PublicKey::from_sec1_bytes(ephemeral_pk).map_err(|_| CryptoError::Decryption)?;
    let shared = shared_point(secret.as_k256(), &ephemeral);
    let key = derive_key(ephemeral_pk, &shared).map_err(|_| CryptoError::Decryption)?;

    let cipher =
        Aes256Gcm16::new_from_slice(key.as_ref()).map_err(|_| CryptoError::Decryption)?;

    let mut sealed = Vec::with_capacity(body.len() + TAG_LEN);
    sealed.extend_from_slice(body);
    sealed.extend_from_slice(tag);

    cipher
        .decrypt(Nonce::<U16>::from_slice(nonce), sealed.as_ref())
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn layout_has_fixed_overhead() {
        let keys = KeyPair::generate();
        let out = encrypt(&keys.public, b"hello").unwrap();
        assert_eq!(out.len(), CIPHERTEXT_OVERHEAD + 5);
        assert_eq!(out[0], 0x04);
        assert_eq!(decrypt(&keys.secret, &out).unwrap().as_slice(), b"hello");
    }

    #[test]
    fn tampered_body_fails_authentication() {
        let keys = KeyPair::generate();
        let mut out = encrypt(&keys.public, b"12345").unwrap();
        let last = out.len() - 1;
        out[last] ^= 0x01;
        assert!(matches!(
            decrypt(&keys.secret, &out),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let keys = KeyPair::generate();
        assert!(matches!(
            decrypt(&keys.secret, &[0u8; CIPHERTEXT_OVERHEAD - 1]),
            Err(CryptoError::Decryption)
        ));
    }
}
