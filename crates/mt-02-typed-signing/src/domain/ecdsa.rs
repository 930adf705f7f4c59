//! # ECDSA Recovery (secp256k1)
//!
//! Signer recovery for structured-data digests.
//!
//! ## Security Notes
//!
//! - **Malleability**: recovery accepts S in either half of the curve order,
//!   as the `ecrecover` precompile does. A high-S signature recovers the same
//!   signer as its low-S mirror. Signatures produced here are always low-S
//!   (EIP-2).
//! - **Scalar Range Validation**: R and S must be in [1, n-1].
//! - Recovery ids 0/1 and their legacy forms 27/28 are accepted.

use super::entities::RecoverableSignature;
use super::errors::SigningError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use mt_01_abi_codec::keccak256;
use shared_types::{Address, Hash};
use tracing::debug;

/// Offset of the legacy `v` encoding.
const LEGACY_V_OFFSET: u8 = 27;

/// Recover the address that signed `digest`.
pub fn recover_signer(digest: &Hash, signature: &RecoverableSignature) -> Result<Address, SigningError> {
    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);

    let sig = Signature::from_slice(&sig_bytes)
        .map_err(|_| SigningError::invalid_signature("r or s out of range"))?;
    // k256 only verifies low-S
    let (sig, recovery_id) = to_low_s(sig, recovery_id);

    let recovered_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SigningError::RecoveryFailure)?;

    Ok(address_from_pubkey(&recovered_key))
}

/// Recover the signer and require it to be `expected`.
pub fn verify_signer(
    digest: &Hash,
    signature: &RecoverableSignature,
    expected: Address,
) -> Result<Address, SigningError> {
    let actual = recover_signer(digest, signature)?;
    if actual != expected {
        debug!(expected = ?expected, actual = ?actual, "Recovered signer differs");
        return Err(SigningError::SignerMismatch { expected, actual });
    }
    Ok(actual)
}

/// Sign `digest` with a local key, producing a low-S signature with `v` in
/// legacy (27/28) form.
pub fn sign_digest(key: &SigningKey, digest: &Hash) -> Result<RecoverableSignature, SigningError> {
    let (sig, recid) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| SigningError::invalid_signature(e.to_string()))?;

    let (sig, recid) = to_low_s(sig, recid);

    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);

    Ok(RecoverableSignature {
        r,
        s,
        v: recid.to_byte() + LEGACY_V_OFFSET,
    })
}

/// Last 20 bytes of the Keccak-256 of the uncompressed public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    // skip the 0x04 tag
    let hash = keccak256(&pubkey_bytes.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Mirror a high-S signature into the lower half. Negating S mirrors R,
/// which flips the parity of its y coordinate.
fn to_low_s(sig: Signature, recid: RecoveryId) -> (Signature, RecoveryId) {
    match sig.normalize_s() {
        Some(low) => (low, RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced())),
        None => (sig, recid),
    }
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, SigningError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SigningError::invalid_signature(format!("recovery id {v}"))),
    };
    RecoveryId::try_from(id).map_err(|_| SigningError::invalid_signature(format!("recovery id {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::U256;

    fn hash_of(s: &str) -> Hash {
        let mut h = [0u8; 32];
        h.copy_from_slice(&hex::decode(s).unwrap());
        h
    }

    fn known_digest() -> Hash {
        hash_of("8258cd28afb13c201c07bf80c717d55ce13e226b725dd8a115ae5ab064e537da")
    }

    fn known_signature() -> RecoverableSignature {
        let raw = hex::decode(
            "558266d4d8cd994c9eab2dee0efeb3ee33c839e4ce77c64da544679a85bd4a86\
             4805dd1fab769e9888fdfc0ed6502f685dc43ddda1add760febd749acfcd517b1b",
        )
        .unwrap();
        RecoverableSignature::from_slice(&raw).unwrap()
    }

    fn secp256k1_order() -> U256 {
        U256::from_big_endian(
            &hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141").unwrap(),
        )
    }

    #[test]
    fn test_recover_known_signer() {
        let signer = recover_signer(&known_digest(), &known_signature()).unwrap();
        assert_eq!(hex::encode(signer), "969602c4f39d345cbe47e7fe0dd8f1f16f984d65");
    }

    #[test]
    fn test_raw_recovery_id_accepted() {
        let mut sig = known_signature();
        sig.v = 0;
        let signer = recover_signer(&known_digest(), &sig).unwrap();
        assert_eq!(hex::encode(signer), "969602c4f39d345cbe47e7fe0dd8f1f16f984d65");
    }

    #[test]
    fn test_sign_then_recover() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let expected = address_from_pubkey(key.verifying_key());
        let digest = keccak256(b"authorize mint");

        let sig = sign_digest(&key, &digest).unwrap();
        assert!(sig.v == 27 || sig.v == 28);
        assert_eq!(recover_signer(&digest, &sig).unwrap(), expected);
        assert_eq!(verify_signer(&digest, &sig, expected).unwrap(), expected);
    }

    #[test]
    fn test_signer_mismatch() {
        let err = verify_signer(&known_digest(), &known_signature(), [0x11; 20]).unwrap_err();
        assert!(matches!(err, SigningError::SignerMismatch { expected, .. } if expected == [0x11; 20]));
    }

    #[test]
    fn test_other_digest_recovers_other_signer() {
        let signer = recover_signer(&keccak256(b"different"), &known_signature()).unwrap();
        assert_ne!(hex::encode(signer), "969602c4f39d345cbe47e7fe0dd8f1f16f984d65");
    }

    #[test]
    fn test_high_s_recovers_same_signer() {
        let mut sig = known_signature();
        assert_eq!(sig.v, 27);
        let high = secp256k1_order() - U256::from_big_endian(&sig.s);
        high.to_big_endian(&mut sig.s);
        sig.v = 28;
        let signer = recover_signer(&known_digest(), &sig).unwrap();
        assert_eq!(hex::encode(signer), "969602c4f39d345cbe47e7fe0dd8f1f16f984d65");

        // keeping the original parity points at a different key
        sig.v = 27;
        assert_ne!(
            recover_signer(&known_digest(), &sig).ok(),
            Some(signer)
        );
    }

    #[test]
    fn test_signatures_produced_are_low_s() {
        let key = SigningKey::from_slice(&[3u8; 32]).unwrap();
        let half_order = secp256k1_order() / 2;
        for i in 0..16u8 {
            let sig = sign_digest(&key, &keccak256(&[i])).unwrap();
            assert!(U256::from_big_endian(&sig.s) <= half_order);
        }
    }

    #[test]
    fn test_bad_recovery_id_rejected() {
        let mut sig = known_signature();
        sig.v = 29;
        assert!(matches!(
            recover_signer(&known_digest(), &sig),
            Err(SigningError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_zero_scalar_rejected() {
        let mut sig = known_signature();
        sig.r = [0u8; 32];
        assert!(matches!(
            recover_signer(&known_digest(), &sig),
            Err(SigningError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_r_off_curve_is_recovery_failure() {
        // x = 5 has no point on secp256k1
        let mut r = [0u8; 32];
        r[31] = 5;
        let mut s = [0u8; 32];
        s[31] = 1;
        let sig = RecoverableSignature { r, s, v: 27 };
        assert_eq!(recover_signer(&known_digest(), &sig), Err(SigningError::RecoveryFailure));
    }
}
