//! RSA utilities
use rsa::{
    pkcs1::DecodeRsaPublicKey,
    pkcs8::{
        DecodePrivateKey,
        DecodePublicKey,
        EncodePrivateKey,
        EncodePublicKey,
        LineEnding,
    },
    pkcs1v15::{Signature, SigningKey, VerifyingKey},
    signature::{
        SignatureEncoding,
        Signer,
        Verifier,
    },
};
use sha2::Sha256;

pub use rsa::{RsaPrivateKey as RsaSecretKey, RsaPublicKey};
pub type RsaError = rsa::errors::Error;

// Local actors are registered with 4096-bit keys
const RSA_KEY_SIZE: usize = 4096;

pub fn generate_rsa_key() -> Result<RsaSecretKey, RsaError> {
    let mut rng = rand::rngs::OsRng;
    RsaSecretKey::new(&mut rng, RSA_KEY_SIZE)
}

#[cfg(any(test, feature = "test-utils"))]
pub fn generate_weak_rsa_key() -> Result<RsaSecretKey, RsaError> {
    use rand::SeedableRng;
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let bits = 512;
    RsaSecretKey::new(&mut rng, bits)
}

#[derive(thiserror::Error, Debug)]
pub enum RsaSerializationError {
    #[error(transparent)]
    Pkcs1Error(#[from] rsa::pkcs1::Error),

    #[error(transparent)]
    Pkcs8Error(#[from] rsa::pkcs8::Error),

    #[error(transparent)]
    PemError(#[from] pem::PemError),
}

pub fn rsa_secret_key_to_pkcs8_pem(
    secret_key: &RsaSecretKey,
) -> Result<String, RsaSerializationError> {
    let secret_key_pem = secret_key.to_pkcs8_pem(LineEnding::LF)
        .map(|val| val.to_string())?;
    Ok(secret_key_pem)
}

pub fn rsa_secret_key_from_pkcs8_pem(
    secret_key_pem: &str,
) -> Result<RsaSecretKey, RsaSerializationError> {
    let secret_key = RsaSecretKey::from_pkcs8_pem(secret_key_pem)?;
    Ok(secret_key)
}

pub fn rsa_public_key_to_pkcs8_pem(
    public_key: &RsaPublicKey,
) -> Result<String, RsaSerializationError> {
    let public_key_pem = public_key.to_public_key_pem(LineEnding::LF)
        .map_err(rsa::pkcs8::Error::from)?;
    Ok(public_key_pem)
}

pub fn deserialize_rsa_public_key(
    public_key_pem: &str,
) -> Result<RsaPublicKey, RsaSerializationError> {
    if public_key_pem.contains("BEGIN RSA PUBLIC KEY") {
        let public_key = RsaPublicKey::from_pkcs1_pem(public_key_pem.trim())?;
        return Ok(public_key);
    };
    // rsa package can't decode PEM string with non-standard wrap width,
    // so the input should be normalized first
    let parsed_pem = pem::parse(public_key_pem.trim().as_bytes())?;
    let normalized_pem = pem::encode(&parsed_pem);
    let public_key = RsaPublicKey::from_public_key_pem(&normalized_pem)
        .map_err(rsa::pkcs8::Error::from)?;
    Ok(public_key)
}

/// RSASSA-PKCS1-v1_5 signature
pub fn create_rsa_sha256_signature(
    secret_key: &RsaSecretKey,
    message: &[u8],
) -> Result<Vec<u8>, RsaError> {
    let signing_key = SigningKey::<Sha256>::new(secret_key.clone());
    let signature = signing_key.sign(message);
    Ok(signature.to_vec())
}

pub fn verify_rsa_sha256_signature(
    public_key: &RsaPublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), RsaError> {
    let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
    let signature = match Signature::try_from(signature) {
        Ok(signature) => signature,
        Err(_) => return Err(RsaError::Verification),
    };
    verifying_key.verify(message, &signature)
        .map_err(|_| RsaError::Verification)
}
