//! Credential store handling
//!
//! The server identity lives in a password-protected PKCS#12 archive: private
//! key, certificate and an optional CA chain that also serves as the trust
//! store for client certificates.

use log::debug;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use std::fs;
use std::path::Path;

use super::passphrase::Passphrase;
use crate::common::{ListenerError, Result};

/// Server identity decoded from the credential store
pub struct KeystoreIdentity {
    key: PKey<Private>,
    cert: X509,
    chain: Vec<X509>,
}

impl KeystoreIdentity {
    /// Server private key
    pub fn key(&self) -> &PKey<Private> {
        &self.key
    }

    /// Server certificate
    pub fn cert(&self) -> &X509 {
        &self.cert
    }

    /// CA certificates bundled with the identity
    pub fn chain(&self) -> &[X509] {
        &self.chain
    }

    /// Certificate subject, e.g. `CN=listener, O=Example`
    pub fn subject(&self) -> String {
        self.cert
            .subject_name()
            .entries()
            .map(|entry| {
                let field = entry.object().nid().short_name().unwrap_or("?");
                let value = String::from_utf8_lossy(entry.data().as_slice());
                format!("{}={}", field, value)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// SHA-256 fingerprint as colon separated upper-case hex
    pub fn fingerprint(&self) -> Result<String> {
        let digest = self.cert.digest(MessageDigest::sha256())?;
        Ok(digest
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":"))
    }
}

/// Open and decrypt the credential store at `path`
///
/// The passphrase is consumed and erased before this returns, whatever the outcome.
///
/// # Errors
///
/// `ListenerError::Configuration` when the file cannot be read, is not a
/// PKCS#12 archive, the passphrase is wrong, or the archive lacks a key or
/// certificate.
pub fn load_keystore(path: &Path, passphrase: Passphrase) -> Result<KeystoreIdentity> {
    let der = fs::read(path).map_err(|e| {
        ListenerError::Configuration(format!("Cannot open keystore {}: {}", path.display(), e))
    })?;
    debug!("Read {} bytes from keystore {}", der.len(), path.display());

    decode_keystore(&der, passphrase)
}

/// Decode a DER-encoded PKCS#12 archive
pub fn decode_keystore(der: &[u8], mut passphrase: Passphrase) -> Result<KeystoreIdentity> {
    let parsed = Pkcs12::from_der(der)
        .and_then(|archive| archive.parse2(passphrase.as_str()));
    passphrase.erase();

    let parsed = parsed.map_err(|e| {
        ListenerError::Configuration(format!(
            "Cannot decode keystore (wrong passphrase or corrupt file): {}",
            e
        ))
    })?;

    let key = parsed.pkey.ok_or_else(|| {
        ListenerError::Configuration("Keystore contains no private key".to_string())
    })?;
    let cert = parsed.cert.ok_or_else(|| {
        ListenerError::Configuration("Keystore contains no certificate".to_string())
    })?;
    let chain: Vec<X509> = parsed
        .ca
        .map(|stack| stack.into_iter().collect())
        .unwrap_or_default();

    debug!("Keystore holds {} CA certificate(s)", chain.len());

    Ok(KeystoreIdentity { key, cert, chain })
}
