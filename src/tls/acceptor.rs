//! TLS acceptor creation from a keystore identity

use log::{debug, info};
use openssl::ssl::{SslAcceptor, SslMethod, SslOptions, SslVerifyMode};

use super::keystore::KeystoreIdentity;
use crate::common::Result;
use crate::config::ClientCertMode;

/// Cipher list for TLS 1.2 and below: everything the OpenSSL build offers
pub const LEGACY_CIPHER_LIST: &str = "ALL";

/// Every TLS 1.3 suite OpenSSL knows about
pub const TLS13_CIPHERSUITES: &str = "TLS_AES_256_GCM_SHA384:TLS_CHACHA20_POLY1305_SHA256:\
TLS_AES_128_GCM_SHA256:TLS_AES_128_CCM_SHA256:TLS_AES_128_CCM_8_SHA256";

/// Create the TLS acceptor for the listening socket
///
/// No cipher suite restriction is applied. The identity's CA chain is sent
/// to clients and, when client certificates are verified, used as trust store.
pub fn create_tls_acceptor(
    identity: &KeystoreIdentity,
    client_cert_mode: &ClientCertMode,
) -> Result<SslAcceptor> {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls())?;

    acceptor.set_private_key(identity.key())?;
    acceptor.set_certificate(identity.cert())?;
    acceptor.check_private_key()?;

    for ca in identity.chain() {
        acceptor.add_extra_chain_cert(ca.clone())?;
        acceptor.cert_store_mut().add_cert(ca.clone())?;
    }

    // the mozilla profile switches TLS 1.0 and 1.1 off through options, not the version floor
    acceptor.clear_options(SslOptions::NO_TLSV1 | SslOptions::NO_TLSV1_1);
    acceptor.set_min_proto_version(None)?;
    acceptor.set_cipher_list(LEGACY_CIPHER_LIST)?;
    acceptor.set_ciphersuites(TLS13_CIPHERSUITES)?;
    debug!("Enabled cipher list '{}' and TLS 1.3 suites '{}'", LEGACY_CIPHER_LIST, TLS13_CIPHERSUITES);

    match client_cert_mode {
        ClientCertMode::Required => {
            info!("Client certificates required (will be verified)");
            acceptor.set_verify(SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT);
        },
        ClientCertMode::Optional => {
            info!("Client certificates optional (will be verified if provided)");
            acceptor.set_verify(SslVerifyMode::PEER);
        },
        ClientCertMode::None => {
            debug!("Client certificates not requested");
            acceptor.set_verify(SslVerifyMode::NONE);
        },
    }

    Ok(acceptor.build())
}
