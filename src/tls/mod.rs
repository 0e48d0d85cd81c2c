//! TLS handling module
//!
//! Credential store decoding, passphrase entry, acceptor setup and the
//! secure channel provider that yields the session stream.

mod acceptor;
pub mod keystore;
pub mod passphrase;
pub mod provider;

pub use acceptor::{create_tls_acceptor, LEGACY_CIPHER_LIST, TLS13_CIPHERSUITES};
pub use keystore::{decode_keystore, load_keystore, KeystoreIdentity};
pub use passphrase::{prompt_passphrase, Passphrase};
pub use provider::{AcceptedChannel, SecureChannelProvider, TlsChannelProvider};
