//! Network utility functions
//!
//! This module provides utility functions for network operations.

use std::net::{IpAddr, SocketAddr};

/// Build the listening socket address
///
/// # Arguments
///
/// * `bind` - Interface address to listen on
/// * `port` - TCP port
pub fn listen_addr(bind: IpAddr, port: u16) -> SocketAddr {
    SocketAddr::new(bind, port)
}

/// Textual identifier of a connected client
///
/// This is the peer IP without the port. IPv4 peers accepted on a dual-stack
/// socket are reported in their plain dotted form.
pub fn endpoint_id(peer: &SocketAddr) -> String {
    match peer.ip() {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        ip => ip.to_string(),
    }
}
