//! Network delivery of encoded CoT payloads.
//!
//! One payload per call. TCP opens a fresh connection, writes, and shuts
//! down; UDP is fire-and-forget from an ephemeral socket. Delivery means
//! the socket layer accepted the bytes, nothing stronger.

use std::io::Write;
use std::net::{Shutdown, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use crate::config::{Protocol, TakEndpoint};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
enum TransportError {
    #[error("no address resolved for {0}")]
    Resolve(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Send one payload to the endpoint. Failures are logged and reported as
/// `false` rather than propagated; a dropped report must never take the
/// pipeline down with it.
pub fn send(endpoint: &TakEndpoint, payload: &[u8]) -> bool {
    match try_send(endpoint, payload) {
        Ok(()) => {
            info!(
                endpoint = %endpoint.authority(),
                protocol = %endpoint.protocol,
                bytes = payload.len(),
                "CoT payload sent"
            );
            true
        }
        Err(err) => {
            error!(
                endpoint = %endpoint.authority(),
                protocol = %endpoint.protocol,
                %err,
                "CoT send failed"
            );
            false
        }
    }
}

fn try_send(endpoint: &TakEndpoint, payload: &[u8]) -> Result<(), TransportError> {
    let authority = endpoint.authority();
    let addr = authority
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| TransportError::Resolve(authority.clone()))?;

    match endpoint.protocol {
        Protocol::Tcp => {
            let mut stream = TcpStream::connect_timeout(&addr, SEND_TIMEOUT)?;
            stream.set_write_timeout(Some(SEND_TIMEOUT))?;
            stream.write_all(payload)?;
            stream.flush()?;
            stream.shutdown(Shutdown::Both)?;
        }
        Protocol::Udp => {
            let socket = UdpSocket::bind(("0.0.0.0", 0))?;
            socket.set_write_timeout(Some(SEND_TIMEOUT))?;
            socket.send_to(payload, addr)?;
        }
    }
    Ok(())
}
