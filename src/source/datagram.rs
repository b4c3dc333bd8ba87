//! UDP receiver for snapshots pushed by a remote capture agent.
//!
//! Each datagram carries exactly one chunk. Receives time out so that the capture
//! loop gets a chance to observe cancellation between datagrams.

use crate::config::NetworkConfig;
use crate::error::{AppResult, SweepError};
use crate::source::ByteSource;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use tracing::{debug, info, trace};

/// Receive buffer size in chunks, so an oversize datagram shows up as a length mismatch.
const RECV_BUFFER_CHUNKS: usize = 10;

/// Snapshot source backed by a bound UDP socket.
pub struct DatagramSource {
    socket: UdpSocket,
    expected_len: usize,
    buffer: Vec<u8>,
}

impl DatagramSource {
    /// Bind to `config.bind_addr` with `config.recv_timeout` as the receive timeout.
    pub fn bind(config: &NetworkConfig, expected_len: usize) -> AppResult<Self> {
        let socket = UdpSocket::bind(config.bind_addr).map_err(|e| {
            SweepError::resource(format!("udp://{}", config.bind_addr), e)
        })?;
        socket.set_read_timeout(Some(config.recv_timeout))?;

        let source = Self {
            socket,
            expected_len,
            buffer: vec![0u8; expected_len.max(1) * RECV_BUFFER_CHUNKS],
        };
        info!(addr = %source.local_addr()?, "Listening for sweep dump datagrams");
        Ok(source)
    }

    /// Address the socket is actually bound to.
    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive one datagram, classifying timeouts and short receives as transient.
    fn receive(&mut self) -> AppResult<Vec<u8>> {
        let (len, peer) = self.socket.recv_from(&mut self.buffer).map_err(|e| match e.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                SweepError::Transient("receive timed out".to_string())
            }
            _ => SweepError::Transient(format!("receive failed: {e}")),
        })?;

        if len != self.expected_len {
            return Err(SweepError::Transient(format!(
                "datagram from {peer} carried {len} bytes, expected {}",
                self.expected_len
            )));
        }

        trace!(%peer, len, "Datagram received");
        Ok(self.buffer[..len].to_vec())
    }
}

impl ByteSource for DatagramSource {
    fn expected_len(&self) -> usize {
        self.expected_len
    }

    fn snapshot(&mut self) -> AppResult<Option<Vec<u8>>> {
        match self.receive() {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.is_transient() => {
                debug!(error = %err, "No snapshot this poll");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn describe(&self) -> String {
        match self.socket.local_addr() {
            Ok(addr) => format!("udp {addr}"),
            Err(_) => "udp (unbound)".to_string(),
        }
    }
}
