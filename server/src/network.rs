//! UDP transport feeding datagrams into the responder.

use log::{debug, error, info};
use shared::QueryError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

use crate::responder::QueryResponder;

// SQP requests are at most 8 bytes; oversized datagrams are still read in
// full so classification can reject them instead of truncating.
const RECV_BUFFER_SIZE: usize = 2048;

/// UDP server owning the query socket and driving the responder.
pub struct Server {
    socket: Arc<UdpSocket>,
    responder: Arc<QueryResponder>,
}

impl Server {
    /// Binds the query socket.
    pub async fn bind(
        addr: &str,
        responder: Arc<QueryResponder>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("SQP server listening on {}", socket.local_addr()?);

        Ok(Self { socket, responder })
    }

    /// Address the socket actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Runs `workers` concurrent receive loops over the shared socket.
    ///
    /// Returns only if every worker task ends, which in practice means the
    /// surrounding task was cancelled.
    pub async fn run(&self, workers: usize) {
        let mut handles = Vec::new();

        for worker in 0..workers.max(1) {
            let socket = Arc::clone(&self.socket);
            let responder = Arc::clone(&self.responder);
            handles.push(tokio::spawn(async move {
                receive_loop(worker, socket, responder).await;
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
            }
        }
    }
}

async fn receive_loop(worker: usize, socket: Arc<UdpSocket>, responder: Arc<QueryResponder>) {
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    debug!("Worker {} listening", worker);

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, addr)) => match responder.respond(addr, &buf[..len]) {
                Ok(reply) => {
                    if let Err(e) = socket.send_to(&reply, addr).await {
                        error!("Failed to send reply to {}: {}", addr, e);
                    }
                }
                // Every rejection stays silent on the wire: no bytes go back
                // for a packet the responder refused
                Err(err @ QueryError::EncodingFailure(_)) => {
                    error!("Dropped response for {}: {}", addr, err);
                }
                Err(err) => {
                    debug!("Dropped packet from {}: {}", addr, err);
                }
            },
            Err(e) => {
                error!("Error receiving packet: {}", e);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}
