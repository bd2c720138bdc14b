//! UDP multicast feed listener
//!
//! Several bots on one host can listen to the same group and port: the
//! socket sets `SO_REUSEADDR`, and `SO_REUSEPORT` on Unix, before binding.

use crate::codec;
use crate::error::{AppError, Result};
use crate::logging::SessionLogger;
use crate::sink::LatencySink;
use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

/// What a finished listener did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerReport {
    /// Datagrams read from the socket
    pub datagrams: u64,
    /// Datagrams that produced a latency sample
    pub samples: u64,
}

/// A socket joined to a multicast group
pub struct MulticastListener {
    socket: UdpSocket,
    group: Ipv4Addr,
    port: u16,
    bot_id: u64,
    logger: SessionLogger,
}

fn open_receiver(group: Ipv4Addr, port: u16, interface: Ipv4Addr) -> io::Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    socket.bind(&addr.into())?;
    socket.join_multicast_v4(&group, &interface)?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

impl MulticastListener {
    /// Bind `0.0.0.0:port` and join `group` on `interface`.
    pub async fn join(
        group: Ipv4Addr,
        port: u16,
        interface: Ipv4Addr,
        bot_id: u64,
        logger: SessionLogger,
    ) -> Result<Self> {
        if !group.is_multicast() {
            return Err(AppError::bind(format!("{} is not a multicast group", group)));
        }

        let socket = open_receiver(group, port, interface)
            .and_then(UdpSocket::from_std)
            .map_err(|e| AppError::bind(format!("Error binding multicast socket {}:{}: {}", group, port, e)))?;

        logger.log_joined(bot_id, &group.to_string(), port, &interface.to_string()).await;

        Ok(Self {
            socket,
            group,
            port,
            bot_id,
            logger,
        })
    }

    pub fn group(&self) -> Ipv4Addr {
        self.group
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Receive datagrams until `cancel` fires or the socket fails.
    pub async fn run(self, buffer_size: usize, sink: LatencySink, cancel: CancellationToken) -> ListenerReport {
        let mut buffer = vec![0u8; buffer_size];
        let mut report = ListenerReport { datagrams: 0, samples: 0 };

        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = self.socket.recv_from(&mut buffer) => received,
            };

            match received {
                Ok((n, _from)) => {
                    report.datagrams += 1;
                    if super::record_payload(&buffer[..n], &sink).is_some() {
                        report.samples += 1;
                    }
                }
                Err(e) => {
                    let error = AppError::transport(format!("Multicast listener error: {}", e));
                    self.logger.log_transport_error(self.bot_id, "multicast", &error).await;
                    break;
                }
            }
        }

        let dropped = sink.dropped();
        self.logger.log_loop_finished(self.bot_id, "multicast", report.samples).await;
        self.logger.log_dropped(self.bot_id, dropped.malformed, dropped.skewed, 0).await;

        report
    }
}

/// Publishes stamped messages to a group, as the chat server's feed does.
pub struct MulticastPublisher {
    socket: UdpSocket,
    target: SocketAddr,
}

impl MulticastPublisher {
    /// Open a sender on `interface` with TTL 1 and loopback enabled, so
    /// listeners on the same host receive the datagrams.
    pub fn open(group: Ipv4Addr, port: u16, interface: Ipv4Addr) -> Result<Self> {
        let socket = open_sender(interface)
            .and_then(UdpSocket::from_std)
            .map_err(|e| AppError::bind(format!("Error opening multicast sender: {}", e)))?;

        Ok(Self {
            socket,
            target: SocketAddr::V4(SocketAddrV4::new(group, port)),
        })
    }

    /// Send one message stamped now
    pub async fn publish(&self, sender_id: u64, sequence: u64) -> Result<()> {
        let payload = codec::encode_now(sender_id, sequence);
        self.publish_raw(&payload).await
    }

    /// Send arbitrary bytes
    pub async fn publish_raw(&self, payload: &[u8]) -> Result<()> {
        self.socket
            .send_to(payload, self.target)
            .await
            .map_err(|e| AppError::transport(format!("Multicast send failed: {}", e)))?;
        Ok(())
    }
}

fn open_sender(interface: Ipv4Addr) -> io::Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_multicast_ttl_v4(1)?;
    socket.set_multicast_loop_v4(true)?;
    socket.set_multicast_if_v4(&interface)?;
    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;

    #[tokio::test]
    async fn test_join_rejects_unicast_group() {
        let logger = SessionLogger::new(&Config::default());
        let err = MulticastListener::join(Ipv4Addr::new(10, 0, 0, 1), 0, Ipv4Addr::UNSPECIFIED, 1, logger)
            .await
            .err()
            .unwrap();

        assert_eq!(err.category(), "BIND");
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_cancel_ends_idle_listener() {
        let logger = SessionLogger::new(&Config::default());
        let listener = match MulticastListener::join(
            Ipv4Addr::new(239, 255, 77, 1),
            0,
            Ipv4Addr::UNSPECIFIED,
            1,
            logger,
        )
        .await
        {
            Ok(listener) => listener,
            // Hosts without a multicast route cannot join; nothing to test.
            Err(_) => return,
        };

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = listener.run(64, LatencySink::new(), cancel).await;
        assert_eq!(report, ListenerReport { datagrams: 0, samples: 0 });
    }
}
