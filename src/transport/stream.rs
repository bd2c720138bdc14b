//! TCP stream session against the chat server

use crate::clock;
use crate::codec::{self, FrameReader};
use crate::error::{AppError, Result};
use crate::logging::SessionLogger;
use crate::models::{Config, TimestampedMessage};
use crate::sink::LatencySink;
use crate::types::{Framing, SessionState};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// A receiver wakes up this often to re-check the run deadline.
const IDLE_TICK: Duration = Duration::from_secs(1);

/// Settings a session needs once connected
#[derive(Debug, Clone)]
pub struct StreamOptions {
    pub bot_id: u64,
    pub is_sender: bool,
    pub send_interval: Duration,
    pub duration: Duration,
    pub buffer_size: usize,
    pub framing: Framing,
}

impl StreamOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bot_id: config.bot_id,
            is_sender: config.is_sender,
            send_interval: config.send_interval(),
            duration: config.duration(),
            buffer_size: config.buffer_size,
            framing: config.framing,
        }
    }
}

/// What a finished session did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Messages written by the send loop
    pub messages_sent: u64,
    /// Echoes that produced a latency sample
    pub messages_received: u64,
    /// Bytes thrown away by the line framer
    pub discarded_bytes: usize,
    /// Whether the server closed or reset the connection first
    pub peer_closed: bool,
    pub state: SessionState,
}

struct ReceiveOutcome {
    received: u64,
    discarded_bytes: usize,
    peer_closed: bool,
}

/// A connected TCP session
pub struct StreamSession {
    stream: TcpStream,
    peer: String,
    bot_id: u64,
    state: SessionState,
    logger: SessionLogger,
}

impl StreamSession {
    /// Connect to the chat server. Failure is a connection error, which is
    /// fatal for the run.
    pub async fn connect(host: &str, port: u16, bot_id: u64, logger: SessionLogger) -> Result<Self> {
        let peer = format!("{}:{}", host, port);

        let stream = match TcpStream::connect(&peer).await {
            Ok(stream) => stream,
            Err(e) => {
                let reason = if e.kind() == std::io::ErrorKind::ConnectionRefused {
                    "Connection refused".to_string()
                } else {
                    e.to_string()
                };
                logger.log_connection(bot_id, &peer, false, Some(&reason)).await;
                return Err(AppError::connection(format!("Bot {}: {} ({})", bot_id, reason, peer)));
            }
        };

        // Small messages must not wait for Nagle coalescing.
        if let Err(e) = stream.set_nodelay(true) {
            crate::log_warn!(logger.logger(), "Bot {} could not disable Nagle: {}", bot_id, e);
        }

        logger.log_connection(bot_id, &peer, true, None).await;
        logger.log_state_transition(bot_id, SessionState::Connecting, SessionState::Connected).await;

        Ok(Self {
            stream,
            peer,
            bot_id,
            state: SessionState::Connected,
            logger,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Run the send and receive loops until the duration elapses, the peer
    /// goes away or `cancel` fires. The receive task is always joined before
    /// this returns, so the sink can be read afterwards.
    pub async fn run(
        self,
        options: &StreamOptions,
        sink: LatencySink,
        cancel: CancellationToken,
    ) -> Result<SessionReport> {
        let Self { stream, bot_id, mut state, logger, .. } = self;

        logger.log_state_transition(bot_id, state, SessionState::Running).await;
        state = SessionState::Running;

        let (reader, writer) = stream.into_split();

        let receive_stop = cancel.child_token();
        let peer_gone = cancel.child_token();

        let receive_task = tokio::spawn(receive_loop(
            reader,
            options.clone(),
            sink,
            receive_stop.clone(),
            peer_gone.clone(),
            logger.clone(),
        ));

        crate::log_info!(
            logger.logger(),
            "Bot {} connected and {} messages",
            bot_id,
            if options.is_sender { "sending" } else { "receiving" }
        );

        let (messages_sent, mut writer) = send_loop(writer, options, &peer_gone, &logger).await;

        receive_stop.cancel();
        let outcome = receive_task.await?;

        // Closing our half tells the server we are done.
        let _ = writer.shutdown().await;
        logger.log_state_transition(bot_id, state, SessionState::Closed).await;
        state = SessionState::Closed;

        Ok(SessionReport {
            messages_sent,
            messages_received: outcome.received,
            discarded_bytes: outcome.discarded_bytes,
            peer_closed: outcome.peer_closed,
            state,
        })
    }
}

async fn send_loop(
    mut writer: OwnedWriteHalf,
    options: &StreamOptions,
    stop: &CancellationToken,
    logger: &SessionLogger,
) -> (u64, OwnedWriteHalf) {
    let start = Instant::now();
    let mut sequence = 0u64;

    while start.elapsed() < options.duration {
        if stop.is_cancelled() {
            break;
        }

        let pause = if options.is_sender {
            let message = TimestampedMessage {
                sender_id: options.bot_id,
                sequence,
                timestamp_us: clock::now_us(),
            };
            let bytes = codec::encode_framed(&message, options.framing);

            // A server that stops reading fills the send buffer; the write
            // must still give way to cancellation.
            let written = tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                written = writer.write_all(&bytes) => written,
            };

            if let Err(e) = written {
                let error = if super::is_disconnect(&e) {
                    AppError::transport(format!("Server connection lost: {}", e))
                } else {
                    AppError::transport(e.to_string())
                };
                logger.log_transport_error(options.bot_id, "send", &error).await;
                break;
            }

            sequence += 1;
            options.send_interval
        } else {
            IDLE_TICK.min(options.duration.saturating_sub(start.elapsed()))
        };

        tokio::select! {
            _ = stop.cancelled() => break,
            _ = time::sleep(pause) => {}
        }
    }

    if options.is_sender {
        logger.log_loop_finished(options.bot_id, "send", sequence).await;
    }

    (sequence, writer)
}

async fn receive_loop(
    mut reader: OwnedReadHalf,
    options: StreamOptions,
    sink: LatencySink,
    stop: CancellationToken,
    peer_gone: CancellationToken,
    logger: SessionLogger,
) -> ReceiveOutcome {
    let mut buffer = vec![0u8; options.buffer_size];
    let mut frames = FrameReader::new(options.framing, options.buffer_size);
    let mut received = 0u64;
    let mut peer_closed = false;

    loop {
        let read = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            read = reader.read(&mut buffer) => read,
        };

        match read {
            Ok(0) => {
                crate::log_info!(logger.logger(), "Bot {}: server closed the connection", options.bot_id);
                peer_closed = true;
                break;
            }
            Ok(n) => {
                frames.feed(&buffer[..n], |frame| {
                    if super::record_payload(frame, &sink).is_some() {
                        received += 1;
                    }
                });
            }
            Err(e) => {
                peer_closed = super::is_disconnect(&e);
                let error = if peer_closed {
                    AppError::transport(format!("Server connection lost: {}", e))
                } else {
                    AppError::transport(e.to_string())
                };
                logger.log_transport_error(options.bot_id, "receive", &error).await;
                break;
            }
        }
    }

    // Lets a sender stop early when the server is gone.
    peer_gone.cancel();

    let dropped = sink.dropped();
    logger.log_loop_finished(options.bot_id, "receive", received).await;
    logger.log_dropped(options.bot_id, dropped.malformed, dropped.skewed, frames.discarded_bytes()).await;

    ReceiveOutcome {
        received,
        discarded_bytes: frames.discarded_bytes(),
        peer_closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpSocket};

    fn quiet_logger() -> SessionLogger {
        SessionLogger::new(&Config::default())
    }

    fn options(is_sender: bool, rate: u32, duration: Duration, framing: Framing) -> StreamOptions {
        StreamOptions {
            bot_id: 1,
            is_sender,
            send_interval: Duration::from_secs_f64(1.0 / rate as f64),
            duration,
            buffer_size: 1024,
            framing,
        }
    }

    /// Echo every byte back, like a chat server with one member.
    async fn spawn_echo() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if socket.write_all(&buf[..n]).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        port
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = StreamSession::connect("127.0.0.1", port, 9, quiet_logger())
            .await
            .err()
            .unwrap();
        assert_eq!(err.category(), "CONNECT");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_sender_records_round_trips() {
        let port = spawn_echo().await;
        let session = StreamSession::connect("127.0.0.1", port, 1, quiet_logger()).await.unwrap();
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(session.peer(), format!("127.0.0.1:{}", port));

        let sink = LatencySink::new();
        let opts = options(true, 20, Duration::from_millis(500), Framing::Line);
        let report = session.run(&opts, sink.clone(), CancellationToken::new()).await.unwrap();

        assert_eq!(report.state, SessionState::Closed);
        assert!(report.messages_sent >= 5, "sent {}", report.messages_sent);
        assert!(report.messages_received > 0);
        assert!(report.messages_received <= report.messages_sent);
        assert_eq!(sink.len() as u64, report.messages_received);
    }

    #[tokio::test]
    async fn test_receiver_idles_until_cancelled() {
        let port = spawn_echo().await;
        let session = StreamSession::connect("127.0.0.1", port, 1, quiet_logger()).await.unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let opts = options(false, 10, Duration::from_secs(30), Framing::Raw);
        let report = time::timeout(
            Duration::from_secs(5),
            session.run(&opts, LatencySink::new(), cancel),
        )
        .await
        .expect("cancellation must end the session")
        .unwrap();

        assert_eq!(report.messages_sent, 0);
        assert_eq!(report.state, SessionState::Closed);
    }

    #[tokio::test]
    async fn test_peer_close_ends_session_early() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            time::sleep(Duration::from_millis(100)).await;
            drop(socket);
        });

        let session = StreamSession::connect("127.0.0.1", port, 1, quiet_logger()).await.unwrap();
        let opts = options(false, 10, Duration::from_secs(30), Framing::Raw);
        let report = time::timeout(
            Duration::from_secs(5),
            session.run(&opts, LatencySink::new(), CancellationToken::new()),
        )
        .await
        .expect("peer close must end the session")
        .unwrap();

        assert!(report.peer_closed);
        assert_eq!(report.state, SessionState::Closed);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_send_to_stalled_server() {
        let server = TcpSocket::new_v4().unwrap();
        server.set_recv_buffer_size(4096).unwrap();
        server.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = server.listen(1).unwrap();
        let addr = listener.local_addr().unwrap();

        // Accepts and then never reads, so the client's writes back up.
        let stalled = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            time::sleep(Duration::from_secs(60)).await;
            drop(socket);
        });

        let client = TcpSocket::new_v4().unwrap();
        client.set_send_buffer_size(4096).unwrap();
        let session = StreamSession {
            stream: client.connect(addr).await.unwrap(),
            peer: addr.to_string(),
            bot_id: 1,
            state: SessionState::Connected,
            logger: quiet_logger(),
        };

        let opts = StreamOptions {
            send_interval: Duration::ZERO,
            ..options(true, 1, Duration::from_secs(60), Framing::Raw)
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let interrupt = async move {
            time::sleep(Duration::from_millis(1500)).await;
            trigger.cancel();
        };

        let (report, ()) = time::timeout(
            Duration::from_secs(10),
            async { tokio::join!(session.run(&opts, LatencySink::new(), cancel), interrupt) },
        )
        .await
        .expect("cancellation must end a blocked send");

        let report = report.unwrap();
        assert!(report.messages_sent > 0);
        assert_eq!(report.state, SessionState::Closed);
        stalled.abort();
    }
}
