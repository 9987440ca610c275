//! Periodic WebSocket ping while the binding is online.
//!
//! Pings keep NAT and proxy mappings alive and make a dead relay show up
//! as a write error instead of a silent hang. At most one ping task runs
//! per connector; it must be stopped (and joined) before the next socket
//! is opened.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::BindingError;

/// One-byte ping body.
pub const PING_PAYLOAD: &[u8] = b"A";

const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct Keepalive {
    running: Option<Running>,
}

impl Keepalive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start pinging through `writer` every `interval`, the first ping right
    /// away. Fails if a ping task is already running.
    pub fn start<S>(&mut self, writer: Arc<Mutex<S>>, interval: Duration) -> Result<(), BindingError>
    where
        S: Sink<WsMessage> + Unpin + Send + 'static,
        S::Error: Display,
    {
        if self.running.is_some() {
            return Err(BindingError::KeepaliveAlreadyRunning);
        }

        info!(interval_secs = interval.as_secs_f64(), "Starting keepalive");
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(ping_loop(writer, interval, cancel.clone()));
        self.running = Some(Running { cancel, handle });
        Ok(())
    }

    /// Cancel the ping task and wait for it to finish. No-op when idle.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        info!("Stopping keepalive");
        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            warn!(error = %e, "Keepalive task ended abnormally");
        }
    }
}

impl Drop for Keepalive {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
        }
    }
}

async fn ping_loop<S>(writer: Arc<Mutex<S>>, interval: Duration, cancel: CancellationToken)
where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                debug!("Pinging relay");
                let mut writer = writer.lock().await;
                // A failed ping is not fatal; the read side sees the broken socket.
                if let Err(e) = writer.send(WsMessage::Ping(PING_PAYLOAD.to_vec().into())).await {
                    warn!(error = %e, "Keepalive ping failed");
                }
            }
        }
    }
    debug!("Keepalive task ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::pin::Pin;
    use tokio::sync::mpsc;

    type TestSink = Pin<Box<dyn Sink<WsMessage, Error = Infallible> + Send>>;

    fn capture() -> (Arc<Mutex<TestSink>>, mpsc::UnboundedReceiver<WsMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = futures_util::sink::unfold(tx, |tx, msg: WsMessage| async move {
            let _ = tx.send(msg);
            Ok::<_, Infallible>(tx)
        });
        let sink: TestSink = Box::pin(sink);
        (Arc::new(Mutex::new(sink)), rx)
    }

    #[tokio::test]
    async fn pings_carry_one_byte_payload() {
        let (writer, mut rx) = capture();
        let mut keepalive = Keepalive::new();
        keepalive.start(writer, Duration::from_millis(20)).unwrap();

        for _ in 0..2 {
            let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            match msg {
                WsMessage::Ping(payload) => assert_eq!(&payload[..], PING_PAYLOAD),
                other => panic!("expected ping, got {other:?}"),
            }
        }
        keepalive.stop().await;
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let (writer, _rx) = capture();
        let mut keepalive = Keepalive::new();
        keepalive
            .start(Arc::clone(&writer), Duration::from_secs(30))
            .unwrap();

        let err = keepalive
            .start(writer, Duration::from_secs(30))
            .unwrap_err();
        assert!(matches!(err, BindingError::KeepaliveAlreadyRunning));
        assert!(keepalive.is_running());
        keepalive.stop().await;
    }

    #[tokio::test]
    async fn stop_joins_and_silences_pings() {
        let (writer, mut rx) = capture();
        let mut keepalive = Keepalive::new();
        keepalive
            .start(Arc::clone(&writer), Duration::from_millis(10))
            .unwrap();

        // First ping fires immediately.
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        keepalive.stop().await;
        assert!(!keepalive.is_running());

        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        // Restart after stop is allowed.
        keepalive.start(writer, Duration::from_secs(30)).unwrap();
        keepalive.stop().await;
    }

    #[tokio::test]
    async fn stop_when_idle_is_a_no_op() {
        let mut keepalive = Keepalive::new();
        keepalive.stop().await;
        assert!(!keepalive.is_running());
    }
}
