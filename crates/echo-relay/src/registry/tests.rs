use super::*;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Stand-in for a connection task: acks every frame with `Ok` (or with a
/// transport error when `fail` is set) and returns what it wrote once the
/// queue closes or it is told to close.
fn fake_connection(mut rx: mpsc::Receiver<Outbound>, fail: bool) -> JoinHandle<(Vec<String>, bool)> {
    tokio::spawn(async move {
        let mut written = Vec::new();
        while let Some(out) = rx.recv().await {
            match out {
                Outbound::Frame { text, ack } => {
                    if fail {
                        let _ = ack.send(Err(tungstenite::Error::ConnectionClosed));
                    } else {
                        written.push(text);
                        let _ = ack.send(Ok(()));
                    }
                }
                Outbound::Close => return (written, true),
            }
        }
        (written, false)
    })
}

#[tokio::test]
async fn unbound_identity_is_no_session() {
    let registry = Registry::new(8);
    let (_id, _rx) = registry.open_session().await;

    let outcome = registry.send_to_binding("echo-1", &Message::on("lamp")).await;
    assert_eq!(outcome, Delivery::NoSession);
    assert_eq!(registry.session_count().await, 1);
    assert_eq!(registry.binding_count().await, 0);
}

#[tokio::test]
async fn bound_identity_receives_encoded_frame() {
    let registry = Registry::new(8);
    let (id, rx) = registry.open_session().await;
    let conn = fake_connection(rx, false);
    registry.bind("echo-1", &id).await;

    let message = Message::on("lamp");
    assert_eq!(
        registry.send_to_binding("echo-1", &message).await,
        Delivery::Delivered
    );

    registry.close_binding("echo-1").await;
    let (written, closed) = conn.await.unwrap();
    assert_eq!(written, vec![encode(&message)]);
    assert!(closed);
}

#[tokio::test]
async fn last_registration_wins() {
    let registry = Registry::new(8);
    let (first, first_rx) = registry.open_session().await;
    let (second, second_rx) = registry.open_session().await;
    let first_conn = fake_connection(first_rx, false);
    let second_conn = fake_connection(second_rx, false);

    assert_eq!(registry.bind("echo-1", &first).await, None);
    assert_eq!(registry.bind("echo-1", &second).await, Some(first.clone()));
    assert_eq!(registry.session_for("echo-1").await, Some(second.clone()));

    registry.send_to_binding("echo-1", &Message::off("lamp")).await;

    // The displaced session stays open.
    assert_eq!(registry.session_count().await, 2);

    registry.evict(&first).await;
    registry.evict(&second).await;
    let (first_written, _) = first_conn.await.unwrap();
    let (second_written, _) = second_conn.await.unwrap();
    assert!(first_written.is_empty());
    assert_eq!(second_written.len(), 1);
}

#[tokio::test]
async fn write_failure_drops_binding_and_session() {
    let registry = Registry::new(8);
    let (id, rx) = registry.open_session().await;
    let conn = fake_connection(rx, true);
    registry.bind("echo-1", &id).await;

    assert_eq!(
        registry.send_to_binding("echo-1", &Message::on("lamp")).await,
        Delivery::NoSession
    );
    assert!(!registry.is_bound("echo-1").await);
    assert_eq!(registry.session_count().await, 0);

    let (_, closed) = conn.await.unwrap();
    assert!(closed, "failed session was not asked to close");

    assert_eq!(
        registry.send_to_binding("echo-1", &Message::on("lamp")).await,
        Delivery::NoSession
    );
}

#[tokio::test]
async fn ended_connection_task_counts_as_write_failure() {
    let registry = Registry::new(8);
    let (id, rx) = registry.open_session().await;
    drop(rx);
    registry.bind("echo-1", &id).await;

    assert_eq!(
        registry.send_to_binding("echo-1", &Message::on("lamp")).await,
        Delivery::NoSession
    );
    assert_eq!(registry.session_count().await, 0);
    assert!(!registry.is_bound("echo-1").await);
}

#[tokio::test]
async fn closed_session_leaves_binding_until_next_send() {
    let registry = Registry::new(8);
    let (id, _rx) = registry.open_session().await;
    registry.bind("echo-1", &id).await;

    assert!(registry.close_session(&id).await);
    assert!(registry.is_bound("echo-1").await);
    assert_eq!(registry.session_for("echo-1").await, None);

    assert_eq!(
        registry.send_to_binding("echo-1", &Message::on("lamp")).await,
        Delivery::NoSession
    );
    assert!(!registry.is_bound("echo-1").await);
}

#[tokio::test]
async fn stale_cleanup_keeps_newer_binding() {
    let registry = Registry::new(8);
    let (old, _old_rx) = registry.open_session().await;
    let (new, new_rx) = registry.open_session().await;
    let conn = fake_connection(new_rx, false);

    registry.bind("echo-1", &old).await;
    registry.close_session(&old).await;
    registry.bind("echo-1", &new).await;

    assert_eq!(
        registry.send_to_binding("echo-1", &Message::on("lamp")).await,
        Delivery::Delivered
    );
    assert_eq!(registry.session_for("echo-1").await, Some(new.clone()));

    registry.evict(&new).await;
    conn.await.unwrap();
}

#[tokio::test]
async fn eviction_only_touches_that_session() {
    let registry = Registry::new(8);
    let (a, _a_rx) = registry.open_session().await;
    let (b, _b_rx) = registry.open_session().await;
    registry.bind("echo-a", &a).await;
    registry.bind("echo-a2", &a).await;
    registry.bind("echo-b", &b).await;

    registry.evict(&a).await;
    assert_eq!(registry.binding_count().await, 1);
    assert!(registry.is_bound("echo-b").await);
    assert_eq!(registry.session_count().await, 1);
}

#[tokio::test]
async fn evict_with_full_queue_still_forgets_session() {
    let registry = Registry::new(1);
    let (id, rx) = registry.open_session().await;
    registry.bind("echo-1", &id).await;

    // Nobody drains `rx`, so this send fills the queue and waits for an ack.
    let pending = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.send_to_binding("echo-1", &Message::on("lamp")).await })
    };
    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.sessions.read().await[&id].capacity() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    registry.evict(&id).await;
    assert_eq!(registry.session_count().await, 0);
    assert!(!registry.is_bound("echo-1").await);

    drop(rx);
    let outcome = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome, Delivery::NoSession);
}

#[tokio::test]
async fn close_binding_without_session_is_false() {
    let registry = Registry::new(8);
    assert!(!registry.close_binding("nobody").await);
}

#[tokio::test]
async fn concurrent_senders_all_deliver() {
    let registry = Registry::new(4);
    let (id, rx) = registry.open_session().await;
    let conn = fake_connection(rx, false);
    registry.bind("echo-1", &id).await;

    let mut tasks = Vec::new();
    for i in 0..32 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry
                .send_to_binding("echo-1", &Message::on(format!("lamp-{i}")))
                .await
        }));
    }
    for task in tasks {
        let outcome = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, Delivery::Delivered);
    }

    registry.evict(&id).await;
    let (written, _) = conn.await.unwrap();
    assert_eq!(written.len(), 32);
}
