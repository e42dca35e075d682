//! Integration tests for the exchange coordinator over a scripted transport.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::timeout;

use prooflink_core::{
    run_exchange, Channel, Error, Exchange, ExchangeConfig, ExchangeState, Outcome, Proof,
    Shutdown,
};
use prooflink_test_utils::{MockTransport, ReplyBehavior, SendBehavior};

fn config() -> ExchangeConfig {
    ExchangeConfig::default()
}

fn sent_json(payload: &Bytes) -> serde_json::Value {
    serde_json::from_slice(payload).expect("payload is JSON")
}

// =============================================================================
// Replies
// =============================================================================

#[tokio::test]
async fn supplied_data_is_sent_and_reply_returned() {
    let transport = MockTransport::replying("ok");
    let handle = transport.handle();
    let channel = Channel::with_transport("mock://", transport);

    let proof = Proof::from_input("abc123");
    let outcome = run_exchange(&channel, &Shutdown::new(), config(), &proof).await;

    match outcome {
        Outcome::Replied(bytes) => assert_eq!(&bytes[..], b"ok"),
        other => panic!("expected reply, got {:?}", other),
    }

    let sent = handle.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(&sent[0][..], br#"{"type":"proofblock","data":"abc123"}"#);
    assert_eq!(handle.recv_count(), 1);
}

#[tokio::test]
async fn placeholder_proof_carries_timestamp() {
    let transport = MockTransport::replying("ok");
    let handle = transport.handle();
    let channel = Channel::with_transport("mock://", transport);

    let proof = Proof::from_input("");
    let outcome = run_exchange(&channel, &Shutdown::new(), config(), &proof).await;
    assert!(matches!(outcome, Outcome::Replied(_)));

    let json = sent_json(&handle.sent()[0]);
    assert_eq!(json["type"], "proofblock");
    assert_eq!(json["data"], "0x0000000000000000000");
    let ts = json["timestamp"].as_str().expect("timestamp present");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
}

#[tokio::test]
async fn reply_bytes_are_passed_through_unmodified() {
    let raw = Bytes::from_static(&[0x00, 0xff, b'o', b'k', 0x80, b'\n']);
    let channel = Channel::with_transport("mock://", MockTransport::replying(raw.clone()));

    let outcome = run_exchange(&channel, &Shutdown::new(), config(), &Proof::with_data("x")).await;
    match outcome {
        Outcome::Replied(bytes) => assert_eq!(bytes, raw),
        other => panic!("expected reply, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn send_accepted_within_window() {
    let transport =
        MockTransport::replying("ok").with_send(SendBehavior::Delay(Duration::from_secs(4)));
    let channel = Channel::with_transport("mock://", transport);

    let outcome = run_exchange(&channel, &Shutdown::new(), config(), &Proof::with_data("x")).await;
    assert!(matches!(outcome, Outcome::Replied(_)));
}

#[tokio::test(start_paused = true)]
async fn unbounded_reply_wait_outlasts_send_window() {
    let transport = MockTransport::replying("ok").with_reply(ReplyBehavior::Delayed(
        Duration::from_secs(600),
        Bytes::from_static(b"late"),
    ));
    let channel = Channel::with_transport("mock://", transport);

    let outcome = run_exchange(&channel, &Shutdown::new(), config(), &Proof::with_data("x")).await;
    match outcome {
        Outcome::Replied(bytes) => assert_eq!(&bytes[..], b"late"),
        other => panic!("expected reply, got {:?}", other),
    }
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test(start_paused = true)]
async fn slow_send_times_out_without_receive() {
    let transport =
        MockTransport::replying("ok").with_send(SendBehavior::Delay(Duration::from_secs(6)));
    let handle = transport.handle();
    let channel = Channel::with_transport("mock://", transport);

    let outcome = run_exchange(&channel, &Shutdown::new(), config(), &Proof::with_data("x")).await;

    assert!(matches!(outcome, Outcome::SendTimedOut));
    assert_eq!(handle.recv_count(), 0);
    assert!(handle.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn hanging_send_times_out_after_window() {
    let transport = MockTransport::replying("ok").with_send(SendBehavior::Hang);
    let handle = transport.handle();
    let channel = Channel::with_transport("mock://", transport);

    let started = tokio::time::Instant::now();
    let outcome = run_exchange(&channel, &Shutdown::new(), config(), &Proof::with_data("x")).await;

    assert!(matches!(outcome, Outcome::SendTimedOut));
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(6));
    assert_eq!(handle.recv_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn reply_timeout_when_configured() {
    let transport = MockTransport::replying("ok").with_reply(ReplyBehavior::Silent);
    let channel = Channel::with_transport("mock://", transport);
    let config = ExchangeConfig {
        reply_timeout: Some(Duration::from_secs(10)),
        ..ExchangeConfig::default()
    };

    let outcome = run_exchange(&channel, &Shutdown::new(), config, &Proof::with_data("x")).await;
    assert!(matches!(outcome, Outcome::ReplyTimedOut));
    assert_eq!(outcome.exit_code(), 0);
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn shutdown_before_start() {
    let transport = MockTransport::replying("ok");
    let handle = transport.handle();
    let channel = Channel::with_transport("mock://", transport);
    let shutdown = Shutdown::new();
    shutdown.trigger();

    let outcome = run_exchange(&channel, &shutdown, config(), &Proof::with_data("x")).await;
    assert!(matches!(outcome, Outcome::ShutdownRequested));
    assert_eq!(handle.send_count(), 0);
}

#[tokio::test]
async fn shutdown_interrupts_reply_wait() {
    let transport = MockTransport::replying("ok").with_reply(ReplyBehavior::Silent);
    let channel = Channel::with_transport("mock://", transport);
    let shutdown = Shutdown::new();

    let task = {
        let channel = channel.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut exchange = Exchange::new(channel, shutdown, ExchangeConfig::default());
            let outcome = exchange.run(&Proof::with_data("x")).await;
            (outcome, exchange.state())
        })
    };

    // Wait until the request is out
    while !channel.is_awaiting_reply() {
        tokio::task::yield_now().await;
    }
    shutdown.trigger();

    let (outcome, state) = timeout(Duration::from_secs(1), task)
        .await
        .expect("exchange should stop on shutdown")
        .unwrap();
    assert!(matches!(outcome, Outcome::ShutdownRequested));
    assert_eq!(state, ExchangeState::ShutdownRequested);
}

#[tokio::test]
async fn channel_close_interrupts_reply_wait() {
    let transport = MockTransport::replying("ok").with_reply(ReplyBehavior::Silent);
    let handle = transport.handle();
    let channel = Channel::with_transport("mock://", transport);

    let task = {
        let channel = channel.clone();
        tokio::spawn(async move {
            run_exchange(&channel, &Shutdown::new(), ExchangeConfig::default(), &Proof::with_data("x"))
                .await
        })
    };

    while !channel.is_awaiting_reply() {
        tokio::task::yield_now().await;
    }
    channel.close().await;

    let outcome = timeout(Duration::from_secs(1), task)
        .await
        .expect("exchange should observe the closed channel")
        .unwrap();
    assert!(matches!(outcome, Outcome::ShutdownRequested));
    assert_eq!(handle.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_send() {
    let transport = MockTransport::replying("ok").with_send(SendBehavior::Hang);
    let channel = Channel::with_transport("mock://", transport);
    let shutdown = Shutdown::new();

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.trigger();
    });

    let outcome = run_exchange(&channel, &shutdown, config(), &Proof::with_data("x")).await;
    assert!(matches!(outcome, Outcome::ShutdownRequested));
}

#[tokio::test]
async fn close_twice_after_exchange() {
    let transport = MockTransport::replying("ok");
    let handle = transport.handle();
    let channel = Channel::with_transport("mock://", transport);

    let outcome = run_exchange(&channel, &Shutdown::new(), config(), &Proof::with_data("x")).await;
    assert!(matches!(outcome, Outcome::Replied(_)));

    // Normal completion and the interrupt path racing to release
    let other = channel.clone();
    tokio::join!(channel.close(), other.close());
    channel.close().await;

    assert!(channel.is_closed());
    assert_eq!(handle.close_count(), 1);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn transport_failure_is_fatal() {
    let transport =
        MockTransport::replying("ok").with_send(SendBehavior::Fail("connection reset".into()));
    let channel = Channel::with_transport("mock://", transport);

    let outcome = run_exchange(&channel, &Shutdown::new(), config(), &Proof::with_data("x")).await;
    assert!(matches!(outcome, Outcome::Fatal(Error::Transport { .. })));
    assert_eq!(outcome.exit_code(), 1);
}

#[tokio::test]
async fn reply_failure_is_fatal() {
    let transport =
        MockTransport::replying("ok").with_reply(ReplyBehavior::Fail("peer gone".into()));
    let channel = Channel::with_transport("mock://", transport);

    let outcome = run_exchange(&channel, &Shutdown::new(), config(), &Proof::with_data("x")).await;
    assert!(matches!(outcome, Outcome::Fatal(Error::Transport { .. })));
}

#[tokio::test]
async fn exchange_runs_once() {
    let channel = Channel::with_transport("mock://", MockTransport::replying("ok"));
    let mut exchange = Exchange::new(channel, Shutdown::new(), config());

    assert_eq!(exchange.state(), ExchangeState::Idle);
    assert!(matches!(
        exchange.run(&Proof::with_data("x")).await,
        Outcome::Replied(_)
    ));
    assert_eq!(exchange.state(), ExchangeState::Replied);

    let again = exchange.run(&Proof::with_data("y")).await;
    assert!(matches!(again, Outcome::Fatal(Error::Protocol { .. })));
    assert_eq!(exchange.state(), ExchangeState::Replied);
}
