//! Gateway Integration Tests
//!
//! Each test spawns its own gateway on an ephemeral port; no external
//! services are needed.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use estate_core::{InboundEvent, OutboundEvent, RegistrationPolicy};
use integration_tests::{
    announce, handshake_status, message_payload, send_message, test_config, typing_payload,
    unique_user, TestGateway,
};
use reqwest::StatusCode;

// ============================================================================
// HTTP Endpoints
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let gateway = TestGateway::start().await.unwrap();

    let response = gateway.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_presence_endpoint_reflects_registry() {
    let gateway = TestGateway::start().await.unwrap();
    assert!(gateway.presence().await.unwrap().is_empty());

    let user = unique_user("buyer");
    let (_client, snapshot) = gateway.join(&user).await.unwrap();

    let presence = gateway.presence().await.unwrap();
    assert_eq!(presence, snapshot);
    assert_eq!(presence.len(), 1);
    assert_eq!(presence[0].user_id.as_str(), user);
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_upgrade_without_token_is_unauthorized() {
    let gateway = TestGateway::start().await.unwrap();

    let err = gateway.connect_with_header(None).await.err().unwrap();
    assert_eq!(handshake_status(&err), Some(401));
}

#[tokio::test]
async fn test_upgrade_with_invalid_token_is_unauthorized() {
    let gateway = TestGateway::start().await.unwrap();

    let err = gateway
        .connect_with_header(Some("Bearer not.a.jwt"))
        .await
        .err()
        .unwrap();
    assert_eq!(handshake_status(&err), Some(401));
}

#[tokio::test]
async fn test_token_in_query_parameter() {
    let gateway = TestGateway::start().await.unwrap();
    let user = unique_user("agent");

    let token = gateway.token_for(&user).unwrap();
    let mut client = gateway.connect_with_query(&token).await.unwrap();

    client.send(&announce(&user)).await.unwrap();
    let snapshot = client.recv_snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].user_id.as_str(), user);
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn test_announce_broadcasts_snapshot_to_everyone() {
    let gateway = TestGateway::start().await.unwrap();

    let (mut seller, first) = gateway.join("seller").await.unwrap();
    assert_eq!(first.len(), 1);

    let (_buyer, snapshot) = gateway.join("buyer").await.unwrap();
    assert_eq!(
        snapshot.iter().map(|e| e.user_id.as_str()).collect::<Vec<_>>(),
        vec!["seller", "buyer"]
    );

    // The already-connected user sees the same snapshot
    assert_eq!(seller.recv_snapshot().await.unwrap(), snapshot);
}

#[tokio::test]
async fn test_disconnect_broadcasts_snapshot_without_user() {
    let gateway = TestGateway::start().await.unwrap();

    let (mut seller, _) = gateway.join("seller").await.unwrap();
    let (buyer, _) = gateway.join("buyer").await.unwrap();
    seller.recv_snapshot().await.unwrap();

    buyer.close().await.unwrap();

    let snapshot = seller.recv_snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].user_id.as_str(), "seller");
    assert!(gateway
        .presence()
        .await
        .unwrap()
        .iter()
        .all(|e| e.user_id.as_str() != "buyer"));
}

#[tokio::test]
async fn test_disconnect_event_closes_socket() {
    let gateway = TestGateway::start().await.unwrap();

    let (mut seller, _) = gateway.join("seller").await.unwrap();
    let (mut buyer, _) = gateway.join("buyer").await.unwrap();
    seller.recv_snapshot().await.unwrap();

    buyer.send(&InboundEvent::Disconnect).await.unwrap();
    buyer.expect_closed().await.unwrap();

    let snapshot = seller.recv_snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].user_id.as_str(), "seller");
}

#[tokio::test]
async fn test_duplicate_announce_upsert_keeps_latest_connection() {
    let config = test_config(RegistrationPolicy::Upsert, true).unwrap();
    let gateway = TestGateway::start_with_config(config).await.unwrap();

    let (mut first, before) = gateway.join("dup").await.unwrap();
    let (_second, after) = gateway.join("dup").await.unwrap();

    assert_eq!(after.len(), 1);
    assert_ne!(after[0].connection_id, before[0].connection_id);
    assert_eq!(first.recv_snapshot().await.unwrap(), after);
}

#[tokio::test]
async fn test_duplicate_announce_upsert_routes_messages_to_latest_connection() {
    let config = test_config(RegistrationPolicy::Upsert, true).unwrap();
    let gateway = TestGateway::start_with_config(config).await.unwrap();

    let (mut first, _) = gateway.join("dup").await.unwrap();
    let (mut second, _) = gateway.join("dup").await.unwrap();
    first.recv_snapshot().await.unwrap();

    let (mut sender, _) = gateway.join("sender").await.unwrap();
    first.recv_snapshot().await.unwrap();
    second.recv_snapshot().await.unwrap();

    sender
        .send(&send_message("sender", &["sender", "dup"], "new photos uploaded"))
        .await
        .unwrap();

    assert!(matches!(
        second.recv().await.unwrap(),
        OutboundEvent::MessageDelivered(msg) if msg.content == "new photos uploaded"
    ));
    first.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_announce_keep_first_keeps_original_connection() {
    let config = test_config(RegistrationPolicy::KeepFirst, true).unwrap();
    let gateway = TestGateway::start_with_config(config).await.unwrap();

    let (mut first, before) = gateway.join("dup").await.unwrap();
    let (mut second, after) = gateway.join("dup").await.unwrap();

    assert_eq!(after, before);
    first.recv_snapshot().await.unwrap();

    // Messages for the user still go to the first connection
    let (mut sender, _) = gateway.join("sender").await.unwrap();
    first.recv_snapshot().await.unwrap();
    second.recv_snapshot().await.unwrap();

    sender
        .send(&send_message("sender", &["sender", "dup"], "still there?"))
        .await
        .unwrap();

    assert!(matches!(
        first.recv().await.unwrap(),
        OutboundEvent::MessageDelivered(_)
    ));
    second.expect_silence().await.unwrap();
}

// ============================================================================
// Relay
// ============================================================================

#[tokio::test]
async fn test_message_reaches_online_participants_only() {
    let gateway = TestGateway::start().await.unwrap();

    let (mut seller, _) = gateway.join("seller").await.unwrap();
    let (mut buyer, _) = gateway.join("buyer").await.unwrap();
    seller.recv_snapshot().await.unwrap();

    seller
        .send(&send_message(
            "seller",
            &["seller", "buyer", "offline-agent"],
            "Viewing at 5pm?",
        ))
        .await
        .unwrap();

    let expected = message_payload(
        "seller",
        &["seller", "buyer", "offline-agent"],
        "Viewing at 5pm?",
    );
    assert_eq!(
        buyer.recv().await.unwrap(),
        OutboundEvent::MessageDelivered(expected)
    );
    seller.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_relay_before_announce_is_allowed() {
    let gateway = TestGateway::start().await.unwrap();

    let (mut buyer, _) = gateway.join("buyer").await.unwrap();
    let mut seller = gateway.connect("seller").await.unwrap();

    seller
        .send(&send_message("seller", &["seller", "buyer"], "open house on sunday"))
        .await
        .unwrap();

    assert_eq!(
        buyer.recv().await.unwrap(),
        OutboundEvent::MessageDelivered(message_payload(
            "seller",
            &["seller", "buyer"],
            "open house on sunday"
        ))
    );
    seller.expect_silence().await.unwrap();
    assert_eq!(gateway.presence().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_message_with_nobody_online_is_silent() {
    let gateway = TestGateway::start().await.unwrap();
    let (mut seller, _) = gateway.join("seller").await.unwrap();

    seller
        .send(&send_message("seller", &["seller", "buyer"], "anyone?"))
        .await
        .unwrap();

    seller.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_typing_reaches_every_other_connection() {
    let gateway = TestGateway::start().await.unwrap();

    let (mut seller, _) = gateway.join("seller").await.unwrap();
    let (mut buyer, _) = gateway.join("buyer").await.unwrap();
    let (mut bystander, _) = gateway.join("bystander").await.unwrap();
    seller.recv_snapshot().await.unwrap();
    seller.recv_snapshot().await.unwrap();
    buyer.recv_snapshot().await.unwrap();

    seller
        .send(&InboundEvent::Typing(typing_payload("seller")))
        .await
        .unwrap();

    let expected = OutboundEvent::UserTyping(typing_payload("seller"));
    assert_eq!(buyer.recv().await.unwrap(), expected);
    assert_eq!(bystander.recv().await.unwrap(), expected);
    seller.expect_silence().await.unwrap();

    seller
        .send(&InboundEvent::StopTyping(typing_payload("seller")))
        .await
        .unwrap();

    let expected = OutboundEvent::UserStopTyping(typing_payload("seller"));
    assert_eq!(buyer.recv().await.unwrap(), expected);
    assert_eq!(bystander.recv().await.unwrap(), expected);
}

// ============================================================================
// Rejected Events
// ============================================================================

#[tokio::test]
async fn test_malformed_frame_returns_error_and_keeps_connection() {
    let gateway = TestGateway::start().await.unwrap();
    let (mut seller, _) = gateway.join("seller").await.unwrap();

    seller.send_raw("not json").await.unwrap();
    match seller.recv().await.unwrap() {
        OutboundEvent::Error(payload) => assert_eq!(payload.code, "MALFORMED_EVENT"),
        other => panic!("expected error event, got {other:?}"),
    }

    // Still usable
    seller.send(&announce("seller")).await.unwrap();
    assert_eq!(seller.recv_snapshot().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_payload_is_not_relayed() {
    let gateway = TestGateway::start().await.unwrap();
    let (mut seller, _) = gateway.join("seller").await.unwrap();
    let (mut buyer, _) = gateway.join("buyer").await.unwrap();
    seller.recv_snapshot().await.unwrap();

    seller
        .send_raw(r#"{"event":"sendMessage","data":{"conversationId":"c1","senderId":"seller","content":"hi","participants":[]}}"#)
        .await
        .unwrap();

    match seller.recv().await.unwrap() {
        OutboundEvent::Error(payload) => assert_eq!(payload.code, "INVALID_PAYLOAD"),
        other => panic!("expected error event, got {other:?}"),
    }
    buyer.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_binary_frame_is_rejected() {
    let gateway = TestGateway::start().await.unwrap();
    let (mut seller, _) = gateway.join("seller").await.unwrap();

    seller.send_binary(vec![1, 2, 3]).await.unwrap();
    match seller.recv().await.unwrap() {
        OutboundEvent::Error(payload) => assert_eq!(payload.code, "UNSUPPORTED_FRAME"),
        other => panic!("expected error event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_spoofed_identity_is_rejected() {
    let gateway = TestGateway::start().await.unwrap();
    let (mut seller, _) = gateway.join("seller").await.unwrap();
    let (mut buyer, _) = gateway.join("buyer").await.unwrap();
    seller.recv_snapshot().await.unwrap();

    // Seller's token, buyer's name
    seller
        .send(&send_message("buyer", &["buyer", "seller"], "forged"))
        .await
        .unwrap();

    match seller.recv().await.unwrap() {
        OutboundEvent::Error(payload) => assert_eq!(payload.code, "IDENTITY_MISMATCH"),
        other => panic!("expected error event, got {other:?}"),
    }
    buyer.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_lenient_identity_allows_any_announced_id() {
    let config = test_config(RegistrationPolicy::Upsert, false).unwrap();
    let gateway = TestGateway::start_with_config(config).await.unwrap();

    let mut client = gateway.connect("token-user").await.unwrap();
    client.send(&announce("display-name")).await.unwrap();

    let snapshot = client.recv_snapshot().await.unwrap();
    assert_eq!(snapshot[0].user_id.as_str(), "display-name");
}
