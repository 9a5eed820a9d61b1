//! WebSocketによるログ配信

use crate::support::agent::test_state;
use crate::support::http::spawn_agent;
use futures::StreamExt;
use std::time::Duration;
use test_agent::api;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[tokio::test]
async fn every_listener_receives_the_same_lines() {
    let state = test_state(Duration::from_secs(1));
    let server = spawn_agent(api::create_router(state.clone())).await;

    let (mut alice, _) = connect_async(format!("ws://{}/api/agent/logs/alice", server.addr()))
        .await
        .unwrap();
    let (mut bob, _) = connect_async(format!("ws://{}/api/agent/logs/bob", server.addr()))
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while state.log_broadcast.subscriber_count() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("listeners did not subscribe");

    state.log_broadcast.publish("first line");
    state.log_broadcast.publish("second line");

    for socket in [&mut alice, &mut bob] {
        for expected in ["first line", "second line"] {
            let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            assert_eq!(message, Message::Text(expected.to_string()));
        }
    }

    drop(alice);
    drop(bob);
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.log_broadcast.subscriber_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("listeners were not unsubscribed");

    server.stop().await;
}
