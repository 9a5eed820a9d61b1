//! RPCによるエージェント停止

use crate::support::agent::test_state;
use crate::support::http::free_port;
use std::time::Duration;
use test_agent::cli::{status::StatusArgs, stop::StopArgs};
use test_agent::server;
use test_agent_common::protocol::InitServerRequest;

#[tokio::test]
async fn stop_tears_down_endpoints_and_exits() {
    let state = test_state(Duration::from_secs(5));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let agent_port = listener.local_addr().unwrap().port();
    let agent = tokio::spawn(server::serve(state.clone(), listener));

    let endpoint_port = free_port();
    state
        .http_servers
        .init(InitServerRequest {
            name: "s".to_string(),
            port: endpoint_port,
            ..Default::default()
        })
        .await
        .unwrap();

    let host = "127.0.0.1".to_string();
    test_agent::cli::status::execute(&StatusArgs {
        port: agent_port,
        host: host.clone(),
    })
    .await
    .unwrap();
    test_agent::cli::stop::execute(&StopArgs {
        port: agent_port,
        host,
    })
    .await
    .unwrap();

    tokio::time::timeout(Duration::from_secs(10), agent)
        .await
        .expect("agent did not stop")
        .unwrap()
        .unwrap();

    assert!(state.http_servers.registry().is_empty().await);
    assert!(std::net::TcpListener::bind(("0.0.0.0", endpoint_port)).is_ok());
}
