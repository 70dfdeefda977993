//! End-to-end tests for the Bkknet agent pipeline.
//!
//! Each test boots a full agent on an ephemeral port and talks to it over a
//! real UDP socket, the way a deployed Bkk320 peer would.

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::net::UdpSocket;

use bkknet::config::Config;
use bkknet::protocol::{Frame, CMD_IP_REQUEST, CMD_IP_RESPONSE, MIN_FRAME_SIZE};
use bkknet::server::Agent;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Spin up an agent on an ephemeral port with the given device serial.
fn start_agent(serial: u16) -> (Agent, NamedTempFile) {
    let mut main_cfg = NamedTempFile::new().unwrap();
    write!(main_cfg, r#"{{"SerNumb": {serial}}}"#).unwrap();

    let mut config = Config::default();
    config.agent.port = 0;
    config.agent.main_cfg_file = main_cfg.path().to_path_buf();
    config.agent.tcp_log_sink = false;

    let agent = Agent::start(&config).unwrap();
    (agent, main_cfg)
}

async fn client() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

async fn recv_frame(socket: &UdpSocket) -> (Frame, SocketAddr) {
    let mut buf = [0u8; 4096];
    let (len, from) = tokio::time::timeout(RESPONSE_TIMEOUT, socket.recv_from(&mut buf))
        .await
        .expect("timed out waiting for response")
        .expect("recv failed");
    (Frame::decode(&buf[..len]).expect("invalid response frame"), from)
}

fn agent_addr(agent: &Agent) -> SocketAddr {
    SocketAddr::new("127.0.0.1".parse().unwrap(), agent.local_addr().port())
}

#[tokio::test]
async fn test_ip_request_gets_identity_response() {
    let (agent, _cfg) = start_agent(4660);
    let socket = client().await;

    let request = Frame::new(CMD_IP_REQUEST, 0x0000, 0x00, vec![]);
    let encoded = request.encode();
    assert_eq!(encoded.len(), MIN_FRAME_SIZE);

    socket.send_to(&encoded, agent_addr(&agent)).await.unwrap();

    let (response, from) = recv_frame(&socket).await;
    assert_eq!(from, agent_addr(&agent));
    assert_eq!(response.command, CMD_IP_RESPONSE);
    assert_eq!(response.serial_number, 4660);
    assert_eq!(response.status, 0x00);

    let document: serde_json::Value = serde_json::from_slice(&response.payload).unwrap();
    assert_eq!(document["Type"], "Bkk320");
    assert!(document["IP"].is_string());
    assert!(document["MASK"].is_string());

    agent.shutdown().await;
}

#[tokio::test]
async fn test_unknown_command_gets_no_response() {
    let (agent, _cfg) = start_agent(1);
    let socket = client().await;

    let unknown = Frame::new(0x01, 0, 0, vec![]);
    socket
        .send_to(&unknown.encode(), agent_addr(&agent))
        .await
        .unwrap();

    let mut buf = [0u8; 64];
    let silent = tokio::time::timeout(Duration::from_millis(300), socket.recv_from(&mut buf))
        .await
        .is_err();
    assert!(silent, "unknown command must not produce a response");

    agent.shutdown().await;
}

#[tokio::test]
async fn test_corrupt_datagram_does_not_break_pipeline() {
    let (agent, _cfg) = start_agent(7);
    let socket = client().await;
    let dest = agent_addr(&agent);

    // Valid request, then junk, then a corrupted frame, then a valid request
    // again. Both valid requests must be answered.
    let request = Frame::new(CMD_IP_REQUEST, 0, 0, vec![]).encode();

    socket.send_to(&request, dest).await.unwrap();
    let (first, _) = recv_frame(&socket).await;
    assert_eq!(first.command, CMD_IP_RESPONSE);

    socket.send_to(&[0x00, 0x01, 0x02], dest).await.unwrap();

    let mut corrupt = request.clone();
    corrupt[1] ^= 0xFF;
    socket.send_to(&corrupt, dest).await.unwrap();

    socket.send_to(&request, dest).await.unwrap();
    let (second, _) = recv_frame(&socket).await;
    assert_eq!(second.command, CMD_IP_RESPONSE);
    assert_eq!(second.serial_number, 7);

    agent.shutdown().await;
}

#[tokio::test]
async fn test_responses_follow_request_order_from_one_peer() {
    let (agent, _cfg) = start_agent(9);
    let socket = client().await;
    let dest = agent_addr(&agent);

    let request = Frame::new(CMD_IP_REQUEST, 0, 0, vec![]).encode();
    for _ in 0..5 {
        socket.send_to(&request, dest).await.unwrap();
    }

    // All five answers arrive and each is a well-formed identity response.
    for _ in 0..5 {
        let (response, _) = recv_frame(&socket).await;
        assert_eq!(response.command, CMD_IP_RESPONSE);
        assert_eq!(response.serial_number, 9);
    }

    agent.shutdown().await;
}

#[tokio::test]
async fn test_stopped_agent_goes_silent() {
    let (agent, _cfg) = start_agent(3);
    let socket = client().await;
    let dest = agent_addr(&agent);

    agent.shutdown().await;

    let request = Frame::new(CMD_IP_REQUEST, 0, 0, vec![]).encode();
    let _ = socket.send_to(&request, dest).await;

    let mut buf = [0u8; 64];
    let silent = tokio::time::timeout(Duration::from_millis(300), socket.recv_from(&mut buf))
        .await
        .is_err();
    assert!(silent, "stopped agent must not respond");
}
