//! End-to-end integration tests for [`GameServer`] and [`Master`]: real
//! WebSocket connections exercising `CreateRoom`, join/broadcast, and the
//! Register/Update master streams together.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use quark::prelude::*;
use quark_protocol::{
    ClientFrame, Command, CreateRoomRequest, CreateRoomResponse, Event, RegisterEvent,
    RegisterRequest, RoomStatus, UpdateRequest,
};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Connects a plain WebSocket client to `addr`.
async fn connect(addr: std::net::SocketAddr) -> ClientWs {
    let url = format!("ws://{addr}");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("client should connect");
    ws
}

/// Connects with an extra `quark-gameserver-id` handshake header.
async fn connect_with_gameserver_id(addr: std::net::SocketAddr, gameserver_id: &str) -> ClientWs {
    let mut request = format!("ws://{addr}")
        .into_client_request()
        .expect("should build request");
    request.headers_mut().insert(
        "quark-gameserver-id",
        gameserver_id.parse().expect("valid header value"),
    );
    let (ws, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("client should connect");
    ws
}

async fn send_json<T: serde::Serialize>(ws: &mut ClientWs, value: &T) {
    let bytes = serde_json::to_vec(value).unwrap();
    ws.send(Message::Binary(bytes.into())).await.unwrap();
}

async fn recv_json<T: serde::de::DeserializeOwned>(ws: &mut ClientWs) -> T {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("should receive before timeout")
        .expect("stream should not end")
        .expect("should not error");
    serde_json::from_slice(&msg.into_data()).expect("should decode")
}

async fn start_game_server() -> (GameServer, std::net::SocketAddr) {
    let server = GameServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("should build");
    let addr = server.local_addr().expect("should have local addr");
    (server, addr)
}

#[tokio::test]
async fn create_room_is_idempotent_by_name() {
    let (server, addr) = start_game_server().await;
    tokio::spawn(server.run());

    let mut ws = connect(addr).await;
    send_json(
        &mut ws,
        &ClientFrame::CreateRoom(CreateRoomRequest {
            room_name: "lobby".into(),
        }),
    )
    .await;
    let first: CreateRoomResponse = recv_json(&mut ws).await;
    assert!(!first.already_exist);

    let mut ws2 = connect(addr).await;
    send_json(
        &mut ws2,
        &ClientFrame::CreateRoom(CreateRoomRequest {
            room_name: "lobby".into(),
        }),
    )
    .await;
    let second: CreateRoomResponse = recv_json(&mut ws2).await;
    assert!(second.already_exist);
    assert_eq!(first.room_id, second.room_id);
}

#[tokio::test]
async fn create_room_with_empty_name_mints_a_fresh_room() {
    let (server, addr) = start_game_server().await;
    tokio::spawn(server.run());

    let mut a = connect(addr).await;
    send_json(
        &mut a,
        &ClientFrame::CreateRoom(CreateRoomRequest {
            room_name: String::new(),
        }),
    )
    .await;
    let resp_a: CreateRoomResponse = recv_json(&mut a).await;
    assert!(!resp_a.already_exist);

    let mut b = connect(addr).await;
    send_json(
        &mut b,
        &ClientFrame::CreateRoom(CreateRoomRequest {
            room_name: String::new(),
        }),
    )
    .await;
    let resp_b: CreateRoomResponse = recv_json(&mut b).await;
    assert!(!resp_b.already_exist);
    assert_ne!(resp_a.room_id, resp_b.room_id);
}

#[tokio::test]
async fn two_clients_join_and_broadcast_with_echo_suppression() {
    let (server, addr) = start_game_server().await;
    let room_set = server.room_set();
    tokio::spawn(server.run());

    let (room_id, _) = room_set.create_or_get("arena");

    let mut alice = connect(addr).await;
    send_json(&mut alice, &ClientFrame::Command(Command::JoinRoom { room_id })).await;
    let ack: Event = recv_json(&mut alice).await;
    assert!(matches!(ack, Event::JoinRoomSucceed { .. }));

    let mut bob = connect(addr).await;
    send_json(&mut bob, &ClientFrame::Command(Command::JoinRoom { room_id })).await;
    let ack: Event = recv_json(&mut bob).await;
    assert!(matches!(ack, Event::JoinRoomSucceed { .. }));

    send_json(
        &mut alice,
        &ClientFrame::Command(Command::SendMessage {
            code: 7,
            payload: b"hi".to_vec(),
        }),
    )
    .await;

    let received: Event = recv_json(&mut bob).await;
    match received {
        Event::MessageReceived { code, payload, .. } => {
            assert_eq!(code, 7);
            assert_eq!(payload, b"hi");
        }
        other => panic!("expected MessageReceived, got {other:?}"),
    }

    // Alice sent the message, so she must not see her own broadcast — the
    // next thing on her socket should be nothing within the window.
    let result = tokio::time::timeout(Duration::from_millis(200), alice.next()).await;
    assert!(result.is_err(), "sender should not receive its own broadcast");
}

#[tokio::test]
async fn joining_an_unknown_room_reports_room_does_not_exist() {
    let (server, addr) = start_game_server().await;
    tokio::spawn(server.run());

    let mut ws = connect(addr).await;
    send_json(
        &mut ws,
        &ClientFrame::Command(Command::JoinRoom {
            room_id: quark_protocol::RoomId(9999),
        }),
    )
    .await;
    let event: Event = recv_json(&mut ws).await;
    match event {
        Event::CommandOperationError { error_code, .. } => {
            assert_eq!(error_code, quark_protocol::ERROR_ROOM_DOES_NOT_EXIST);
        }
        other => panic!("expected CommandOperationError, got {other:?}"),
    }
}

#[tokio::test]
async fn register_then_receives_allocation_for_its_own_rooms() {
    let master = MasterBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("should build");
    let addr = master.local_addr().expect("should have local addr");
    let fleet = master.fleet();
    tokio::spawn(master.run());

    let mut ws = connect(addr).await;
    send_json(
        &mut ws,
        &RegisterRequest {
            host: "10.0.0.5".into(),
            port: "9001".into(),
        },
    )
    .await;

    let registered: RegisterEvent = recv_json(&mut ws).await;
    let game_server_id = match registered {
        RegisterEvent::Registered { game_server_id } => game_server_id,
        other => panic!("expected Registered, got {other:?}"),
    };
    assert!(fleet.is_registered(&game_server_id).await);

    fleet
        .allocate(quark_protocol::RoomId(1), "room-a".into())
        .await
        .expect("allocation should succeed");

    let allocation: RegisterEvent = recv_json(&mut ws).await;
    match allocation {
        RegisterEvent::Allocation { room_id, room_name } => {
            assert_eq!(room_id, quark_protocol::RoomId(1));
            assert_eq!(room_name, "room-a");
        }
        other => panic!("expected Allocation, got {other:?}"),
    }
}

#[tokio::test]
async fn update_stream_applies_room_status_for_registered_server() {
    let master = MasterBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("should build");
    let addr = master.local_addr().expect("should have local addr");
    let fleet = master.fleet();
    tokio::spawn(master.run());

    let game_server_id = fleet
        .register(
            quark_protocol::GameServerAddr {
                host: "10.0.0.6".into(),
                port: "9002".into(),
            },
            5,
        )
        .await;
    fleet
        .allocate(quark_protocol::RoomId(3), "room-c".into())
        .await
        .expect("allocation should succeed");

    let mut ws = connect_with_gameserver_id(addr, &game_server_id.0).await;
    send_json(
        &mut ws,
        &UpdateRequest {
            updates: vec![RoomStatus {
                room_id: quark_protocol::RoomId(3),
                room_name: "room-c".into(),
                actor_count: 6,
            }],
        },
    )
    .await;

    // Give the server a moment to process the frame before inspecting
    // fleet state directly — there is no ack frame on an Update stream.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let statuses = fleet.room_statuses().await;
    let status = statuses
        .iter()
        .find(|s| s.room_id == quark_protocol::RoomId(3))
        .expect("status should exist");
    assert_eq!(status.actor_count, 6);
}

#[tokio::test]
async fn update_stream_for_unregistered_identity_closes_the_connection() {
    let master = MasterBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("should build");
    let addr = master.local_addr().expect("should have local addr");
    tokio::spawn(master.run());

    // A `quark-gameserver-id` the Fleet has never seen routes to
    // `run_update`, which rejects it with `PermissionDenied` and the
    // connection task exits without sending anything back.
    let mut ws = connect_with_gameserver_id(addr, "never-registered").await;
    let result = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    match result {
        Ok(None) | Err(_) => {}
        Ok(Some(Ok(msg))) => panic!("expected no frames, got {msg:?}"),
        Ok(Some(Err(_))) => {}
    }
}
