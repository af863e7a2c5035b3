//! End-to-end tests: an in-process server driven over real WebSocket and HTTP connections.

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use stmsh_server::{config::ServerConfig, ui::Server};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, Message},
};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper struct to manage the server task lifecycle
struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Start a server on an ephemeral port
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(Server::new(ServerConfig::default()).serve(listener, async {
            let _ = rx.await;
        }));
        TestServer {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn create_room(&self) -> String {
        let body: Value = reqwest::Client::new()
            .post(self.http("/api/rooms"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    async fn try_connect(&self, query: &str) -> Result<Ws, WsError> {
        connect_async(format!("ws://{}/ws?{}", self.addr, query))
            .await
            .map(|(ws, _)| ws)
    }

    async fn connect(&self, client_id: &str) -> Ws {
        self.try_connect(&format!("client_id={}", client_id))
            .await
            .unwrap()
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(EVENT_TIMEOUT, &mut self.handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}

async fn send(ws: &mut Ws, kind: &str, payload: Value) {
    let text = json!({ "type": kind, "payload": payload }).to_string();
    ws.send(Message::text(text)).await.unwrap();
}

async fn join(ws: &mut Ws, name: &str, room_id: &str) {
    send(ws, "join", json!({ "name": name, "roomid": room_id })).await;
}

/// Next text frame as JSON, skipping keepalive frames
async fn next_json(ws: &mut Ws) -> Value {
    loop {
        let msg = tokio::time::timeout(EVENT_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip events until one of the given type arrives
async fn next_of_type(ws: &mut Ws, kind: &str) -> Value {
    loop {
        let event = next_json(ws).await;
        if event["type"] == kind {
            return event;
        }
    }
}

fn movie(id: u64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "overview": "",
        "vote_average": 8.0,
        "release_date": "2001-12-19",
        "poster_path": "",
    })
}

#[tokio::test]
async fn test_http_api() {
    // テスト項目: ヘルスチェック、ルーム作成、一覧、詳細、404
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let health: Value = client
        .get(server.http("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let room_id = server.create_room().await;
    let rooms: Value = client
        .get(server.http("/api/rooms"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let detail = client
        .get(server.http(&format!("/api/rooms/{}", room_id)))
        .send()
        .await
        .unwrap();
    let missing = client
        .get(server.http("/api/rooms/missing"))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(health, json!({"status": "ok"}));
    assert_eq!(rooms[0]["id"], room_id.as_str());
    assert_eq!(rooms[0]["stage"], "lobby");
    assert_eq!(detail.status(), reqwest::StatusCode::OK);
    let detail: Value = detail.json().await.unwrap();
    assert_eq!(detail["connections"], 0);
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn test_alice_and_bob_full_session() {
    // テスト項目: 参加からリスト追加、投票、結果までの一連の流れ
    // given (前提条件):
    let server = TestServer::start().await;
    let room_id = server.create_room().await;
    let mut alice = server.connect("alice").await;
    let mut bob = server.connect("bob").await;

    // when (操作):
    join(&mut alice, "Alice", &room_id).await;
    let alice_init = next_of_type(&mut alice, "room:init").await;
    join(&mut bob, "Bob", &room_id).await;
    let bob_init = next_of_type(&mut bob, "room:init").await;
    let joined = next_of_type(&mut alice, "room:player_joined").await;

    send(&mut alice, "list_add", movie(120, "The Fellowship of the Ring")).await;
    next_of_type(&mut alice, "player:list_changed").await;
    send(&mut bob, "list_add", movie(121, "The Two Towers")).await;
    next_of_type(&mut bob, "player:list_changed").await;

    send(&mut alice, "next_stage", Value::Null).await;
    let voting = next_of_type(&mut bob, "room:stage_voting").await;

    for (ws, votes) in [(&mut alice, [true, false]), (&mut bob, [true, true])] {
        send(ws, "vote", json!({ "id": "120", "vote": votes[0] })).await;
        next_of_type(ws, "room:vote_registered").await;
        send(ws, "vote", json!({ "id": "121", "vote": votes[1] })).await;
        let last = next_of_type(ws, "room:vote_registered").await;
        assert_eq!(last["candidates"], json!([]));
    }

    send(&mut alice, "next_stage", Value::Null).await;
    let results = next_of_type(&mut bob, "room:stage_results").await;

    // then (期待する結果):
    assert_eq!(alice_init["user"]["isHost"], true);
    assert_eq!(alice_init["stage"], "lobby");
    assert_eq!(bob_init["user"]["isHost"], false);
    assert_eq!(bob_init["players"].as_array().unwrap().len(), 2);
    assert_eq!(joined["id"], "bob");
    assert_eq!(voting["candidates"].as_array().unwrap().len(), 2);
    assert_eq!(results["winners"][0]["id"], "120");
    assert_eq!(results["winners"][0]["score"], 2);
    assert_eq!(results["others"][0]["id"], "121");
    assert_eq!(results["others"][0]["score"], 0);

    server.stop().await;
}

#[tokio::test]
async fn test_duplicate_client_id_is_rejected() {
    // テスト項目: 同じ client_id の 2 本目の接続は 409 で拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let _alice = server.connect("alice").await;

    // when (操作):
    let result = server.try_connect("client_id=alice").await;

    // then (期待する結果):
    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 409),
        other => panic!("expected HTTP 409, got {:?}", other.map(|_| ())),
    }

    server.stop().await;
}

#[tokio::test]
async fn test_errors_are_reported_to_sender() {
    // テスト項目: 壊れた JSON と未参加での操作は送信者にだけエラーとして返る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("alice").await;

    // when (操作):
    alice.send(Message::text("not json")).await.unwrap();
    let malformed = next_json(&mut alice).await;
    send(&mut alice, "ready", json!({ "ready": true })).await;
    let not_joined = next_json(&mut alice).await;
    send(&mut alice, "join", json!({ "name": "Alice", "roomid": "nowhere" })).await;
    let missing_room = next_json(&mut alice).await;

    // then (期待する結果):
    assert_eq!(malformed["type"], "error");
    assert!(
        malformed["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to decode message")
    );
    assert_eq!(not_joined, json!({ "type": "error", "message": "Join room first" }));
    assert_eq!(missing_room["type"], "error");

    server.stop().await;
}

#[tokio::test]
async fn test_host_disconnect_hands_over_host() {
    // テスト項目: ホストが切断すると残りのプレイヤーがホストになる
    // given (前提条件):
    let server = TestServer::start().await;
    let room_id = server.create_room().await;
    let mut alice = server.connect("alice").await;
    let mut bob = server.connect("bob").await;
    join(&mut alice, "Alice", &room_id).await;
    next_of_type(&mut alice, "room:init").await;
    join(&mut bob, "Bob", &room_id).await;
    next_of_type(&mut bob, "room:init").await;

    // when (操作):
    alice.close(None).await.unwrap();
    let host_changed = next_of_type(&mut bob, "room:host_changed").await;
    let updated = next_of_type(&mut bob, "player:update").await;
    let players = next_of_type(&mut bob, "room:players_changed").await;

    // then (期待する結果):
    assert_eq!(host_changed["id"], "bob");
    assert_eq!(updated["isHost"], true);
    assert_eq!(players["total"], 1);

    server.stop().await;
}

#[tokio::test]
async fn test_fragment_format() {
    // テスト項目: format=fragments の接続にはフラグメント単位のフレームが届く
    // given (前提条件):
    let server = TestServer::start().await;
    let room_id = server.create_room().await;
    let mut alice = server
        .try_connect("client_id=alice&format=fragments")
        .await
        .unwrap();

    // when (操作):
    join(&mut alice, "Alice", &room_id).await;
    let mut names = Vec::new();
    for _ in 0..5 {
        let frame = next_json(&mut alice).await;
        names.push(frame["fragment"].as_str().unwrap().to_string());
    }

    // then (期待する結果):
    assert_eq!(names, vec!["time", "user", "actions", "stage_lobby", "players"]);

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_closes_sockets() {
    // テスト項目: サーバー停止時に接続中のクライアントへ Close が送られる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("alice").await;

    // when (操作):
    server.stop().await;

    // then (期待する結果):
    let closed = tokio::time::timeout(EVENT_TIMEOUT, async {
        loop {
            match alice.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());
}
