use axum::{
    debug_handler,
    extract::{ws::{Message, WebSocket}, Path, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::{
    config::Settings,
    dispatch::Dispatcher,
    event::{self, ServerEvent},
    users::UserRegistry,
    AppError,
    AppResult,
};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_ws(
    Path(username): Path<String>,
    State(dispatcher): State<Dispatcher>,
    State(users): State<UserRegistry>,
    State(settings): State<Settings>,

    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    if event::is_reserved(&username) {
        return Err(AppError::Invalid(format!("username {username} is reserved")));
    }
    if settings.require_registration && !users.contains(&username).await {
        return Err(AppError::NotFound(format!("user {username}")));
    }

    let capacity = settings.outbound_capacity;
    Ok(ws
        .on_upgrade(move |socket| session(socket, username, dispatcher, capacity))
        .into_response())
}

async fn session(socket: WebSocket, username: String, dispatcher: Dispatcher, capacity: usize) {
    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut rx) = mpsc::channel::<ServerEvent>(capacity);
    let id = dispatcher.connect(&username, outbox).await;

    // Ends once the registry drops our outbox (disconnect or replacement) or the socket dies.
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(error = %err, "failed to encode event");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut reader = tokio::spawn({
        let dispatcher = dispatcher.clone();
        let username = username.clone();
        async move {
            while let Some(msg) = receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => dispatcher.handle_text(&username, text.as_str()).await,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        tracing::debug!(username = %username, error = %err, "websocket error");
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    };

    dispatcher.disconnect(&username, id).await;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::{
        connect_async,
        tungstenite::{self, Message as Frame},
        MaybeTlsStream,
        WebSocketStream,
    };

    use crate::{app, AppState};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn serve(state: AppState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app(state)).await.unwrap() });
        format!("ws://{addr}/ws")
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    async fn wait_for(state: &AppState, username: &str, online: bool) {
        for _ in 0..100 {
            if state.connections.is_online(username) == online {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{username} never became online={online}");
    }

    async fn open(state: &AppState, base: &str, username: &str) -> Client {
        let (socket, _) = connect_async(format!("{base}/{username}")).await.unwrap();
        wait_for(state, username, true).await;
        socket
    }

    async fn send(socket: &mut Client, event: Value) {
        socket.send(Frame::Text(event.to_string().into())).await.unwrap();
    }

    async fn next_event(socket: &mut Client) -> Value {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let Frame::Text(text) = frame {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    async fn is_closed(socket: &mut Client) -> bool {
        loop {
            match tokio::time::timeout(Duration::from_secs(5), socket.next()).await {
                Ok(Some(Ok(Frame::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => return true,
                Ok(Some(Ok(Frame::Text(_)))) | Err(_) => return false,
                Ok(Some(Ok(_))) => {}
            }
        }
    }

    #[tokio::test]
    async fn session_survives_bad_frames_and_hands_over_on_reconnect() {
        let state = AppState::default();
        let base = serve(state.clone()).await;

        let mut alice = open(&state, &base, "alice").await;
        let mut first_bob = open(&state, &base, "bob").await;

        send(&mut alice, json!("not an event")).await;
        alice.send(Frame::Text("{broken".to_owned().into())).await.unwrap();
        send(&mut alice, json!({"type": "chat", "receiver": "bob", "content": "first"})).await;
        assert_eq!(
            next_event(&mut first_bob).await,
            json!({"type": "chat", "sender": "alice", "content": "first", "receiver": "bob"})
        );

        let mut second_bob = connect_async(format!("{base}/bob")).await.unwrap().0;
        assert!(is_closed(&mut first_bob).await);
        settle().await;
        assert!(state.connections.is_online("bob"));

        send(&mut alice, json!({"type": "chat", "receiver": "main", "content": "ping"})).await;
        assert_eq!(next_event(&mut alice).await["content"], "ping");

        send(&mut alice, json!({"type": "chat", "receiver": "bob", "content": "second"})).await;
        assert_eq!(next_event(&mut second_bob).await["content"], "ping");
        assert_eq!(
            next_event(&mut second_bob).await,
            json!({"type": "chat", "sender": "alice", "content": "second", "receiver": "bob"})
        );

        drop(second_bob);
        assert_eq!(
            next_event(&mut alice).await,
            json!({"type": "system", "content": "bob left the chat"})
        );
        wait_for(&state, "bob", false).await;

        let inbox = state.conversations.threads_of("bob").await.unwrap();
        assert_eq!(inbox["alice"].len(), 2);
    }

    #[tokio::test]
    async fn close_frame_ends_the_session() {
        let state = AppState::default();
        let base = serve(state.clone()).await;

        let mut alice = open(&state, &base, "alice").await;
        let mut carol = open(&state, &base, "carol").await;

        carol.close(None).await.unwrap();
        assert_eq!(
            next_event(&mut alice).await,
            json!({"type": "system", "content": "carol left the chat"})
        );
        wait_for(&state, "carol", false).await;
    }

    #[tokio::test]
    async fn reserved_names_cannot_connect() {
        let state = AppState::default();
        let base = serve(state.clone()).await;

        for name in ["main", "group:g1"] {
            match connect_async(format!("{base}/{name}")).await {
                Err(tungstenite::Error::Http(response)) => {
                    assert_eq!(response.status(), 422, "{name}");
                }
                other => panic!("{name} connected: {:?}", other.map(|_| ())),
            }
        }
        assert!(state.connections.online().is_empty());
    }
}
