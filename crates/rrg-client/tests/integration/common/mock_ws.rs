//! Scripted mock RRG WebSocket server for integration tests.
//!
//! Each accepted connection runs the same list of [`Step`]s, then keeps
//! reading until the client closes. Every text frame the client sends is
//! recorded.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// One scripted server action.
#[derive(Debug, Clone)]
pub enum Step {
    /// Send a text frame.
    Send(String),
    /// Send a Ping frame.
    Ping(Vec<u8>),
    /// Send a Binary frame.
    Binary(Vec<u8>),
    /// Wait for the next text frame from the client.
    Receive,
    /// Pause before the next step.
    Sleep(Duration),
    /// Send a Close frame, wait for the client's reply and stop.
    Close,
}

impl Step {
    pub fn send(text: impl Into<String>) -> Self {
        Self::Send(text.into())
    }

    /// `{"MessageType":"MSG","Message":<marker>}`
    pub fn msg(marker: &str) -> Self {
        Self::Send(serde_json::json!({"MessageType": "MSG", "Message": marker}).to_string())
    }

    /// `{"MessageType":"RESULT","Message":<body>}`
    pub fn result(body: serde_json::Value) -> Self {
        Self::Send(serde_json::json!({"MessageType": "RESULT", "Message": body}).to_string())
    }
}

#[derive(Default)]
struct Recorded {
    messages: Vec<String>,
    pongs: Vec<Vec<u8>>,
    client_closed: bool,
}

/// A scripted WebSocket server for testing.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    recorded: Arc<Mutex<Recorded>>,
    connections: Arc<Mutex<u32>>,
}

impl MockWsServer {
    /// Start a new server on an available port.
    pub async fn start(script: Vec<Step>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded: Arc<Mutex<Recorded>> = Arc::new(Mutex::new(Recorded::default()));
        let connections: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let recorded_clone = recorded.clone();
        let connections_clone = connections.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        *connections_clone.lock().await += 1;
                        tokio::spawn(handle_connection(
                            stream,
                            script.clone(),
                            recorded_clone.clone(),
                        ));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            recorded,
            connections,
        }
    }

    /// Get the server's WebSocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    /// Get the number of connections received.
    pub async fn connection_count(&self) -> u32 {
        *self.connections.lock().await
    }

    /// Get all text frames received from clients.
    pub async fn received_messages(&self) -> Vec<String> {
        self.recorded.lock().await.messages.clone()
    }

    /// Get the payloads of all Pong frames received from clients.
    pub async fn received_pongs(&self) -> Vec<Vec<u8>> {
        self.recorded.lock().await.pongs.clone()
    }

    /// Wait until a client has sent a Close frame.
    pub async fn wait_for_client_close(&self, within: Duration) -> bool {
        tokio::time::timeout(within, async {
            loop {
                if self.recorded.lock().await.client_closed {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .is_ok()
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(stream: TcpStream, script: Vec<Step>, recorded: Arc<Mutex<Recorded>>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    for step in script {
        match step {
            Step::Send(text) => {
                if write.send(Message::Text(text)).await.is_err() {
                    return;
                }
            }
            Step::Ping(data) => {
                if write.send(Message::Ping(data)).await.is_err() {
                    return;
                }
            }
            Step::Binary(data) => {
                if write.send(Message::Binary(data)).await.is_err() {
                    return;
                }
            }
            Step::Sleep(duration) => tokio::time::sleep(duration).await,
            Step::Close => {
                let _ = write.send(Message::Close(None)).await;
                // Drain until the client's reply
                while let Some(Ok(msg)) = read.next().await {
                    match msg {
                        Message::Close(_) => {
                            recorded.lock().await.client_closed = true;
                            break;
                        }
                        Message::Pong(data) => recorded.lock().await.pongs.push(data),
                        _ => {}
                    }
                }
                return;
            }
            Step::Receive => loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        recorded.lock().await.messages.push(text);
                        break;
                    }
                    Some(Ok(Message::Close(_))) => {
                        recorded.lock().await.client_closed = true;
                        // Flush the queued Close reply
                        let _ = write.close().await;
                        return;
                    }
                    Some(Ok(Message::Pong(data))) => {
                        recorded.lock().await.pongs.push(data);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => return,
                }
            },
        }
    }

    // Script done: record anything else until the client goes away
    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                recorded.lock().await.messages.push(text);
            }
            Ok(Message::Close(_)) => {
                recorded.lock().await.client_closed = true;
                let _ = write.close().await;
                break;
            }
            Ok(Message::Pong(data)) => {
                recorded.lock().await.pongs.push(data);
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockWsServer::start(Vec::new()).await;
        assert!(server.url().starts_with("ws://127.0.0.1:"));
        assert_eq!(server.connection_count().await, 0);
        server.shutdown().await;
    }
}
