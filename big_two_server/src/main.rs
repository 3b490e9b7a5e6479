mod config;
mod hub;

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use futures_util::{stream::StreamExt, SinkExt};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use big_two_core::{ClientMessage, ServerMessage};

use config::Config;
use hub::Hub;

// 服务器全局状态
struct AppState {
    hub: Hub,
    outbound_buffer: usize,
}

type SharedState = Arc<AppState>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    let state = SharedState::new(AppState {
        hub: Hub::new(),
        outbound_buffer: config.outbound_buffer.get(),
    });

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("伺服器启动，正在监听 {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期
///
/// 每条 WebSocket 文本消息正好是一个 JSON 信封，不依赖底层 TCP 读取的边界。
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // 有界队列：广播方只做 try_send，慢连接不会拖住其他人
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(state.outbound_buffer);

    // 启动一个新任务，专门负责将队列中的消息写到 WebSocket
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
        // 连接被注册表移除后队列关闭，通知对端关闭连接
        let _ = sender.close().await;
    });

    let (session_id, mut evicted) = state.hub.register(tx);

    // 主循环，按顺序处理这个连接发来的消息，直到对端断开或连接被注册表移除
    loop {
        tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => state.hub.handle(session_id, client_msg),
                    Err(e) => warn!("解析消息失败，已丢弃: {}", e),
                },
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = &mut evicted => {
                info!("连接 {} 已被移除，关闭 socket", session_id);
                break;
            }
        }
    }

    // 客户端断开连接，执行清理工作
    state.hub.close_session(session_id);
    // 写任务可能卡在不读数据的对端上，直接终止，两半 socket 随之释放
    writer.abort();
    info!("客户端连接关闭");
}
