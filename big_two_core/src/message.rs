use crate::card::Card;
use crate::state::{GameState, RoomState};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// 网络上的每条消息都是 {"type": ..., "data": ...} 的信封，
// 这里直接用 serde 的相邻标签枚举表示，每种 type 对应固定的 data 结构。

// --- 客户端 -> 服务器 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    /// 创建房间，发送者成为房主
    CreateRoom(CreateRoomRequest),
    /// 请求一次房间列表广播。data 没有意义，客户端发什么都接受
    UpdateRooms(Option<Value>),
    /// 离开房间
    LeaveRoom(SeatRequest),
    /// 加入房间
    JoinRoom(SeatRequest),
    /// 房主开始游戏，data 只是房间名
    StartGame(String),
    /// 出牌或过牌
    PlayCard(PlayCardRequest),
}

/// 创建房间请求。
/// 客户端会带上 playerNames 和 started，服务端只认 roomName 和 ownerName。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room_name: String,
    pub owner_name: String,
    #[serde(default)]
    pub player_names: Vec<String>,
    #[serde(default)]
    pub started: bool,
}

/// 加入/离开房间请求
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeatRequest {
    pub room_name: String,
    pub player_name: String,
}

/// 出牌请求，`last_play` 为空表示过牌。
/// 客户端可能还会带上手牌、轮次等字段，服务端一律忽略，以自己的状态为准。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayCardRequest {
    pub last_play: Vec<Card>,
    #[serde(default)]
    pub last_player_name: String,
}

// --- 服务器 -> 客户端 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// 房间列表快照，发给所有连接
    UpdateRooms(Vec<RoomState>),
    /// 牌局快照，只发给该房间里的玩家
    GameSync(GameState),
}

impl CreateRoomRequest {
    pub fn new(room_name: &str, owner_name: &str) -> Self {
        CreateRoomRequest {
            room_name: room_name.to_string(),
            owner_name: owner_name.to_string(),
            player_names: vec![owner_name.to_string()],
            started: false,
        }
    }
}

impl SeatRequest {
    pub fn new(room_name: &str, player_name: &str) -> Self {
        SeatRequest { room_name: room_name.to_string(), player_name: player_name.to_string() }
    }
}

impl ClientMessage {
    /// 不带 data 的房间列表请求
    pub fn update_rooms() -> Self {
        ClientMessage::UpdateRooms(None)
    }
}

impl From<PlayCardRequest> for ClientMessage {
    fn from(request: PlayCardRequest) -> Self {
        ClientMessage::PlayCard(request)
    }
}
