use big_two_core::{
    format_cards, ClientMessage, CreateRoomRequest, Departure, GameState, LobbyError, PlayCardRequest,
    RoomDirectory, SeatRequest, ServerMessage, TurnOutcome,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tracing::{info, warn};
use uuid::Uuid;

pub type SessionId = Uuid;

/// 请求被拒绝的原因。服务端没有错误回执，这些只会写进日志。
#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Lobby(#[from] LobbyError),
    #[error("连接 {0} 不存在")]
    UnknownSession(SessionId),
    #[error("连接还没有绑定玩家")]
    Unbound,
    #[error("连接已经以玩家 {0} 的身份坐在房间里")]
    AlreadySeated(String),
    #[error("连接绑定的是玩家 {bound}，不能代替 {requested} 操作")]
    Impersonation { bound: String, requested: String },
    #[error("玩家 {0} 不在任何房间中")]
    NotSeated(String),
}

// 一个连接的发送端、关闭通知和它绑定的玩家名
struct Session {
    sender: mpsc::Sender<ServerMessage>,
    shutdown: oneshot::Sender<()>,
    player_name: Option<String>,
}

// 一条待发出的消息和它的接收范围
struct Outgoing {
    audience: Audience,
    message: ServerMessage,
}

enum Audience {
    Everyone,
    Session(SessionId),
    Players(Vec<String>),
}

impl Outgoing {
    fn rooms(directory: &RoomDirectory) -> Self {
        Outgoing { audience: Audience::Everyone, message: ServerMessage::UpdateRooms(directory.list_rooms()) }
    }

    fn game(game: GameState) -> Self {
        Outgoing { audience: Audience::Players(game.player_names.clone()), message: ServerMessage::GameSync(game) }
    }
}

impl Audience {
    fn includes(&self, session_id: SessionId, player_name: Option<&str>) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::Session(id) => *id == session_id,
            Audience::Players(names) => player_name.is_some_and(|name| names.iter().any(|n| n == name)),
        }
    }
}

/// 连接注册表和广播器。
///
/// 重要‼️：房间目录是唯一的串行化点，所有修改和快照都在 `directory` 锁内完成。
/// 锁的顺序固定为 directory -> sessions，不允许反过来。
/// 广播只是把消息放进各连接的发送队列 (`try_send`)，真正的网络写入在各自的写任务里，
/// 所以持锁期间不会有任何网络 I/O。
pub struct Hub {
    directory: Mutex<RoomDirectory>,
    sessions: DashMap<SessionId, Session>,
}

impl Hub {
    pub fn new() -> Self {
        Hub { directory: Mutex::new(RoomDirectory::new()), sessions: DashMap::new() }
    }

    /// 登记一个新连接，并单独给它发一份当前的房间列表
    ///
    /// 返回的 `oneshot::Receiver` 在连接被移出注册表时完成，
    /// 连接任务收到后应当结束读循环并释放 socket。
    pub fn register(&self, sender: mpsc::Sender<ServerMessage>) -> (SessionId, oneshot::Receiver<()>) {
        let session_id = Uuid::new_v4();
        let (shutdown, closed) = oneshot::channel();
        let failed = {
            let directory = self.directory.lock();
            self.sessions.insert(session_id, Session { sender, shutdown, player_name: None });
            let rooms = ServerMessage::UpdateRooms(directory.list_rooms());
            self.publish(&[Outgoing { audience: Audience::Session(session_id), message: rooms }])
        };
        info!("新连接 {}", session_id);
        self.evict(failed);
        (session_id, closed)
    }

    /// 处理一条客户端消息。被拒绝的请求只记日志，不回复。
    pub fn handle(&self, session_id: SessionId, message: ClientMessage) {
        match self.dispatch(session_id, message) {
            Ok(failed) => self.evict(failed),
            Err(e) => warn!("连接 {} 的请求被拒绝: {}", session_id, e),
        }
    }

    /// 连接关闭：移除连接，如果绑定了玩家就按断线处理并广播
    pub fn close_session(&self, session_id: SessionId) {
        let mut pending = vec![session_id];
        while let Some(id) = pending.pop() {
            let mut directory = self.directory.lock();
            let Some((_, session)) = self.sessions.remove(&id) else {
                continue;
            };
            info!("连接 {} 已关闭", id);
            // 连接任务可能已经退出
            let _ = session.shutdown.send(());

            let Some(player) = session.player_name else {
                continue;
            };
            let Some(departure) = directory.disconnect(&player) else {
                continue;
            };
            info!("玩家 {} 断开连接", player);
            self.release(&departure);
            // 广播失败的连接继续按断线处理
            pending.extend(self.publish(&[Outgoing::rooms(&directory)]));
        }
    }

    // --- 消息分派 ---

    fn dispatch(&self, session_id: SessionId, message: ClientMessage) -> Result<Vec<SessionId>, HubError> {
        let mut directory = self.directory.lock();
        let bound = self
            .sessions
            .get(&session_id)
            .map(|session| session.player_name.clone())
            .ok_or(HubError::UnknownSession(session_id))?;

        let outgoing = match message {
            ClientMessage::CreateRoom(request) => self.create_room(&mut directory, session_id, bound, request)?,
            ClientMessage::JoinRoom(request) => self.join_room(&mut directory, session_id, bound, request)?,
            ClientMessage::LeaveRoom(request) => self.leave_room(&mut directory, bound, request)?,
            ClientMessage::StartGame(room_name) => Self::start_game(&mut directory, bound, &room_name)?,
            ClientMessage::PlayCard(request) => Self::play_card(&mut directory, bound, request)?,
            ClientMessage::UpdateRooms(_) => vec![Outgoing::rooms(&directory)],
        };
        Ok(self.publish(&outgoing))
    }

    fn create_room(
        &self,
        directory: &mut RoomDirectory,
        session_id: SessionId,
        bound: Option<String>,
        request: CreateRoomRequest,
    ) -> Result<Vec<Outgoing>, HubError> {
        ensure_unseated(directory, bound.as_deref())?;
        directory.create_room(&request.room_name, &request.owner_name)?;
        self.bind(session_id, &request.owner_name);

        info!("玩家 {} 创建了房间 {}", request.owner_name, request.room_name);
        Ok(vec![Outgoing::rooms(directory)])
    }

    fn join_room(
        &self,
        directory: &mut RoomDirectory,
        session_id: SessionId,
        bound: Option<String>,
        request: SeatRequest,
    ) -> Result<Vec<Outgoing>, HubError> {
        ensure_unseated(directory, bound.as_deref())?;
        let seat = directory.join_room(&request.room_name, &request.player_name)?.player_names.len() - 1;
        self.bind(session_id, &request.player_name);

        info!("玩家 {} 加入了房间 {} ({} 号座位)", request.player_name, request.room_name, seat);
        Ok(vec![Outgoing::rooms(directory)])
    }

    fn leave_room(
        &self,
        directory: &mut RoomDirectory,
        bound: Option<String>,
        request: SeatRequest,
    ) -> Result<Vec<Outgoing>, HubError> {
        let player = bound.ok_or(HubError::Unbound)?;
        if player != request.player_name {
            return Err(HubError::Impersonation { bound: player, requested: request.player_name });
        }
        let departure = directory.leave_room(&request.room_name, &player)?;
        self.release(&departure);

        match &departure {
            Departure::Left { room, player } => info!("玩家 {} 离开了房间 {}", player, room),
            Departure::Dissolved { room, .. } => info!("玩家 {} 离开，解散房间 {}", player, room),
        }
        Ok(vec![Outgoing::rooms(directory)])
    }

    fn start_game(
        directory: &mut RoomDirectory,
        bound: Option<String>,
        room_name: &str,
    ) -> Result<Vec<Outgoing>, HubError> {
        let player = bound.ok_or(HubError::Unbound)?;
        let game = directory.start_game(room_name, &player)?.clone();

        info!(
            "房间 {} 游戏开始，{} 持有梅花3先出",
            room_name,
            game.current_player_name().unwrap_or("?")
        );
        Ok(vec![Outgoing::rooms(directory), Outgoing::game(game)])
    }

    fn play_card(
        directory: &mut RoomDirectory,
        bound: Option<String>,
        request: PlayCardRequest,
    ) -> Result<Vec<Outgoing>, HubError> {
        // 出牌者以连接绑定的玩家为准，忽略客户端自报的 lastPlayerName
        let player = bound.ok_or(HubError::Unbound)?;
        let room_name = directory
            .room_of(&player)
            .map(|room| room.name.clone())
            .ok_or_else(|| HubError::NotSeated(player.clone()))?;

        let (outcome, game) = directory.play_turn(&room_name, &player, &request.last_play)?;
        let game = game.clone();

        match outcome {
            TurnOutcome::Passed { .. } => info!("{} 选择 PASS", player),
            TurnOutcome::TrickCleared { leader } => info!("三人 PASS，清桌，由 {} 号座位领出", leader),
            TurnOutcome::Played { hand_type, .. } => {
                info!("{} 出牌 {} ({})", player, format_cards(&request.last_play), hand_type)
            }
            TurnOutcome::Won { winner } => info!("{} 出完牌，房间 {} 游戏结束", winner, room_name),
        }
        Ok(vec![Outgoing::rooms(directory), Outgoing::game(game)])
    }

    // --- 连接绑定 ---

    fn bind(&self, session_id: SessionId, player_name: &str) {
        if let Some(mut session) = self.sessions.get_mut(&session_id) {
            session.player_name = Some(player_name.to_string());
        }
    }

    /// 离开房间的玩家解除绑定，之后这个名字可以被别人使用，连接也可以重新建房或加入
    fn release(&self, departure: &Departure) {
        let players = match departure {
            Departure::Left { player, .. } => std::slice::from_ref(player),
            Departure::Dissolved { players, .. } => players.as_slice(),
        };
        for mut session in self.sessions.iter_mut() {
            if session.player_name.as_ref().is_some_and(|name| players.contains(name)) {
                session.player_name = None;
            }
        }
    }

    // --- 广播 ---

    /// 把消息放进各连接的发送队列，返回写入失败 (队列已满或已关闭) 的连接
    fn publish(&self, outgoing: &[Outgoing]) -> Vec<SessionId> {
        let mut failed = Vec::new();
        for session in self.sessions.iter() {
            let session_id = *session.key();
            for out in outgoing {
                if !out.audience.includes(session_id, session.player_name.as_deref()) {
                    continue;
                }
                if let Err(e) = session.sender.try_send(out.message.clone()) {
                    match e {
                        TrySendError::Full(_) => warn!("连接 {} 的发送队列已满，按断线处理", session_id),
                        TrySendError::Closed(_) => warn!("向连接 {} 发送消息失败（可能已断开）", session_id),
                    }
                    failed.push(session_id);
                    break;
                }
            }
        }
        failed
    }

    fn evict(&self, failed: Vec<SessionId>) {
        for session_id in failed {
            self.close_session(session_id);
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// 已经坐在某个房间里的连接不能再建房或加入
fn ensure_unseated(directory: &RoomDirectory, bound: Option<&str>) -> Result<(), HubError> {
    match bound {
        Some(name) if directory.room_of(name).is_some() => Err(HubError::AlreadySeated(name.to_string())),
        _ => Ok(()),
    }
}

// --- 单元测试 ---
