use crate::card::Card;
use crate::hand::HandType;
use thiserror::Error;

/// 出牌被拒绝的原因。被拒绝的出牌不会改变任何状态。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("游戏已经结束")]
    GameOver,
    #[error("玩家 {0} 不在本局中")]
    NotSeated(String),
    #[error("还没轮到玩家 {0}")]
    NotYourTurn(String),
    #[error("不成牌型")]
    InvalidHand,
    #[error("牌型不符：桌面是{expected}，出的是{got}")]
    TypeMismatch { expected: HandType, got: HandType },
    #[error("压不过桌面上的牌")]
    CannotBeat,
    #[error("手牌中没有 {0}")]
    CardNotInHand(Card),
    #[error("同一张牌 {0} 出了多次")]
    DuplicateCard(Card),
    #[error("桌面已清空，领出的玩家不能过牌")]
    MustLead,
    #[error("第一手牌必须包含梅花3")]
    MissingOpeningCard,
}

/// 房间管理操作被拒绝的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("房间 {0} 已存在")]
    RoomExists(String),
    #[error("房间 {0} 不存在")]
    RoomNotFound(String),
    #[error("房间 {0} 已满")]
    RoomFull(String),
    #[error("房间 {0} 已经开始游戏")]
    AlreadyStarted(String),
    #[error("房间 {0} 还没有开始游戏")]
    NotStarted(String),
    #[error("玩家名 {0} 已被占用")]
    NameTaken(String),
    #[error("玩家名不能为空")]
    EmptyName,
    #[error("玩家 {player} 不在房间 {room} 中")]
    NotInRoom { room: String, player: String },
    #[error("只有房主可以开始游戏")]
    NotOwner,
    #[error("需要 4 名玩家才能开始，当前只有 {0} 名")]
    NotEnoughPlayers(usize),
    #[error(transparent)]
    Game(#[from] PlayError),
}
