use crate::card::Card;
use serde::{Deserialize, Serialize};

/// 座位号 (0..4)，按加入房间的顺序分配
pub type SeatIndex = usize;

/// 大厅里的一个房间
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    #[serde(rename = "roomName")]
    pub name: String,
    pub owner_name: String,
    // 按加入顺序排列，下标就是座位号，最多 4 人
    pub player_names: Vec<String>,
    pub started: bool,
    // 只在服务端保存。房间列表广播时不带牌局，牌局通过 GameSync 单独同步。
    #[serde(skip)]
    pub game: Option<GameState>,
}

/// 一局牌的完整状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    // 发牌时的座位顺序，与房间的 player_names 一致
    pub player_names: Vec<String>,
    // 4 个座位的手牌，始终按大老二顺序排好
    pub hands: Vec<Vec<Card>>,
    // 桌面上最后出的牌，空表示桌面已清空
    pub last_play: Vec<Card>,
    // 轮到的座位；None 表示游戏已结束 (终止标记)
    pub current_turn: Option<SeatIndex>,
    pub last_player_name: String,
    // 自上一次出牌以来连续过牌的次数
    pub pass_count: u8,
    pub game_over: bool,
    pub winner_name: String,
    // 所有已经离开手牌的牌，按出牌顺序排列
    #[serde(default)]
    pub discard: Vec<Card>,
}

// --- GameState 的查询方法 ---

impl GameState {
    /// 玩家所在的座位号
    pub fn seat_of(&self, player_name: &str) -> Option<SeatIndex> {
        self.player_names.iter().position(|name| name == player_name)
    }

    /// 当前行动的玩家 (如果游戏还没结束)
    pub fn current_player_name(&self) -> Option<&str> {
        self.current_turn
            .and_then(|seat| self.player_names.get(seat))
            .map(String::as_str)
    }

    /// 是否还没有任何人出过牌
    pub fn is_opening_play(&self) -> bool {
        self.discard.is_empty()
    }

    /// 手牌加上已出的牌，任何时刻都应该正好是一副完整的牌
    pub fn cards_in_play(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = self.hands.iter().flatten().copied().collect();
        cards.extend(self.discard.iter().copied());
        cards
    }
}

impl RoomState {
    pub fn new(name: &str, owner_name: &str) -> Self {
        RoomState {
            name: name.to_string(),
            owner_name: owner_name.to_string(),
            player_names: vec![owner_name.to_string()],
            started: false,
            game: None,
        }
    }

    pub fn contains(&self, player_name: &str) -> bool {
        self.player_names.iter().any(|name| name == player_name)
    }

    pub fn is_owner(&self, player_name: &str) -> bool {
        self.owner_name == player_name
    }

    /// 用于大厅广播的快照，不带牌局
    pub fn lobby_view(&self) -> Self {
        RoomState {
            name: self.name.clone(),
            owner_name: self.owner_name.clone(),
            player_names: self.player_names.clone(),
            started: self.started,
            game: None,
        }
    }
}
