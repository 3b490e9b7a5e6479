use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// --- 牌局常量 ---

/// 每局固定 4 个座位
pub const SEATS: usize = 4;
/// 每个座位发 13 张牌
pub const HAND_SIZE: usize = 13;
/// 一副牌 52 张，没有大小王
pub const DECK_SIZE: usize = SEATS * HAND_SIZE;

// --- 核心数据结构定义 ---

/// 花色 (Suit)
/// 变体顺序即大老二的花色大小：梅花 < 方块 < 红心 < 黑桃。
/// 网络上用 0..3 的整数表示。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Suit {
    Club = 0,    // 梅花 ♣️
    Diamond = 1, // 方块 ♦️
    Heart = 2,   // 红心 ♥️
    Spade = 3,   // 黑桃 ♠️
}

/// 点数 (Rank)
/// 判别值就是网络上的点数编码 (3..=15)，J=11, Q=12, K=13, A=14, 2=15。
/// 派生的 Ord 直接给出大老二的点数顺序：3 最小，2 最大。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rank {
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
    Two = 15,
}

/// 单张扑克牌 (Card)
/// 字段顺序决定了派生 Ord：先比点数，再比花色。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    /// 梅花 3，持有它的座位先出牌
    pub const OPENING: Card = Card { rank: Rank::Three, suit: Suit::Club };

    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Diamond, Suit::Heart, Suit::Spade];
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven, Rank::Eight, Rank::Nine,
        Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace, Rank::Two,
    ];

    /// 网络编码的点数值 (3..=15)，同时也是比较用的数值
    pub fn value(self) -> u8 {
        self as u8
    }
}

// --- 与网络编码之间的转换 ---

impl From<Suit> for u8 {
    fn from(suit: Suit) -> u8 {
        suit as u8
    }
}

impl TryFrom<u8> for Suit {
    type Error = CardParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Suit::ALL
            .get(value as usize)
            .copied()
            .ok_or(CardParseError::Suit(value.to_string()))
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> u8 {
        rank.value()
    }
}

impl TryFrom<u8> for Rank {
    type Error = CardParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rank::ALL
            .iter()
            .copied()
            .find(|r| r.value() == value)
            .ok_or(CardParseError::Rank(value.to_string()))
    }
}

/// 解析牌面文本失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardParseError {
    #[error("无效的点数: {0}")]
    Rank(String),
    #[error("无效的花色: {0}")]
    Suit(String),
}

/// 解析 "3C"、"10H"、"TD"、"QS"、"2D" 这样的文本，供控制台客户端使用
impl FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_uppercase();
        let Some(suit_char) = s.chars().last() else {
            return Err(CardParseError::Rank(s));
        };
        let suit = match suit_char {
            'C' => Suit::Club,
            'D' => Suit::Diamond,
            'H' => Suit::Heart,
            'S' => Suit::Spade,
            _ => return Err(CardParseError::Suit(suit_char.to_string())),
        };
        let rank_text = &s[..s.len() - suit_char.len_utf8()];
        let rank = match rank_text {
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" | "T" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            "A" => Rank::Ace,
            "2" => Rank::Two,
            _ => return Err(CardParseError::Rank(rank_text.to_string())),
        };
        Ok(Card { rank, suit })
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Club => "♣️",
            Suit::Diamond => "♦️",
            Suit::Heart => "♥️",
            Suit::Spade => "♠️",
        })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            Rank::Two => "2",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.suit, self.rank)
    }
}

/// 把一组牌格式化成 "♣️3 ♦️3" 这样的文本，用于日志
pub fn format_cards(cards: &[Card]) -> String {
    cards.iter().map(Card::to_string).collect::<Vec<_>>().join(" ")
}

// --- 牌组生成 ---

/// 创建一副完整的 52 张扑克牌 (13 个点数 × 4 种花色)
pub fn create_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for &suit in &Suit::ALL {
        for &rank in &Rank::ALL {
            deck.push(Card { rank, suit });
        }
    }
    deck
}

/// 用给定的随机源洗出一副新牌。
/// `shuffle` 是 Fisher-Yates，只要随机源均匀，得到的排列就是均匀的。
pub fn shuffled_deck<R: Rng + ?Sized>(rng: &mut R) -> Vec<Card> {
    let mut deck = create_deck();
    deck.shuffle(rng);
    deck
}

/// 按大老二的顺序整理手牌 (点数优先，花色其次)。
/// 只是为了展示方便，规则本身不依赖手牌顺序。
pub fn sort_hand(hand: &mut [Card]) {
    hand.sort();
}

// --- 单元测试 ---
