use crate::card::{Card, Rank};
use crate::error::PlayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 牌型 (HandType)
/// 大老二只允许同种牌型、同样张数之间比较，所以这里不需要牌型之间的大小关系。
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum HandType {
    Invalid,   // 不成牌型
    Single,    // 单张
    Pair,      // 对子
    Triple,    // 三条
    Straight,  // 顺子
    FullHouse, // 葫芦
    FourKind,  // 铁支 (四条带一张)
}

impl fmt::Display for HandType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            HandType::Invalid => "无效牌型",
            HandType::Single => "单张",
            HandType::Pair => "对子",
            HandType::Triple => "三条",
            HandType::Straight => "顺子",
            HandType::FullHouse => "葫芦",
            HandType::FourKind => "铁支",
        })
    }
}

// --- 牌型判断 ---

/// 判断一组牌的牌型。
///
/// - 1 张：单张
/// - 2 张同点：对子
/// - 3 张同点：三条
/// - 5 张：按点数分组，4+1 为铁支，3+2 为葫芦，
///   5 个不同点数且最大最小相差 4 为顺子 (2 最大，所以顺子不能绕过 2)
/// - 其他张数一律无效
pub fn classify(cards: &[Card]) -> HandType {
    match cards.len() {
        1 => HandType::Single,
        2 if all_same_rank(cards) => HandType::Pair,
        3 if all_same_rank(cards) => HandType::Triple,
        5 => classify_five(cards),
        _ => HandType::Invalid,
    }
}

fn all_same_rank(cards: &[Card]) -> bool {
    cards.windows(2).all(|w| w[0].rank == w[1].rank)
}

fn classify_five(cards: &[Card]) -> HandType {
    let groups = rank_groups(cards);
    let sizes: Vec<usize> = groups.iter().map(|&(count, _)| count).collect();

    match sizes.as_slice() {
        [4, 1] => HandType::FourKind,
        [3, 2] => HandType::FullHouse,
        [1, 1, 1, 1, 1] => {
            let max = cards.iter().map(|c| c.rank.value()).max().unwrap_or(0);
            let min = cards.iter().map(|c| c.rank.value()).min().unwrap_or(0);
            if max - min == 4 { HandType::Straight } else { HandType::Invalid }
        }
        _ => HandType::Invalid,
    }
}

/// 按点数分组，返回 (张数, 点数)，先按张数再按点数从大到小排序
fn rank_groups(cards: &[Card]) -> Vec<(usize, Rank)> {
    let mut groups: Vec<(usize, Rank)> = Vec::new();
    for card in cards {
        match groups.iter_mut().find(|(_, rank)| *rank == card.rank) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, card.rank)),
        }
    }
    groups.sort_by(|a, b| b.cmp(a));
    groups
}

/// 张数为 `size` 的那一组的点数 (葫芦里的三张、铁支里的四张)
fn group_rank(cards: &[Card], size: usize) -> Option<Rank> {
    rank_groups(cards)
        .into_iter()
        .find(|&(count, _)| count == size)
        .map(|(_, rank)| rank)
}

// --- 牌力比较 ---

/// 一组牌中最大的那张 (先比点数，再比花色)
pub fn highest(cards: &[Card]) -> Option<Card> {
    cards.iter().copied().max()
}

/// 比较两组牌的最大单张：`current` 的最大牌严格大于 `last` 的最大牌时返回 true
pub fn compare_highest(last: &[Card], current: &[Card]) -> bool {
    match (highest(last), highest(current)) {
        (Some(last), Some(current)) => current > last,
        _ => false,
    }
}

/// 同牌型比较，返回 `current` 是否压过 `last`。
///
/// 单张、对子、三条、顺子比最大的一张牌；葫芦比三张那一组的点数；铁支比四张那一组的点数。
pub fn compare_same_type(hand_type: HandType, last: &[Card], current: &[Card]) -> bool {
    match hand_type {
        HandType::Single | HandType::Pair | HandType::Triple | HandType::Straight => {
            compare_highest(last, current)
        }
        HandType::FullHouse => beats_by_group(last, current, 3),
        HandType::FourKind => beats_by_group(last, current, 4),
        HandType::Invalid => false,
    }
}

fn beats_by_group(last: &[Card], current: &[Card], size: usize) -> bool {
    match (group_rank(last, size), group_rank(current, size)) {
        (Some(last), Some(current)) => current > last,
        _ => false,
    }
}

/// 判断 `current` 能否压在桌面上的 `last` 之上，返回出牌的牌型。
///
/// 桌面为空时任何有效牌型都可以出；否则牌型、张数都必须相同，并且要严格更大。
pub fn check_play(last: &[Card], current: &[Card]) -> Result<HandType, PlayError> {
    let current_type = classify(current);
    if current_type == HandType::Invalid {
        return Err(PlayError::InvalidHand);
    }
    if last.is_empty() {
        return Ok(current_type);
    }

    let last_type = classify(last);
    if current_type != last_type || current.len() != last.len() {
        return Err(PlayError::TypeMismatch { expected: last_type, got: current_type });
    }
    if !compare_same_type(current_type, last, current) {
        return Err(PlayError::CannotBeat);
    }
    Ok(current_type)
}

/// `check_play` 的布尔版本
pub fn can_play(last: &[Card], current: &[Card]) -> bool {
    check_play(last, current).is_ok()
}

// --- 单元测试 ---
