use crate::card::*;
use crate::error::PlayError;
use crate::hand::{check_play, HandType};
use crate::state::*;
use rand::Rng;

/// 连续过牌达到这个次数就清桌，由最后出牌的玩家重新领出
pub const PASSES_TO_CLEAR: u8 = 3;

/// 一次合法行动的结果，供服务端写日志
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// 过牌，轮到下一个座位
    Passed { next: SeatIndex },
    /// 第三次连续过牌，桌面清空，由 `leader` 领出
    TrickCleared { leader: SeatIndex },
    /// 出牌成功
    Played { hand_type: HandType, next: SeatIndex },
    /// 出完手牌，游戏结束
    Won { winner: String },
}

// --- 核心游戏流程函数 ---

impl GameState {
    /// 开始新的一局
    ///
    /// - 创建一副 52 张的新牌并均匀洗牌。
    /// - 按座位顺序每人发 13 张，并整理手牌。
    /// - 持有梅花 3 的座位先出牌。
    pub fn deal(player_names: &[String]) -> Self {
        Self::deal_with_rng(player_names, &mut rand::rng())
    }

    /// 与 `deal` 相同，但使用调用方提供的随机源
    pub fn deal_with_rng<R: Rng + ?Sized>(player_names: &[String], rng: &mut R) -> Self {
        Self::from_deck(player_names, shuffled_deck(rng))
    }

    /// 按给定的牌序发牌：第 i 个座位拿到第 i 段 13 张
    pub fn from_deck(player_names: &[String], deck: Vec<Card>) -> Self {
        let hands: Vec<Vec<Card>> = deck
            .chunks(HAND_SIZE)
            .take(SEATS)
            .map(|chunk| {
                let mut hand = chunk.to_vec();
                sort_hand(&mut hand);
                hand
            })
            .collect();

        // 梅花 3 只有一张，所以先手座位是唯一的
        let current_turn = hands.iter().position(|hand| hand.contains(&Card::OPENING));

        GameState {
            player_names: player_names.to_vec(),
            hands,
            last_play: Vec::new(),
            current_turn,
            last_player_name: String::new(),
            pass_count: 0,
            game_over: false,
            winner_name: String::new(),
            discard: Vec::new(),
        }
    }

    /// 处理一个玩家的行动
    ///
    /// `cards` 为空表示过牌，否则为出牌。
    /// 只有轮到的玩家才能行动；任何不合法的行动都会被拒绝，且不改变状态。
    pub fn play_turn(&mut self, player_name: &str, cards: &[Card]) -> Result<TurnOutcome, PlayError> {
        if self.game_over {
            return Err(PlayError::GameOver);
        }
        let seat = self
            .seat_of(player_name)
            .ok_or_else(|| PlayError::NotSeated(player_name.to_string()))?;
        if self.current_turn != Some(seat) {
            return Err(PlayError::NotYourTurn(player_name.to_string()));
        }

        if cards.is_empty() {
            self.pass(seat)
        } else {
            self.play(seat, player_name, cards)
        }
    }

    // --- 辅助逻辑函数 ---

    fn pass(&mut self, seat: SeatIndex) -> Result<TurnOutcome, PlayError> {
        // 桌面为空时轮到的人是领出者，必须出牌
        if self.last_play.is_empty() {
            return Err(PlayError::MustLead);
        }

        if self.pass_count + 1 == PASSES_TO_CLEAR {
            let leader = self.seat_of(&self.last_player_name).ok_or(PlayError::MustLead)?;
            self.last_play.clear();
            self.pass_count = 0;
            self.current_turn = Some(leader);
            return Ok(TurnOutcome::TrickCleared { leader });
        }

        self.pass_count += 1;
        let next = (seat + 1) % SEATS;
        self.current_turn = Some(next);
        Ok(TurnOutcome::Passed { next })
    }

    fn play(&mut self, seat: SeatIndex, player_name: &str, cards: &[Card]) -> Result<TurnOutcome, PlayError> {
        check_ownership(&self.hands[seat], cards)?;
        if self.is_opening_play() && !cards.contains(&Card::OPENING) {
            return Err(PlayError::MissingOpeningCard);
        }
        let hand_type = check_play(&self.last_play, cards)?;

        // 以下不会再失败，开始修改状态
        let emptied = {
            let hand = &mut self.hands[seat];
            hand.retain(|card| !cards.contains(card));
            sort_hand(hand);
            hand.is_empty()
        };
        self.discard.extend_from_slice(cards);
        self.last_play = cards.to_vec();
        self.last_player_name = player_name.to_string();
        self.pass_count = 0;

        if emptied {
            self.game_over = true;
            self.winner_name = player_name.to_string();
            self.current_turn = None;
            self.last_play.clear();
            return Ok(TurnOutcome::Won { winner: player_name.to_string() });
        }

        let next = (seat + 1) % SEATS;
        self.current_turn = Some(next);
        Ok(TurnOutcome::Played { hand_type, next })
    }
}

/// 出的牌必须都在手牌里，并且同一张牌不能出两次
fn check_ownership(hand: &[Card], cards: &[Card]) -> Result<(), PlayError> {
    for (i, card) in cards.iter().enumerate() {
        if cards[..i].contains(card) {
            return Err(PlayError::DuplicateCard(*card));
        }
        if !hand.contains(card) {
            return Err(PlayError::CardNotInHand(*card));
        }
    }
    Ok(())
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use Rank::*;
    use Suit::*;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    fn names() -> Vec<String> {
        ["alice", "bob", "carol", "dave"].iter().map(|s| s.to_string()).collect()
    }

    // 不洗牌直接发：座位 0 拿全部梅花，1 方块，2 红心，3 黑桃
    fn unshuffled_game() -> GameState {
        GameState::from_deck(&names(), create_deck())
    }

    fn assert_full_deck(state: &GameState) {
        let cards = state.cards_in_play();
        assert_eq!(cards.len(), DECK_SIZE);
        let unique: HashSet<_> = cards.iter().collect();
        assert_eq!(unique.len(), DECK_SIZE, "出现了重复的牌");
    }

    #[test]
    fn test_deal_gives_13_sorted_cards_each() {
        let mut rng = StdRng::seed_from_u64(42);
        let state = GameState::deal_with_rng(&names(), &mut rng);

        assert_eq!(state.hands.len(), SEATS);
        for hand in &state.hands {
            assert_eq!(hand.len(), HAND_SIZE);
            assert!(hand.windows(2).all(|w| w[0] < w[1]), "手牌应该已排序");
        }
        assert_full_deck(&state);
        assert!(state.last_play.is_empty());
        assert_eq!(state.pass_count, 0);
        assert!(!state.game_over);
    }

    #[test]
    fn test_club_three_holder_leads() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let state = GameState::deal_with_rng(&names(), &mut rng);
            let seat = state.current_turn.unwrap();
            assert!(state.hands[seat].contains(&Card::OPENING));
        }
        assert_eq!(unshuffled_game().current_turn, Some(0));
    }

    #[test]
    fn test_play_removes_cards_and_advances() {
        let mut state = unshuffled_game();
        let outcome = state.play_turn("alice", &[card(Three, Club)]).unwrap();

        assert_eq!(outcome, TurnOutcome::Played { hand_type: HandType::Single, next: 1 });
        assert_eq!(state.hands[0].len(), HAND_SIZE - 1);
        assert!(!state.hands[0].contains(&card(Three, Club)));
        assert_eq!(state.last_play, vec![card(Three, Club)]);
        assert_eq!(state.last_player_name, "alice");
        assert_eq!(state.current_turn, Some(1));
        assert_full_deck(&state);
    }

    #[test]
    fn test_opening_play_must_contain_club_three() {
        let mut state = unshuffled_game();
        let before = state.clone();
        assert_eq!(state.play_turn("alice", &[card(Four, Club)]), Err(PlayError::MissingOpeningCard));
        assert_eq!(state, before);

        // 梅花3 可以作为顺子的一部分出
        let straight = [card(Three, Club), card(Four, Club), card(Five, Club), card(Six, Club), card(Seven, Club)];
        assert!(state.play_turn("alice", &straight).is_ok());
    }

    #[test]
    fn test_wrong_turn_is_rejected() {
        let mut state = unshuffled_game();
        let before = state.clone();
        assert_eq!(
            state.play_turn("bob", &[card(Three, Diamond)]),
            Err(PlayError::NotYourTurn("bob".to_string()))
        );
        assert_eq!(state.play_turn("mallory", &[]), Err(PlayError::NotSeated("mallory".to_string())));
        assert_eq!(state, before);
    }

    #[test]
    fn test_cards_must_come_from_hand() {
        let mut state = unshuffled_game();
        assert_eq!(
            state.play_turn("alice", &[card(Three, Club), card(Three, Diamond)]),
            Err(PlayError::CardNotInHand(card(Three, Diamond)))
        );
        assert_eq!(
            state.play_turn("alice", &[card(Three, Club), card(Three, Club)]),
            Err(PlayError::DuplicateCard(card(Three, Club)))
        );
        assert_eq!(state.hands[0].len(), HAND_SIZE);
    }

    #[test]
    fn test_leader_cannot_pass_on_empty_table() {
        let mut state = unshuffled_game();
        assert_eq!(state.play_turn("alice", &[]), Err(PlayError::MustLead));
        assert_eq!(state.pass_count, 0);
        assert_eq!(state.current_turn, Some(0));
    }

    #[test]
    fn test_illegal_hand_is_rejected() {
        let mut state = unshuffled_game();
        state.play_turn("alice", &[card(Three, Club)]).unwrap();
        // 点数不同的两张牌不成牌型
        assert!(matches!(
            state.play_turn("bob", &[card(Four, Diamond), card(Five, Diamond)]),
            Err(PlayError::InvalidHand)
        ));
        assert!(matches!(state.play_turn("bob", &[card(Three, Diamond)]), Ok(_)));
        // 顺子压不了单张
        assert!(matches!(
            state.play_turn("carol", &[card(Three, Heart), card(Four, Heart), card(Five, Heart), card(Six, Heart), card(Seven, Heart)]),
            Err(PlayError::TypeMismatch { .. })
        ));
        assert_eq!(state.current_turn, Some(2));
    }

    #[test]
    fn test_three_passes_clear_table_and_return_to_last_player() {
        let mut state = unshuffled_game();
        state.play_turn("alice", &[card(Three, Club)]).unwrap();
        state.play_turn("bob", &[card(Three, Diamond)]).unwrap();

        assert_eq!(state.play_turn("carol", &[]), Ok(TurnOutcome::Passed { next: 3 }));
        assert_eq!(state.pass_count, 1);
        assert_eq!(state.play_turn("dave", &[]), Ok(TurnOutcome::Passed { next: 0 }));
        assert_eq!(state.pass_count, 2);
        assert_eq!(state.play_turn("alice", &[]), Ok(TurnOutcome::TrickCleared { leader: 1 }));

        assert!(state.last_play.is_empty());
        assert_eq!(state.pass_count, 0);
        assert_eq!(state.current_turn, state.seat_of(&state.last_player_name));
        assert_eq!(state.current_turn, Some(1));

        // 新一轮由 bob 领出任意牌型
        assert!(state.play_turn("bob", &[card(Four, Diamond), card(Five, Diamond), card(Six, Diamond), card(Seven, Diamond), card(Eight, Diamond)]).is_ok());
        assert_full_deck(&state);
    }

    #[test]
    fn test_trick_clear_needs_a_seated_last_player() {
        let mut state = unshuffled_game();
        state.last_play = vec![card(Three, Club)];
        state.last_player_name = "erin".to_string();
        state.pass_count = 2;

        assert_eq!(state.play_turn("alice", &[]), Err(PlayError::MustLead));
        assert_eq!(state.pass_count, 2);
        assert_eq!(state.last_play, vec![card(Three, Club)]);
        assert_eq!(state.current_turn, Some(0));
    }

    #[test]
    fn test_play_resets_pass_count() {
        let mut state = unshuffled_game();
        state.play_turn("alice", &[card(Three, Club)]).unwrap();
        state.play_turn("bob", &[]).unwrap();
        state.play_turn("carol", &[]).unwrap();
        assert_eq!(state.pass_count, 2);
        state.play_turn("dave", &[card(Three, Spade)]).unwrap();
        assert_eq!(state.pass_count, 0);
        assert_eq!(state.last_player_name, "dave");
    }

    #[test]
    fn test_emptying_hand_ends_game() {
        let mut state = unshuffled_game();
        // 让 alice 只剩下一张牌
        let rest: Vec<Card> = state.hands[0].drain(1..).collect();
        state.discard.extend(rest);

        let outcome = state.play_turn("alice", &[card(Three, Club)]).unwrap();
        assert_eq!(outcome, TurnOutcome::Won { winner: "alice".to_string() });
        assert!(state.game_over);
        assert_eq!(state.winner_name, "alice");
        assert_eq!(state.current_turn, None);
        assert!(state.last_play.is_empty());
        assert_full_deck(&state);

        // 结束后任何行动都被拒绝
        for name in names() {
            assert_eq!(state.play_turn(&name, &[]), Err(PlayError::GameOver));
        }
        assert_eq!(state.play_turn("bob", &[card(Three, Diamond)]), Err(PlayError::GameOver));
    }

    /// 每人只出能压过桌面的最小单张，否则过牌，一直打到有人出完
    #[test]
    fn test_cards_are_conserved_through_a_full_game() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut state = GameState::deal_with_rng(&names(), &mut rng);

        let mut turns = 0;
        while !state.game_over {
            turns += 1;
            assert!(turns < 1000, "游戏没有结束");

            let seat = state.current_turn.expect("游戏未结束时必须有人行动");
            let player = state.player_names[seat].clone();
            let choice = match state.last_play.as_slice() {
                [] => state.hands[seat].first().copied(),
                [top] => state.hands[seat].iter().copied().find(|c| c > top),
                _ => None,
            };
            let cards: Vec<Card> = choice.into_iter().collect();

            state.play_turn(&player, &cards).unwrap();
            assert_full_deck(&state);
            assert!(state.pass_count < PASSES_TO_CLEAR);
        }

        assert!(!state.winner_name.is_empty());
        let winner_seat = state.seat_of(&state.winner_name).unwrap();
        assert!(state.hands[winner_seat].is_empty());
    }
}
