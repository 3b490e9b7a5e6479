use crate::card::{Card, SEATS};
use crate::error::LobbyError;
use crate::logic::TurnOutcome;
use crate::state::{GameState, RoomState};
use rand::Rng;

/// 玩家离开 (或断线) 之后房间的变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// 只移除了这个玩家，房间保留
    Left { room: String, player: String },
    /// 房间被解散，`players` 是解散前坐在房间里的所有玩家
    Dissolved { room: String, players: Vec<String> },
}

/// 大厅：进程内唯一的房间目录。
///
/// 所有房间和牌局状态都只能通过这里的方法修改，
/// 调用方负责把整个目录放在同一把锁后面。
#[derive(Debug, Default)]
pub struct RoomDirectory {
    // 按创建顺序保存
    rooms: Vec<RoomState>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    // --- 查询 ---

    pub fn room(&self, name: &str) -> Option<&RoomState> {
        self.rooms.iter().find(|r| r.name == name)
    }

    /// 玩家所在的房间
    pub fn room_of(&self, player_name: &str) -> Option<&RoomState> {
        self.rooms.iter().find(|r| r.contains(player_name))
    }

    /// 房间列表快照，用于广播 (不带牌局)
    pub fn list_rooms(&self) -> Vec<RoomState> {
        self.rooms.iter().map(RoomState::lobby_view).collect()
    }

    fn room_mut(&mut self, name: &str) -> Result<&mut RoomState, LobbyError> {
        self.rooms
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| LobbyError::RoomNotFound(name.to_string()))
    }

    fn ensure_name_free(&self, player_name: &str) -> Result<(), LobbyError> {
        if player_name.is_empty() {
            return Err(LobbyError::EmptyName);
        }
        // 断线时按玩家名找房间，所以玩家名在整个大厅里必须唯一
        if self.room_of(player_name).is_some() {
            return Err(LobbyError::NameTaken(player_name.to_string()));
        }
        Ok(())
    }

    // --- 房间管理 ---

    /// 创建房间，房主自动坐在 0 号座位
    pub fn create_room(&mut self, name: &str, owner_name: &str) -> Result<&RoomState, LobbyError> {
        if self.room(name).is_some() {
            return Err(LobbyError::RoomExists(name.to_string()));
        }
        self.ensure_name_free(owner_name)?;

        self.rooms.push(RoomState::new(name, owner_name));
        Ok(&self.rooms[self.rooms.len() - 1])
    }

    /// 加入房间，座位号就是加入时的人数
    pub fn join_room(&mut self, name: &str, player_name: &str) -> Result<&RoomState, LobbyError> {
        self.ensure_name_free(player_name)?;
        let room = self.room_mut(name)?;
        if room.started {
            return Err(LobbyError::AlreadyStarted(name.to_string()));
        }
        if room.player_names.len() >= SEATS {
            return Err(LobbyError::RoomFull(name.to_string()));
        }

        room.player_names.push(player_name.to_string());
        Ok(&*room)
    }

    /// 主动离开房间。
    ///
    /// 未开始时：房主离开解散房间，其他人离开只移除自己。
    /// 已开始时：没有补位机制，和断线一样直接解散房间。
    pub fn leave_room(&mut self, name: &str, player_name: &str) -> Result<Departure, LobbyError> {
        let room = self.room_mut(name)?;
        if !room.contains(player_name) {
            return Err(LobbyError::NotInRoom { room: name.to_string(), player: player_name.to_string() });
        }

        let dissolve = room.started || room.is_owner(player_name);
        if !dissolve {
            room.player_names.retain(|p| p != player_name);
            if !room.player_names.is_empty() {
                return Ok(Departure::Left { room: name.to_string(), player: player_name.to_string() });
            }
        }
        Ok(self.dissolve(name))
    }

    /// 玩家断线：找到他所在的房间，按离开规则处理。玩家不在任何房间时返回 None。
    pub fn disconnect(&mut self, player_name: &str) -> Option<Departure> {
        let name = self.room_of(player_name)?.name.clone();
        self.leave_room(&name, player_name).ok()
    }

    fn dissolve(&mut self, name: &str) -> Departure {
        let players = match self.rooms.iter().position(|r| r.name == name) {
            Some(idx) => self.rooms.remove(idx).player_names,
            None => Vec::new(),
        };
        Departure::Dissolved { room: name.to_string(), players }
    }

    // --- 牌局 ---

    /// 房主开始游戏：必须正好 4 人且尚未开始
    pub fn start_game(&mut self, name: &str, requester: &str) -> Result<&GameState, LobbyError> {
        self.start_game_with_rng(name, requester, &mut rand::rng())
    }

    pub fn start_game_with_rng<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        requester: &str,
        rng: &mut R,
    ) -> Result<&GameState, LobbyError> {
        let room = self.room_mut(name)?;
        if !room.is_owner(requester) {
            return Err(LobbyError::NotOwner);
        }
        if room.started {
            return Err(LobbyError::AlreadyStarted(name.to_string()));
        }
        if room.player_names.len() != SEATS {
            return Err(LobbyError::NotEnoughPlayers(room.player_names.len()));
        }

        room.started = true;
        let game = room.game.insert(GameState::deal_with_rng(&room.player_names, rng));
        Ok(&*game)
    }

    /// 在房间的牌局中行动，`cards` 为空表示过牌
    pub fn play_turn(
        &mut self,
        name: &str,
        player_name: &str,
        cards: &[Card],
    ) -> Result<(TurnOutcome, &GameState), LobbyError> {
        let room = self.room_mut(name)?;
        let game = match room.game.as_mut() {
            Some(game) if room.started => game,
            _ => return Err(LobbyError::NotStarted(name.to_string())),
        };
        let outcome = game.play_turn(player_name, cards)?;
        Ok((outcome, &*game))
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};
    use crate::error::PlayError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn full_room() -> RoomDirectory {
        let mut directory = RoomDirectory::new();
        directory.create_room("table", "alice").unwrap();
        for name in ["bob", "carol", "dave"] {
            directory.join_room("table", name).unwrap();
        }
        directory
    }

    #[test]
    fn test_create_room() {
        let mut directory = RoomDirectory::new();
        let room = directory.create_room("table", "alice").unwrap();
        assert_eq!(room.owner_name, "alice");
        assert_eq!(room.player_names, vec!["alice"]);
        assert!(!room.started);
        assert!(room.game.is_none());

        // 重名房间不改变任何东西
        assert_eq!(directory.create_room("table", "bob"), Err(LobbyError::RoomExists("table".to_string())));
        assert_eq!(directory.list_rooms().len(), 1);
        assert_eq!(directory.room("table").unwrap().owner_name, "alice");
    }

    #[test]
    fn test_join_assigns_seats_in_order() {
        let directory = full_room();
        let room = directory.room("table").unwrap();
        assert_eq!(room.player_names, vec!["alice", "bob", "carol", "dave"]);
    }

    #[test]
    fn test_join_rejections() {
        let mut directory = full_room();
        assert_eq!(directory.join_room("table", "erin"), Err(LobbyError::RoomFull("table".to_string())));
        assert_eq!(directory.join_room("nowhere", "erin"), Err(LobbyError::RoomNotFound("nowhere".to_string())));
        assert_eq!(directory.join_room("table", "bob"), Err(LobbyError::NameTaken("bob".to_string())));

        directory.create_room("other", "erin").unwrap();
        assert_eq!(directory.join_room("other", ""), Err(LobbyError::EmptyName));
        assert_eq!(directory.room("other").unwrap().player_names, vec!["erin"]);
    }

    #[test]
    fn test_join_started_room_is_rejected() {
        let mut directory = RoomDirectory::new();
        directory.create_room("table", "alice").unwrap();
        directory.join_room("table", "bob").unwrap();
        directory.join_room("table", "carol").unwrap();
        directory.join_room("table", "dave").unwrap();
        directory.leave_room("table", "dave").unwrap();
        directory.start_game("table", "alice").unwrap_err();
        assert_eq!(directory.join_room("table", "dave").unwrap().player_names.len(), 4);
        directory.start_game("table", "alice").unwrap();

        assert_eq!(directory.join_room("table", "erin"), Err(LobbyError::AlreadyStarted("table".to_string())));
    }

    #[test]
    fn test_non_owner_leaving_keeps_room() {
        let mut directory = full_room();
        let departure = directory.leave_room("table", "carol").unwrap();
        assert_eq!(departure, Departure::Left { room: "table".to_string(), player: "carol".to_string() });
        assert_eq!(directory.room("table").unwrap().player_names, vec!["alice", "bob", "dave"]);
    }

    #[test]
    fn test_owner_leaving_dissolves_room() {
        let mut directory = full_room();
        let departure = directory.leave_room("table", "alice").unwrap();
        assert_eq!(
            departure,
            Departure::Dissolved {
                room: "table".to_string(),
                players: vec!["alice".into(), "bob".into(), "carol".into(), "dave".into()],
            }
        );
        assert!(directory.list_rooms().is_empty());
        // 原来的玩家可以重新建房
        assert!(directory.create_room("table", "bob").is_ok());
    }

    #[test]
    fn test_leave_rejections() {
        let mut directory = full_room();
        assert_eq!(directory.leave_room("nowhere", "bob"), Err(LobbyError::RoomNotFound("nowhere".to_string())));
        assert!(matches!(directory.leave_room("table", "erin"), Err(LobbyError::NotInRoom { .. })));
        assert_eq!(directory.room("table").unwrap().player_names.len(), 4);
    }

    #[test]
    fn test_disconnect_before_start_follows_leave_rules() {
        let mut directory = full_room();
        assert!(matches!(directory.disconnect("bob"), Some(Departure::Left { .. })));
        assert_eq!(directory.room("table").unwrap().player_names.len(), 3);
        assert!(matches!(directory.disconnect("alice"), Some(Departure::Dissolved { .. })));
        assert!(directory.room("table").is_none());
        assert_eq!(directory.disconnect("nobody"), None);
    }

    #[test]
    fn test_disconnect_after_start_dissolves_room() {
        for leaver in ["alice", "bob", "carol", "dave"] {
            let mut directory = full_room();
            directory.start_game("table", "alice").unwrap();
            assert!(matches!(directory.disconnect(leaver), Some(Departure::Dissolved { .. })));
            assert!(directory.room("table").is_none(), "{} 断线后房间应该被解散", leaver);
        }
    }

    #[test]
    fn test_start_game_preconditions() {
        let mut directory = RoomDirectory::new();
        directory.create_room("table", "alice").unwrap();
        directory.join_room("table", "bob").unwrap();
        assert_eq!(directory.start_game("table", "alice").err(), Some(LobbyError::NotEnoughPlayers(2)));
        assert!(!directory.room("table").unwrap().started);

        directory.join_room("table", "carol").unwrap();
        directory.join_room("table", "dave").unwrap();
        assert_eq!(directory.start_game("table", "bob").err(), Some(LobbyError::NotOwner));
        assert_eq!(directory.start_game("nowhere", "alice").err(), Some(LobbyError::RoomNotFound("nowhere".to_string())));

        let mut rng = StdRng::seed_from_u64(1);
        let game = directory.start_game_with_rng("table", "alice", &mut rng).unwrap();
        assert_eq!(game.player_names, vec!["alice", "bob", "carol", "dave"]);
        let room = directory.room("table").unwrap();
        assert!(room.started);
        assert!(room.game.is_some());

        // 一个房间只能开一局
        assert_eq!(directory.start_game("table", "alice").err(), Some(LobbyError::AlreadyStarted("table".to_string())));
    }

    #[test]
    fn test_play_turn_requires_started_room() {
        let mut directory = full_room();
        let opening = [Card::new(Rank::Three, Suit::Club)];
        assert_eq!(
            directory.play_turn("table", "alice", &opening).err(),
            Some(LobbyError::NotStarted("table".to_string()))
        );

        directory.start_game("table", "alice").unwrap();
        let leader = directory.room("table").and_then(|r| r.game.as_ref()).and_then(|g| g.current_player_name()).unwrap().to_string();
        let (outcome, game) = directory.play_turn("table", &leader, &opening).unwrap();
        assert!(matches!(outcome, TurnOutcome::Played { .. }));
        assert_eq!(game.last_player_name, leader);

        assert!(matches!(
            directory.play_turn("table", &leader, &[]),
            Err(LobbyError::Game(PlayError::NotYourTurn(_)))
        ));
    }

    #[test]
    fn test_list_rooms_hides_game() {
        let mut directory = full_room();
        directory.create_room("second", "erin").unwrap();
        directory.start_game("table", "alice").unwrap();

        let rooms = directory.list_rooms();
        assert_eq!(rooms.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["table", "second"]);
        assert!(rooms[0].started);
        assert!(rooms.iter().all(|r| r.game.is_none()));
    }
}
