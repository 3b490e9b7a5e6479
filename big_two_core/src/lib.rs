//! # 大老二核心逻辑库
//!
//! 这个 `core` crate 包含了大老二 (锄大地) 的牌、牌型判断与比较、
//! 牌局状态机、房间目录，以及客户端-服务器通信消息的定义。
//! 它不做任何 I/O，服务端把 `RoomDirectory` 放在一把锁后面使用，
//! 客户端只用到牌和消息的定义。

mod card;
mod error;
mod hand;
mod logic;
mod message;
mod room;
mod state;

pub use card::*;

pub use error::*;

pub use hand::*;

pub use logic::*;

pub use message::*;

pub use room::*;

pub use state::*;
