use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use big_two_core::{
    format_cards, Card, ClientMessage, CreateRoomRequest, GameState, PlayCardRequest, RoomState, SeatRequest,
    ServerMessage,
};

/// 大老二控制台客户端，只用于手动测试服务器
#[derive(Debug, Parser)]
#[command(name = "big_two_client", version)]
struct Args {
    /// 服务器地址
    #[arg(long, default_value = "ws://127.0.0.1:12345/ws")]
    url: Url,

    /// 玩家名
    #[arg(long)]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("正在连接到: {}", args.url);
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    let me = args.name.clone();
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(ServerMessage::UpdateRooms(rooms)) => print_rooms(&rooms),
                    Ok(ServerMessage::GameSync(game)) => print_game(&game, &me),
                    Err(e) => eprintln!("解析服务器消息失败: {}", e),
                },
                Ok(Message::Close(_)) => {
                    println!("\n服务器关闭了连接");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
            print!("> "); // 重新显示输入提示符
            let _ = std::io::stdout().flush();
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 大老二客户端 ({}) ---", args.name);
    println!("可用命令:");
    println!("  rooms                     - 刷新房间列表");
    println!("  create <房间名>           - 创建房间");
    println!("  join <房间名>             - 加入房间");
    println!("  leave <房间名>            - 离开房间");
    println!("  start <房间名>            - 开始游戏 (仅房主)");
    println!("  play <牌> [<牌>...]       - 出牌，例如 play 3C 3D");
    println!("  pass                      - 过牌");
    println!("  exit                      - 退出");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else {
            break;
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = parts.first().copied();

        let client_msg = match (command, parts.get(1)) {
            (Some("rooms"), _) => ClientMessage::update_rooms(),
            (Some("create"), Some(room)) => ClientMessage::CreateRoom(CreateRoomRequest::new(room, &args.name)),
            (Some("join"), Some(room)) => ClientMessage::JoinRoom(SeatRequest::new(room, &args.name)),
            (Some("leave"), Some(room)) => ClientMessage::LeaveRoom(SeatRequest::new(room, &args.name)),
            (Some("start"), Some(room)) => ClientMessage::StartGame(room.to_string()),
            (Some("play"), Some(_)) => {
                match parts[1..].iter().map(|s| s.parse::<Card>()).collect::<Result<Vec<_>, _>>() {
                    Ok(cards) => play_request(cards, &args.name),
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                }
            }
            (Some("pass"), _) => play_request(Vec::new(), &args.name),
            (Some("exit"), _) => {
                println!("正在断开连接...");
                break;
            }
            (None, _) => continue,
            _ => {
                println!("未知命令或缺少参数: {}", line);
                continue;
            }
        };

        let payload = serde_json::to_string(&client_msg)?;
        write.send(Message::Text(payload.into())).await?;
    }

    let _ = write.close().await;
    Ok(())
}

fn play_request(cards: Vec<Card>, name: &str) -> ClientMessage {
    PlayCardRequest { last_play: cards, last_player_name: name.to_string() }.into()
}

fn print_rooms(rooms: &[RoomState]) {
    println!("\n<-- 房间列表 ({} 个)", rooms.len());
    for room in rooms {
        println!(
            "  {} [{}] 房主 {}：{}",
            room.name,
            if room.started { "游戏中" } else { "等待中" },
            room.owner_name,
            room.player_names.join(", ")
        );
    }
}

fn print_game(game: &GameState, me: &str) {
    println!("\n<-- 牌局同步");
    if game.game_over {
        println!("  游戏结束，{} 获胜!", game.winner_name);
        return;
    }
    if game.last_play.is_empty() {
        println!("  桌面: (空)");
    } else {
        println!("  桌面: {}  ({} 出)", format_cards(&game.last_play), game.last_player_name);
    }
    for (seat, name) in game.player_names.iter().enumerate() {
        let count = game.hands.get(seat).map_or(0, Vec::len);
        let marker = if game.current_turn == Some(seat) { "👉" } else { "  " };
        println!("  {} {} 号座位 {}：{} 张", marker, seat, name, count);
    }
    if let Some(hand) = game.seat_of(me).and_then(|seat| game.hands.get(seat)) {
        println!("  我的手牌: {}", format_cards(hand));
    }
}
