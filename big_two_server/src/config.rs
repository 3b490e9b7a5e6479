use clap::Parser;
use std::net::SocketAddr;
use std::num::NonZeroUsize;

/// 大老二服务器配置，命令行参数优先，其次是环境变量
#[derive(Debug, Clone, Parser)]
#[command(name = "big_two_server", version, about = "大老二对局服务器")]
pub struct Config {
    /// 监听地址
    #[arg(long, env = "BIG_TWO_ADDR", default_value = "0.0.0.0:12345")]
    pub addr: SocketAddr,

    /// 每个连接的待发送消息队列长度，队列满视为写失败
    #[arg(long, env = "BIG_TWO_OUTBOUND_BUFFER", default_value = "32")]
    pub outbound_buffer: NonZeroUsize,
}
