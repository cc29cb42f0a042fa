//! 以太网帧编解码
//!
//! 中继只关心帧里是否带 IPv4 层，以及如何读写 IPv4 选项区。
//! 其余字段保持不动，由 `pnet_packet` 负责定长头部的访问与校验和。

mod covert_option;
mod ipv4;
mod summary;

pub use covert_option::{COVERT_OPTION_KIND, COVERT_OPTION_LEN, CovertOption};
pub use ipv4::{
    ETHERNET_HEADER_LEN, IPV4_MAX_OPTIONS_LEN, IPV4_MIN_HEADER_LEN, IpOption, OPTION_END,
    OPTION_NOP, ipv4_options, is_ipv4, rewrite_ipv4_options,
};
pub use summary::FrameSummary;
