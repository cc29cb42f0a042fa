//! 隐蔽信道使用的 IPv4 选项
//!
//! 借用时间戳选项（type 68）的外形：`[68, 8, pointer, oflw/flg, ts(4)]`，
//! 一个消息字节放在 32 位时间戳的最高字节，其余字节为零。

use super::ipv4::IpOption;

/// IPv4 Timestamp 选项（copy=0, class=2, number=4）
pub const COVERT_OPTION_KIND: u8 = 68;
pub const COVERT_OPTION_LEN: u8 = 8;

/// 指针指向选项末尾之后，表示唯一的时间戳槽位已被填写。
const SLOT_FILLED_POINTER: u8 = COVERT_OPTION_LEN + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CovertOption {
    pub byte: u8,
}

impl CovertOption {
    pub fn new(byte: u8) -> Self {
        Self { byte }
    }

    /// 时间戳字段的取值：消息字节左移到最高字节
    pub fn timestamp(&self) -> u32 {
        (self.byte as u32) << 24
    }

    pub fn to_ip_option(&self) -> IpOption {
        let mut data = Vec::with_capacity(COVERT_OPTION_LEN as usize - 2);
        data.push(SLOT_FILLED_POINTER);
        data.push(0);
        data.extend_from_slice(&self.timestamp().to_be_bytes());
        IpOption::new(COVERT_OPTION_KIND, data)
    }

    /// 从选项中恢复消息字节；不是隐蔽选项时返回 `None`。
    pub fn decode(opt: &IpOption) -> Option<Self> {
        if opt.kind != COVERT_OPTION_KIND || opt.data.len() != COVERT_OPTION_LEN as usize - 2 {
            return None;
        }
        let ts = u32::from_be_bytes([opt.data[2], opt.data[3], opt.data[4], opt.data[5]]);
        Some(Self::new((ts >> 24) as u8))
    }
}
