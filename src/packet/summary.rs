//! 检测历史里保存的帧摘要

use super::covert_option::COVERT_OPTION_KIND;
use super::ipv4::ipv4_options;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummary {
    pub len: usize,
    pub ipv4: bool,
    pub covert_option: bool,
}

impl FrameSummary {
    /// 选项区无法解析时按“带 IPv4、无隐蔽选项”记录
    pub fn of(frame: &[u8]) -> Self {
        let (ipv4, covert_option) = match ipv4_options(frame) {
            Ok(Some(opts)) => (true, opts.iter().any(|o| o.kind == COVERT_OPTION_KIND)),
            Ok(None) => (false, false),
            Err(_) => (true, false),
        };
        Self {
            len: frame.len(),
            ipv4,
            covert_option,
        }
    }
}
