//! 入口 / 出口主题映射

pub const IN_SECURE: &str = "inpktsec";
pub const IN_INSECURE: &str = "inpktinsec";
pub const OUT_SECURE: &str = "outpktsec";
pub const OUT_INSECURE: &str = "outpktinsec";

pub const INBOUND_SUBJECTS: [&str; 2] = [IN_SECURE, IN_INSECURE];

/// 包从哪条入口路径进来，在入口处解析一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ingress {
    Secure,
    Insecure,
}

impl Ingress {
    /// 只有 `inpktsec` 是 Secure，其他主题一律按 Insecure 处理
    pub fn from_subject(subject: &str) -> Self {
        if subject == IN_SECURE {
            Ingress::Secure
        } else {
            Ingress::Insecure
        }
    }

    /// 出口主题：secure 入口交叉转发到 `outpktinsec`，其余都去 `outpktsec`
    pub fn outbound(self) -> &'static str {
        match self {
            Ingress::Secure => OUT_INSECURE,
            Ingress::Insecure => OUT_SECURE,
        }
    }
}
