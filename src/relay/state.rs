//! 中继生命周期状态

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayState {
    #[default]
    Idle,
    Connected,
    Running,
    Draining,
    Closed,
}

impl RelayState {
    /// 合法的状态迁移
    pub fn can_transition_to(self, next: RelayState) -> bool {
        use RelayState::*;
        matches!(
            (self, next),
            (Idle, Connected)
                | (Idle, Closed)
                | (Connected, Running)
                | (Connected, Closed)
                | (Running, Draining)
                | (Draining, Running)
                | (Draining, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == RelayState::Closed
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelayState::Idle => "idle",
            RelayState::Connected => "connected",
            RelayState::Running => "running",
            RelayState::Draining => "draining",
            RelayState::Closed => "closed",
        };
        f.write_str(s)
    }
}
