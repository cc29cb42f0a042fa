//! 隐蔽数据嵌入

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::packet::{CovertOption, is_ipv4, rewrite_ipv4_options};

/// 一次成功嵌入的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub character: char,
    pub value: u8,
    /// 嵌入后的游标值（从 1 开始）
    pub index: usize,
    /// Unix 时间（秒）
    pub timestamp: f64,
}

#[derive(Debug, Default)]
struct EncoderState {
    cursor: usize,
    log: Vec<EmissionRecord>,
}

/// 顺序嵌入消息字节的编码器。
///
/// 消息按字节处理，发送日志里的 `character` 是单个字节对应的字符，
/// 所以只有 ASCII 消息能在日志中原样还原（配置校验会拒绝非 ASCII）。
/// 游标只增不减，走到消息末尾后所有包原样通过。
#[derive(Debug)]
pub struct CovertEncoder {
    message: Vec<u8>,
    state: Mutex<EncoderState>,
}

/// 当前 Unix 时间（秒）
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

impl CovertEncoder {
    pub fn new(message: impl Into<Vec<u8>>) -> Self {
        Self {
            message: message.into(),
            state: Mutex::new(EncoderState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, EncoderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    pub fn cursor(&self) -> usize {
        self.state().cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor() >= self.message.len()
    }

    /// 发送日志的副本
    pub fn emission_log(&self) -> Vec<EmissionRecord> {
        self.state().log.clone()
    }

    /// 以当前墙钟时间嵌入，见 [`CovertEncoder::encode_at`]。
    pub fn encode(&self, frame: &[u8]) -> Result<Option<Vec<u8>>> {
        self.encode_at(frame, unix_now())
    }

    /// 把下一个未发送的消息字节写进帧的 IPv4 选项区。
    ///
    /// 返回 `Ok(None)` 表示帧应原样转发（没有 IPv4 层或消息已发完）。
    /// 重写失败时返回 `Error::Injection`，游标不前进。
    pub fn encode_at(&self, frame: &[u8], now_secs: f64) -> Result<Option<Vec<u8>>> {
        let mut state = self.state();
        let Some(&byte) = self.message.get(state.cursor) else {
            return Ok(None);
        };
        if !is_ipv4(frame) {
            return Ok(None);
        }

        let opt = CovertOption::new(byte).to_ip_option();
        let out = rewrite_ipv4_options(frame, &[opt])
            .map_err(|e| Error::Injection(format!("embedding byte {byte:#04x}: {e}")))?;

        state.cursor += 1;
        let record = EmissionRecord {
            character: byte as char,
            value: byte,
            index: state.cursor,
            timestamp: now_secs,
        };
        debug!(
            character = %record.character,
            value = record.value,
            index = record.index,
            remaining = self.message.len() - state.cursor,
            "嵌入隐蔽字节"
        );
        state.log.push(record);

        Ok(Some(out))
    }
}
