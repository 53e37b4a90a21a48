//! 프로토콜 설정

use std::time::Duration;

use crate::packet::HEADER_LEN;
use crate::{Error, Result, DEFAULT_TIMEOUT_MS, DEFAULT_TWAIT_MS, PAYLOAD_SIZE};

/// UDP 데이터그램 최대 페이로드 (IPv4)
const MAX_DATAGRAM: usize = 65_507;

/// RDT 세션 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 비신뢰 채널의 패킷 손실 확률 (0.0 ~ 1.0)
    pub loss_rate: f64,

    /// 비신뢰 채널의 패킷 손상 확률 (0.0 ~ 1.0)
    pub error_rate: f64,

    /// 윈도우 크기 W (동시에 전송 중일 수 있는 DATA 패킷 수)
    /// seq 공간이 256이므로 255 이하여야 함
    pub window_size: u8,

    /// 패킷당 최대 페이로드 (바이트)
    pub payload_size: usize,

    /// 송신 대기 루프의 재전송 타임아웃 (밀리초)
    pub timeout_ms: u64,

    /// 종료 시 조용한 대기 시간 TWAIT (밀리초)
    pub twait_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            error_rate: 0.0,
            window_size: 1,
            payload_size: PAYLOAD_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS, // 50ms
            twait_ms: DEFAULT_TWAIT_MS,     // 500ms
        }
    }
}

impl Config {
    /// 네트워크 특성 설정 (손실률, 손상률, 윈도우 크기)
    pub fn network(loss_rate: f64, error_rate: f64, window_size: u8) -> Self {
        Self {
            loss_rate,
            error_rate,
            window_size,
            ..Self::default()
        }
    }

    /// 한 번의 `send`로 보낼 수 있는 최대 메시지 크기
    pub fn max_message_size(&self) -> usize {
        self.window_size as usize * self.payload_size
    }

    /// 수신 버퍼 크기 (헤더 + 페이로드)
    pub fn packet_buffer_size(&self) -> usize {
        HEADER_LEN + self.payload_size
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn twait(&self) -> Duration {
        Duration::from_millis(self.twait_ms)
    }

    /// 설정 검증
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::InvalidConfig {
                field: "window_size",
                value: self.window_size.to_string(),
            });
        }

        for (field, value) in [("loss_rate", self.loss_rate), ("error_rate", self.error_rate)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig {
                    field,
                    value: value.to_string(),
                });
            }
        }

        // 길이 필드는 16비트, 패킷 전체는 UDP 데이터그램 하나에 들어가야 함
        if self.payload_size == 0 || self.payload_size > MAX_DATAGRAM - HEADER_LEN {
            return Err(Error::InvalidConfig {
                field: "payload_size",
                value: self.payload_size.to_string(),
            });
        }

        if self.timeout_ms == 0 {
            return Err(Error::InvalidConfig {
                field: "timeout_ms",
                value: self.timeout_ms.to_string(),
            });
        }

        Ok(())
    }

    /// 로컬 루프백 테스트용 설정 (짧은 타임아웃)
    pub fn loopback(window_size: u8) -> Self {
        Self {
            window_size,
            timeout_ms: 20,
            twait_ms: 200,
            ..Self::default()
        }
    }

    /// 불안정한 네트워크용 설정
    pub fn unstable_network(window_size: u8) -> Self {
        Self {
            loss_rate: 0.1,
            error_rate: 0.1,
            window_size,
            payload_size: 500,  // 작은 패킷
            timeout_ms: 100,
            twait_ms: 1000,
        }
    }
}
