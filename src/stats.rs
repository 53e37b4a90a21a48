//! 세션 통계

use std::time::{Duration, Instant};

/// 세션 전송 통계
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// 처음 전송한 DATA 패킷 수
    pub data_sent: u64,

    /// 타임아웃으로 재전송한 DATA 패킷 수
    pub retransmitted: u64,

    /// 송신 대기 루프 타임아웃 횟수
    pub timeouts: u64,

    /// 보낸 ACK 수 (재ACK 포함)
    pub acks_sent: u64,

    /// 받은 유효 ACK 수 (윈도우 안)
    pub acks_received: u64,

    /// 윈도우 밖이라 버린 ACK 수
    pub stale_acks: u64,

    /// 애플리케이션에 전달한 세그먼트 수
    pub delivered: u64,

    /// 중복 또는 순서가 어긋난 DATA 수
    pub duplicates: u64,

    /// 체크섬/형식 오류로 버린 패킷 수
    pub corrupted: u64,

    /// 전송 완료된 애플리케이션 바이트
    pub bytes_sent: u64,

    /// 전달한 애플리케이션 바이트
    pub bytes_delivered: u64,

    /// 세션 생성 시간
    created_at: Instant,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            data_sent: 0,
            retransmitted: 0,
            timeouts: 0,
            acks_sent: 0,
            acks_received: 0,
            stale_acks: 0,
            delivered: 0,
            duplicates: 0,
            corrupted: 0,
            bytes_sent: 0,
            bytes_delivered: 0,
            created_at: Instant::now(),
        }
    }

    /// 재전송 비율 (재전송 / 최초 전송)
    pub fn retransmit_ratio(&self) -> f64 {
        if self.data_sent == 0 {
            return 0.0;
        }
        self.retransmitted as f64 / self.data_sent as f64
    }

    /// 세션 경과 시간
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// 송신 처리율 (bytes/sec)
    pub fn send_throughput(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes_sent as f64 / secs
    }

    /// 한 줄 요약
    pub fn summary(&self) -> String {
        format!(
            "data={} retx={} ({:.1}%) timeouts={} acks_sent={} acks_recv={} stale={} delivered={} dup={} corrupted={}",
            self.data_sent,
            self.retransmitted,
            self.retransmit_ratio() * 100.0,
            self.timeouts,
            self.acks_sent,
            self.acks_received,
            self.stale_acks,
            self.delivered,
            self.duplicates,
            self.corrupted,
        )
    }
}
