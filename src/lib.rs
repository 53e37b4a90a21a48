//! # RDT4.0 (Reliable Data Transfer)
//!
//! 손실/손상이 발생하는 UDP 위에서 동작하는 윈도우 기반 신뢰 전송 프로토콜
//!
//! ## 핵심 특징
//! - **인터넷 체크섬**: 16비트 1의 보수 합으로 손상 패킷 검출 후 폐기
//! - **슬라이딩 윈도우**: 한 번의 `send`로 최대 W개의 DATA 패킷 동시 전송
//! - **누적 ACK**: 수신자는 순서대로 받은 마지막 seq만 ACK
//! - **선택적 재전송**: 타임아웃 시 아직 ACK 안 된 구간만 재전송
//! - **8비트 seq 랩어라운드**: mod 256 구간 연산
//! - **TWAIT 종료 대기**: 닫기 전 늦게 도착한 DATA에도 계속 ACK

pub mod channel;
pub mod checksum;
pub mod config;
pub mod error;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod seq;
pub mod session;
pub mod stats;
pub mod teardown;
pub mod transfer;
pub mod udt;

pub use channel::{Channel, FaultInjector, MemoryChannel};
pub use config::Config;
pub use error::{Error, Result};
pub use packet::{Packet, PacketError, PacketType, HEADER_LEN};
pub use session::Session;
pub use stats::SessionStats;
pub use teardown::CloseState;
pub use udt::UdtSocket;

/// 패킷당 기본 페이로드 크기 (바이트)
pub const PAYLOAD_SIZE: usize = 1000;

/// 기본 재전송 타임아웃 (밀리초)
pub const DEFAULT_TIMEOUT_MS: u64 = 50;

/// 기본 TWAIT (밀리초), 타임아웃의 10배
pub const DEFAULT_TWAIT_MS: u64 = 10 * DEFAULT_TIMEOUT_MS;

/// seq 공간 크기 (8비트)
pub const SEQ_SPACE: u16 = 256;
