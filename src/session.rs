//! RDT 세션 (단일 피어 연결 상태)
//!
//! 송신 엔진([`crate::sender`]), 수신 엔진([`crate::receiver`]), 종료 제어([`crate::teardown`])는
//! 모두 `Session`의 메서드로 구현된다. 모든 연산이 `&mut self`를 받으므로
//! 같은 세션에서 `send`/`receive`가 동시에 진행될 수 없다.

use std::net::SocketAddr;

use tracing::{debug, info};

use crate::channel::{Channel, FaultInjector};
use crate::packet::Packet;
use crate::stats::SessionStats;
use crate::teardown::CloseState;
use crate::udt::UdtSocket;
use crate::{Config, Error, Result};

/// RDT 세션
pub struct Session<C> {
    /// 설정
    pub(crate) config: Config,

    /// 비신뢰 채널, 종료 후에는 `None`
    pub(crate) channel: Option<C>,

    /// 다음 DATA 패킷에 붙일 seq (송신 엔진 전용)
    pub(crate) seq_send: u8,

    /// 다음에 기대하는 DATA seq (수신 엔진 전용)
    pub(crate) seq_recv: u8,

    /// 종료 상태
    pub(crate) close_state: CloseState,

    /// 전송 통계
    pub(crate) stats: SessionStats,
}

impl<C: Channel> Session<C> {
    /// 채널 위에 새 세션 생성
    pub fn new(channel: C, config: Config) -> Result<Self> {
        config.validate()?;
        info!(
            "RDT session: W={}, payload={} bytes, timeout={}ms, twait={}ms",
            config.window_size, config.payload_size, config.timeout_ms, config.twait_ms
        );

        Ok(Self {
            config,
            channel: Some(channel),
            seq_send: 0,
            seq_recv: 0,
            close_state: CloseState::NotStarted,
            stats: SessionStats::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 채널 참조 (종료 후에는 `None`)
    pub fn channel(&self) -> Option<&C> {
        self.channel.as_ref()
    }

    pub fn seq_send(&self) -> u8 {
        self.seq_send
    }

    pub fn seq_recv(&self) -> u8 {
        self.seq_recv
    }

    pub fn close_state(&self) -> CloseState {
        self.close_state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

impl Session<UdtSocket> {
    /// UDP 소켓을 열고 로컬 주소에 바인딩
    ///
    /// 설정의 손실률/손상률이 소켓의 결함 주입기로 들어간다.
    pub async fn bind(config: Config, local_addr: SocketAddr) -> Result<Self> {
        config.validate()?;
        let faults = FaultInjector::new(config.loss_rate, config.error_rate);
        let socket = UdtSocket::bind(local_addr, faults).await?;
        Self::new(socket, config)
    }

    /// 피어 주소 지정
    pub fn set_peer(&self, peer: SocketAddr) -> Result<()> {
        let socket = self.channel.as_ref().ok_or(Error::ConnectionClosed)?;
        socket.set_peer(peer);
        debug!("peer set to {}", peer);
        Ok(())
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.channel
            .as_ref()
            .ok_or(Error::ConnectionClosed)?
            .local_addr()
    }
}

/// 주어진 seq로 ACK 전송
pub(crate) async fn send_ack<C: Channel>(
    channel: &C,
    stats: &mut SessionStats,
    seq: u8,
) -> Result<()> {
    channel.send(&Packet::ack(seq).encode()).await?;
    stats.acks_sent += 1;
    debug!("ACK 전송: seq={}", seq);
    Ok(())
}
