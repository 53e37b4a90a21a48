//! 비신뢰 데이터그램 채널 추상화
//!
//! 프로토콜 엔진은 "피어에게 바이트 전송"과 "바이트 수신(블로킹)" 두 가지만 사용한다.
//! 채널은 손실/손상/중복이 있을 수 있으며 엔진은 그 구현을 모른다.

use std::future::Future;

use bytes::Bytes;
use rand::Rng;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

use crate::{Error, Result};

/// 비신뢰 채널
///
/// - `send`: 설정된 단일 피어에게 데이터그램 하나 전송, 전송한 바이트 수 반환
/// - `recv`: 데이터그램 하나가 도착할 때까지 대기, `buf`보다 긴 데이터그램은 잘림
pub trait Channel: Send + Sync {
    fn send(&self, bytes: &[u8]) -> impl Future<Output = Result<usize>> + Send;

    fn recv(&self, buf: &mut [u8]) -> impl Future<Output = Result<usize>> + Send;
}

/// 결함 주입 결과
#[derive(Debug, PartialEq, Eq)]
pub enum Fault {
    /// 그대로 전달
    Deliver,

    /// 조용히 손실 (송신자는 성공으로 인식)
    Drop,

    /// 바이트 하나가 손상된 사본 전달
    Corrupt(Vec<u8>),
}

/// 손실/손상 결함 주입기
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultInjector {
    /// 손실 확률
    pub loss_rate: f64,

    /// 손상 확률
    pub error_rate: f64,
}

impl FaultInjector {
    pub fn new(loss_rate: f64, error_rate: f64) -> Self {
        Self {
            loss_rate,
            error_rate,
        }
    }

    /// 결함 없는 통과
    pub fn none() -> Self {
        Self::default()
    }

    /// 이번 데이터그램에 적용할 결함 결정
    ///
    /// `ThreadRng`는 `Send`가 아니므로 await 지점 밖에서 호출해야 한다.
    pub fn apply(&self, bytes: &[u8]) -> Fault {
        if self.loss_rate <= 0.0 && self.error_rate <= 0.0 {
            return Fault::Deliver;
        }

        let mut rng = rand::thread_rng();

        if rng.gen::<f64>() < self.loss_rate {
            warn!("udt_send: 비신뢰 계층에서 패킷 손실");
            return Fault::Drop;
        }

        if !bytes.is_empty() && rng.gen::<f64>() < self.error_rate {
            let mut corrupted = bytes.to_vec();
            let pos = rng.gen_range(0..corrupted.len());
            corrupted[pos] = if corrupted[pos] > 1 {
                corrupted[pos] - 2
            } else {
                254
            };
            warn!("udt_send: 비신뢰 계층에서 패킷 손상");
            return Fault::Corrupt(corrupted);
        }

        Fault::Deliver
    }
}

/// 프로세스 내부 데이터그램 파이프
///
/// 두 세션을 소켓 없이 연결할 때 사용한다. 한쪽이 닫히면(드롭) 반대쪽 `recv`는
/// [`Error::ConnectionClosed`]로 끝난다.
pub struct MemoryChannel {
    tx: mpsc::UnboundedSender<Bytes>,
    rx: Mutex<mpsc::UnboundedReceiver<Bytes>>,
    faults: FaultInjector,
}

impl MemoryChannel {
    /// 결함 없는 양방향 채널 쌍 생성
    pub fn pair() -> (Self, Self) {
        Self::pair_with_faults(FaultInjector::none())
    }

    /// 양방향 모두에 같은 결함 모델을 적용한 채널 쌍 생성
    pub fn pair_with_faults(faults: FaultInjector) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();

        let a = Self {
            tx: a_tx,
            rx: Mutex::new(a_rx),
            faults,
        };
        let b = Self {
            tx: b_tx,
            rx: Mutex::new(b_rx),
            faults,
        };
        (a, b)
    }

    fn push(&self, bytes: Bytes) -> Result<()> {
        self.tx.send(bytes).map_err(|_| Error::ConnectionClosed)
    }
}

impl Channel for MemoryChannel {
    async fn send(&self, bytes: &[u8]) -> Result<usize> {
        match self.faults.apply(bytes) {
            Fault::Deliver => self.push(Bytes::copy_from_slice(bytes))?,
            Fault::Drop => {}
            Fault::Corrupt(corrupted) => self.push(Bytes::from(corrupted))?,
        }
        Ok(bytes.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        let datagram = self
            .rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(Error::ConnectionClosed)?;

        let len = datagram.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram[..len]);
        Ok(len)
    }
}
