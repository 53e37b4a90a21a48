//! UDP 기반 비신뢰 채널 (udt_send / udt_recv)

use std::net::SocketAddr;

use parking_lot::RwLock;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::channel::{Channel, Fault, FaultInjector};
use crate::{Error, Result};

/// 결함 주입이 들어간 UDP 소켓
///
/// 피어 주소는 하나뿐이며 첫 송신 전에 [`UdtSocket::set_peer`]로 지정해야 한다.
pub struct UdtSocket {
    socket: UdpSocket,
    peer: RwLock<Option<SocketAddr>>,
    faults: FaultInjector,
}

impl UdtSocket {
    /// 소켓 생성 및 바인딩
    pub async fn bind(local_addr: SocketAddr, faults: FaultInjector) -> Result<Self> {
        let socket = UdpSocket::bind(local_addr).await?;
        info!(
            "UDT socket bound on {} (loss {:.2}, error {:.2})",
            socket.local_addr()?,
            faults.loss_rate,
            faults.error_rate
        );

        Ok(Self {
            socket,
            peer: RwLock::new(None),
            faults,
        })
    }

    /// 피어 주소 지정
    pub fn set_peer(&self, peer: SocketAddr) {
        *self.peer.write() = Some(peer);
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        *self.peer.read()
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

impl Channel for UdtSocket {
    async fn send(&self, bytes: &[u8]) -> Result<usize> {
        let peer = self.peer().ok_or(Error::PeerNotSet)?;

        match self.faults.apply(bytes) {
            Fault::Deliver => Ok(self.socket.send_to(bytes, peer).await?),
            // 손실은 송신 성공으로 보고
            Fault::Drop => Ok(bytes.len()),
            Fault::Corrupt(corrupted) => Ok(self.socket.send_to(&corrupted, peer).await?),
        }
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        let (len, from) = self.socket.recv_from(buf).await?;
        debug!("udt_recv: {} bytes from {}", len, from);
        Ok(len)
    }
}
