//! 대용량 데이터 전송 헬퍼
//!
//! `send`는 한 번에 윈도우 하나 분량만 보내므로, 길이 헤더(8바이트 빅엔디안)를 먼저 보내고
//! 나머지를 윈도우 단위로 나눠 반복 전송한다.

use tracing::{debug, info};

use crate::channel::Channel;
use crate::session::Session;
use crate::{Error, Result};

/// 길이 헤더 크기
pub const LENGTH_HEADER_LEN: usize = 8;

/// 데이터 전체 전송 (길이 헤더 + 본문)
pub async fn send_all<C: Channel>(session: &mut Session<C>, data: &[u8]) -> Result<()> {
    header_fits(session)?;
    let window_bytes = session.config().max_message_size();

    let sent = session.send(&(data.len() as u64).to_be_bytes()).await?;
    if sent != LENGTH_HEADER_LEN {
        return Err(Error::InvalidLengthHeader { len: sent });
    }

    let mut offset = 0;
    while offset < data.len() {
        let sent = session.send(&data[offset..]).await?;
        offset += sent;
        debug!("전송 진행: {}/{} bytes", offset, data.len());
    }

    info!(
        "전송 완료: {} bytes ({} bytes/window)",
        data.len(),
        window_bytes
    );
    Ok(())
}

/// 데이터 전체 수신 (길이 헤더 + 본문)
pub async fn receive_all<C: Channel>(session: &mut Session<C>) -> Result<Vec<u8>> {
    header_fits(session)?;
    let payload_size = session.config().payload_size;

    let header = session.receive(payload_size).await?;
    let header: [u8; LENGTH_HEADER_LEN] = header[..]
        .try_into()
        .map_err(|_| Error::InvalidLengthHeader { len: header.len() })?;
    let expected = u64::from_be_bytes(header) as usize;
    info!("수신 시작: {} bytes 예정", expected);

    let mut data = Vec::new();
    while data.len() < expected {
        let segment = session.receive(payload_size).await?;
        data.extend_from_slice(&segment);
    }

    Ok(data)
}

/// 길이 헤더는 패킷 하나에 실려야 수신 측이 한 번의 `receive`로 읽을 수 있다
fn header_fits<C: Channel>(session: &Session<C>) -> Result<()> {
    let payload_size = session.config().payload_size;
    if payload_size < LENGTH_HEADER_LEN {
        return Err(Error::PayloadTooSmall { payload_size });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, MemoryChannel};

    fn small_payload(window_size: u8) -> Config {
        Config {
            payload_size: 4,
            ..Config::loopback(window_size)
        }
    }

    #[tokio::test]
    async fn test_payload_smaller_than_header_is_rejected() {
        // W=1이면 헤더가 잘리고, W=4면 헤더가 두 패킷으로 나뉜다
        for window_size in [1, 4] {
            let (a, b) = MemoryChannel::pair();
            let mut sender = Session::new(a, small_payload(window_size)).unwrap();
            let mut receiver = Session::new(b, small_payload(window_size)).unwrap();

            assert!(matches!(
                send_all(&mut sender, b"hello world").await,
                Err(Error::PayloadTooSmall { payload_size: 4 })
            ));
            assert!(matches!(
                receive_all(&mut receiver).await,
                Err(Error::PayloadTooSmall { payload_size: 4 })
            ));
            assert_eq!(sender.stats().data_sent, 0);
        }
    }

    #[tokio::test]
    async fn test_header_exactly_fits_payload() {
        let config = Config {
            payload_size: LENGTH_HEADER_LEN,
            ..Config::loopback(1)
        };
        let (a, b) = MemoryChannel::pair();
        let mut sender = Session::new(a, config.clone()).unwrap();
        let mut receiver = Session::new(b, config).unwrap();

        let receiver_task =
            tokio::spawn(async move { receive_all(&mut receiver).await.unwrap() });
        send_all(&mut sender, b"hello world").await.unwrap();

        assert_eq!(receiver_task.await.unwrap(), b"hello world");
    }
}
