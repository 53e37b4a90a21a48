//! 수신 엔진
//!
//! - 기대 seq와 같은 DATA만 수락, ACK 후 애플리케이션에 전달
//! - 중복/순서 어긋난 DATA는 마지막으로 순서대로 받은 seq를 재ACK
//! - 손상 패킷과 예상치 못한 ACK는 조용히 폐기

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tracing::{debug, info};

use crate::channel::Channel;
use crate::packet::{Packet, PacketType, HEADER_LEN};
use crate::session::{send_ack, Session};
use crate::{seq, Error, Result};

impl<C: Channel> Session<C> {
    /// 메시지 수신 (다음 순서의 세그먼트 하나)
    ///
    /// 순서대로 도착한 DATA 패킷 하나가 올 때까지 블로킹한다. 페이로드 길이가 0인
    /// DATA는 빈 `Bytes`로 전달된다. `max_length`보다 긴 패킷은 잘려서 체크섬 검사에서 버려진다.
    pub async fn receive(&mut self, max_length: usize) -> Result<Bytes> {
        self.receive_segment(max_length, None).await
    }

    /// 수신 루프 본체
    ///
    /// `activity`가 주어지면 DATA 패킷을 처리할 때마다 표시한다 (종료 대기 연장용).
    pub(crate) async fn receive_segment(
        &mut self,
        max_length: usize,
        activity: Option<&AtomicBool>,
    ) -> Result<Bytes> {
        let channel = self.channel.as_ref().ok_or(Error::ConnectionClosed)?;
        let mut buf = vec![0u8; max_length + HEADER_LEN];

        loop {
            let len = channel.recv(&mut buf).await?;

            let packet = match Packet::decode(&buf[..len]) {
                Ok(packet) => packet,
                Err(e) => {
                    self.stats.corrupted += 1;
                    debug!("손상 패킷 폐기: {}", e);
                    continue;
                }
            };

            if packet.kind == PacketType::Ack {
                debug!("예상치 못한 ACK 폐기: seq={}", packet.seq);
                continue;
            }

            if let Some(activity) = activity {
                activity.store(true, Ordering::SeqCst);
            }

            if packet.seq == self.seq_recv {
                send_ack(channel, &mut self.stats, packet.seq).await?;
                self.seq_recv = seq::next(self.seq_recv);

                self.stats.delivered += 1;
                self.stats.bytes_delivered += packet.payload.len() as u64;
                info!(
                    "receive: seq={}, {} bytes",
                    packet.seq,
                    packet.payload.len()
                );
                return Ok(packet.payload);
            }

            self.stats.duplicates += 1;
            debug!(
                "재전송 또는 순서 어긋난 DATA: seq={}, expected={}",
                packet.seq, self.seq_recv
            );
            send_ack(channel, &mut self.stats, seq::prev(self.seq_recv)).await?;
        }
    }
}
