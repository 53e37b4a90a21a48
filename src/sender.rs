//! 송신 엔진
//!
//! - 메시지를 윈도우 하나 분량의 DATA 패킷으로 분할해 한 번에 전송
//! - 누적 ACK 처리, 마지막 seq의 ACK가 오면 완료
//! - 타임아웃 시 아직 ACK 안 된 구간만 재전송

use bytes::Bytes;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::channel::Channel;
use crate::packet::{Packet, PacketType};
use crate::session::{send_ack, Session};
use crate::{seq, Error, Result};

impl<C: Channel> Session<C> {
    /// 메시지 전송
    ///
    /// `W * payload_size`보다 긴 메시지는 조용히 잘린다. 윈도우 전체가 누적 ACK될 때까지
    /// 반환하지 않으며, 성공 시 실제로 보낸(잘린) 메시지 크기를 반환한다.
    /// 채널 에러는 즉시 호출을 중단시킨다.
    pub async fn send(&mut self, message: &[u8]) -> Result<usize> {
        let channel = self.channel.as_ref().ok_or(Error::ConnectionClosed)?;
        let window = self.config.window_size;
        let payload_size = self.config.payload_size;

        let msg = &message[..message.len().min(self.config.max_message_size())];
        if msg.is_empty() {
            return Ok(0);
        }

        // 윈도우 전송
        let start_seq = self.seq_send;
        let mut packets = Vec::with_capacity(window as usize);
        for chunk in msg.chunks(payload_size) {
            let bytes = Packet::data(self.seq_send, Bytes::copy_from_slice(chunk)).encode();
            channel.send(&bytes).await?;
            debug!("DATA 전송: seq={}, {} bytes", self.seq_send, chunk.len());

            packets.push(bytes);
            self.stats.data_sent += 1;
            self.seq_send = seq::next(self.seq_send);
        }

        let last_seq = seq::prev(self.seq_send);
        let count = packets.len();

        // 누적 ACK된 최고 seq
        let mut acked: Option<u8> = None;
        let mut buf = vec![0u8; self.config.packet_buffer_size()];

        loop {
            let len = match timeout(self.config.timeout(), channel.recv(&mut buf)).await {
                Ok(received) => received?,
                Err(_) => {
                    self.stats.timeouts += 1;

                    let resend_from = acked.map_or(start_seq, seq::next);
                    warn!("타임아웃: seq {} ~ {} 재전송", resend_from, last_seq);

                    for (i, bytes) in packets.iter().enumerate() {
                        let packet_seq = start_seq.wrapping_add(i as u8);
                        if seq::in_window(packet_seq, resend_from, last_seq, window) {
                            channel.send(bytes).await?;
                            self.stats.retransmitted += 1;
                            debug!("DATA 재전송: seq={}", packet_seq);
                        }
                    }
                    continue;
                }
            };

            let packet = match Packet::decode(&buf[..len]) {
                Ok(packet) => packet,
                Err(e) => {
                    self.stats.corrupted += 1;
                    debug!("손상 패킷 폐기: {}", e);
                    continue;
                }
            };

            match packet.kind {
                PacketType::Ack if packet.seq == last_seq => {
                    self.stats.acks_received += 1;
                    self.stats.bytes_sent += msg.len() as u64;
                    info!(
                        "send 완료: {} bytes, {} packets (last seq {})",
                        msg.len(),
                        count,
                        last_seq
                    );
                    return Ok(msg.len());
                }
                PacketType::Ack
                    if count > 1
                        && seq::in_window(packet.seq, start_seq, seq::prev(last_seq), window) =>
                {
                    self.stats.acks_received += 1;
                    acked = Some(packet.seq);
                    debug!("누적 ACK: seq={}", packet.seq);
                }
                PacketType::Ack => {
                    self.stats.stale_acks += 1;
                    debug!("윈도우 밖 ACK 폐기: seq={}", packet.seq);
                }
                PacketType::Data if packet.seq == self.seq_recv => {
                    // 송신 중에는 새 DATA를 받을 수 없음
                    debug!("송신 중 새 DATA 수신, 폐기: seq={}", packet.seq);
                }
                PacketType::Data => {
                    // 피어가 이전 ACK를 잃어버린 재전송
                    self.stats.duplicates += 1;
                    send_ack(channel, &mut self.stats, seq::prev(self.seq_recv)).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{Config, MemoryChannel};

    const PAYLOAD: usize = 10;

    fn config(window: u8) -> Config {
        Config {
            payload_size: PAYLOAD,
            ..Config::loopback(window)
        }
    }

    async fn next_packet(peer: &MemoryChannel) -> Packet {
        let mut buf = [0u8; 64];
        let len = peer.recv(&mut buf).await.unwrap();
        Packet::decode(&buf[..len]).unwrap()
    }

    async fn ack(peer: &MemoryChannel, seq: u8) {
        peer.send(&Packet::ack(seq).encode()).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_window_and_terminal_ack() {
        let (a, peer) = MemoryChannel::pair();
        let mut session = Session::new(a, config(4)).unwrap();
        let message: Vec<u8> = (0..35).collect();

        let peer_task = tokio::spawn(async move {
            let mut received = Vec::new();
            for expected in 0..4u8 {
                let packet = next_packet(&peer).await;
                assert!(packet.is_data());
                assert_eq!(packet.seq, expected);
                received.extend_from_slice(&packet.payload);
            }
            ack(&peer, 3).await;
            (peer, received)
        });

        assert_eq!(session.send(&message).await.unwrap(), 35);
        assert_eq!(session.seq_send(), 4);

        let (_peer, received) = peer_task.await.unwrap();
        assert_eq!(received, message);
    }

    #[tokio::test]
    async fn test_oversized_message_is_truncated() {
        let (a, peer) = MemoryChannel::pair();
        let mut session = Session::new(a, config(2)).unwrap();

        let peer_task = tokio::spawn(async move {
            let first = next_packet(&peer).await;
            let second = next_packet(&peer).await;
            assert_eq!(first.payload.len() + second.payload.len(), 2 * PAYLOAD);
            ack(&peer, 1).await;
            peer
        });

        assert_eq!(session.send(&[7u8; 35]).await.unwrap(), 2 * PAYLOAD);
        assert_eq!(session.seq_send(), 2);
        let _peer = peer_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_message_sends_nothing() {
        let (a, peer) = MemoryChannel::pair();
        let mut session = Session::new(a, config(2)).unwrap();

        assert_eq!(session.send(&[]).await.unwrap(), 0);
        assert_eq!(session.seq_send(), 0);

        let mut buf = [0u8; 64];
        assert!(
            tokio::time::timeout(Duration::from_millis(30), peer.recv(&mut buf))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_timeout_retransmits_only_unacked() {
        let (a, peer) = MemoryChannel::pair();
        let slow_timer = Config {
            timeout_ms: 100,
            ..config(4)
        };
        let mut session = Session::new(a, slow_timer).unwrap();

        let peer_task = tokio::spawn(async move {
            // 최초 전송 4개, seq 1은 잃어버린 것으로 간주
            for expected in 0..4u8 {
                assert_eq!(next_packet(&peer).await.seq, expected);
            }
            ack(&peer, 0).await;

            // 타임아웃 후 재전송은 seq 1부터, seq 0은 다시 오지 않음
            let mut resent = Vec::new();
            for _ in 0..3 {
                resent.push(next_packet(&peer).await.seq);
            }
            ack(&peer, 3).await;
            (peer, resent)
        });

        assert_eq!(session.send(&[1u8; 4 * PAYLOAD]).await.unwrap(), 4 * PAYLOAD);
        let (_peer, resent) = peer_task.await.unwrap();

        assert_eq!(resent, vec![1, 2, 3]);
        assert!(session.stats().timeouts >= 1);
        assert!(session.stats().retransmitted >= 3);
        // 재전송이 있어도 seq 카운터는 패킷 수만큼만 전진
        assert_eq!(session.seq_send(), 4);
    }

    #[tokio::test]
    async fn test_stale_and_corrupted_acks_are_ignored() {
        let (a, peer) = MemoryChannel::pair();
        let mut session = Session::new(a, config(2)).unwrap();

        let peer_task = tokio::spawn(async move {
            next_packet(&peer).await;
            next_packet(&peer).await;

            ack(&peer, 200).await;
            let mut corrupted = Packet::ack(1).encode().to_vec();
            corrupted[1] ^= 0x40;
            peer.send(&corrupted).await.unwrap();

            ack(&peer, 1).await;
            peer
        });

        assert_eq!(session.send(&[0u8; 15]).await.unwrap(), 15);
        let _peer = peer_task.await.unwrap();
        assert_eq!(session.stats().stale_acks, 1);
        assert_eq!(session.stats().corrupted, 1);
    }

    #[tokio::test]
    async fn test_sequence_wraparound() {
        let (a, peer) = MemoryChannel::pair();
        let mut session = Session::new(a, config(4)).unwrap();
        session.seq_send = 254;

        let peer_task = tokio::spawn(async move {
            let mut seqs = Vec::new();
            for _ in 0..4 {
                seqs.push(next_packet(&peer).await.seq);
            }
            // 255까지 누적 ACK 후 마지막 ACK
            ack(&peer, 255).await;
            ack(&peer, 1).await;
            (peer, seqs)
        });

        assert_eq!(session.send(&[9u8; 4 * PAYLOAD]).await.unwrap(), 4 * PAYLOAD);
        let (_peer, seqs) = peer_task.await.unwrap();
        assert_eq!(seqs, vec![254, 255, 0, 1]);
        assert_eq!(session.seq_send(), 2);
        assert_eq!(session.stats().acks_received, 2);
    }

    #[tokio::test]
    async fn test_duplicate_data_mid_send_is_reacked() {
        let (a, peer) = MemoryChannel::pair();
        let mut session = Session::new(a, config(1)).unwrap();
        session.seq_recv = 5;

        let peer_task = tokio::spawn(async move {
            assert_eq!(next_packet(&peer).await.seq, 0);

            // 이미 받은 seq 4의 재전송 -> seq 4 재ACK
            peer.send(&Packet::data(4, Bytes::from_static(b"old")).encode())
                .await
                .unwrap();
            loop {
                let packet = next_packet(&peer).await;
                if packet.kind == PacketType::Ack {
                    assert_eq!(packet.seq, 4);
                    break;
                }
            }

            // 기대하던 seq 5의 새 DATA는 ACK 없이 폐기
            peer.send(&Packet::data(5, Bytes::from_static(b"new")).encode())
                .await
                .unwrap();
            ack(&peer, 0).await;
            peer
        });

        assert_eq!(session.send(b"hi").await.unwrap(), 2);
        let _peer = peer_task.await.unwrap();
        assert_eq!(session.seq_recv(), 5);
        assert_eq!(session.stats().acks_sent, 1);
    }

    #[tokio::test]
    async fn test_channel_error_aborts_send() {
        let (a, peer) = MemoryChannel::pair();
        let mut session = Session::new(a, config(2)).unwrap();
        drop(peer);

        assert!(matches!(
            session.send(b"lost").await,
            Err(Error::ConnectionClosed)
        ));
    }
}
