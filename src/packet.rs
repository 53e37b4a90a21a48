//! 패킷 정의 및 와이어 포맷
//!
//! ```text
//!  0               1               2               3
//! +---------------+---------------+-------------------------------+
//! |     Type      |      Seq      |           Checksum            |
//! +---------------+---------------+-------------------------------+
//! |        Payload Length         |          Payload ...          |
//! +-------------------------------+-------------------------------+
//! ```
//!
//! 체크섬 슬롯을 0으로 둔 채 전체 패킷(헤더 + 페이로드)에 대해 체크섬을 계산하고
//! 그 값을 슬롯에 채워 넣는다. 모든 다중 바이트 필드는 빅엔디안.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::checksum;

/// 고정 헤더 길이 (바이트)
pub const HEADER_LEN: usize = 6;

// 헤더 필드 오프셋
const OFF_TYPE: usize = 0;
const OFF_SEQ: usize = 1;
const OFF_CHECKSUM: usize = 2;
const OFF_PAYLOAD_LEN: usize = 4;

/// 패킷 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// 누적 ACK
    Ack = 11,

    /// 애플리케이션 데이터
    Data = 12,
}

impl TryFrom<u8> for PacketType {
    type Error = PacketError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            11 => Ok(Self::Ack),
            12 => Ok(Self::Data),
            other => Err(PacketError::UnknownType(other)),
        }
    }
}

/// 패킷 디코딩 에러
///
/// 어떤 경우든 호출자는 패킷을 조용히 버린다.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PacketError {
    #[error("헤더보다 짧은 패킷: {len} bytes")]
    TooShort { len: usize },

    #[error("페이로드 길이 불일치: declared {declared}, actual {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("알 수 없는 패킷 타입: {0}")]
    UnknownType(u8),

    #[error("체크섬 불일치: expected {expected:04X}, got {computed:04X}")]
    ChecksumMismatch { expected: u16, computed: u16 },
}

/// RDT 패킷 (불변 와이어 레코드)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketType,
    pub seq: u8,
    pub payload: Bytes,
}

impl Packet {
    /// DATA 패킷 생성
    pub fn data(seq: u8, payload: Bytes) -> Self {
        Self {
            kind: PacketType::Data,
            seq,
            payload,
        }
    }

    /// ACK 패킷 생성 (페이로드 없음)
    pub fn ack(seq: u8) -> Self {
        Self {
            kind: PacketType::Ack,
            seq,
            payload: Bytes::new(),
        }
    }

    pub fn is_data(&self) -> bool {
        self.kind == PacketType::Data
    }

    /// 바이트로 직렬화
    ///
    /// 페이로드는 설정 검증에서 16비트 길이 필드 안으로 제한된다.
    pub fn encode(&self) -> Bytes {
        debug_assert!(
            self.payload.len() <= u16::MAX as usize,
            "페이로드가 길이 필드를 넘음: {} bytes",
            self.payload.len()
        );
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload.len());
        buf.put_u8(self.kind as u8);
        buf.put_u8(self.seq);
        buf.put_u16(0); // 체크섬 자리
        buf.put_u16(self.payload.len() as u16);
        buf.put_slice(&self.payload);

        let sum = checksum::compute(&buf);
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&sum.to_be_bytes());
        buf.freeze()
    }

    /// 바이트에서 역직렬화 및 체크섬 검증
    pub fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < HEADER_LEN {
            return Err(PacketError::TooShort { len: bytes.len() });
        }

        let expected = u16::from_be_bytes([bytes[OFF_CHECKSUM], bytes[OFF_CHECKSUM + 1]]);

        // 체크섬 슬롯을 0으로 만든 사본으로 재계산
        let mut scratch = bytes.to_vec();
        scratch[OFF_CHECKSUM..OFF_CHECKSUM + 2].fill(0);
        let computed = checksum::compute(&scratch);
        if computed != expected {
            return Err(PacketError::ChecksumMismatch { expected, computed });
        }

        let kind = PacketType::try_from(bytes[OFF_TYPE])?;
        let declared =
            u16::from_be_bytes([bytes[OFF_PAYLOAD_LEN], bytes[OFF_PAYLOAD_LEN + 1]]) as usize;
        let actual = bytes.len() - HEADER_LEN;
        if declared != actual {
            return Err(PacketError::LengthMismatch { declared, actual });
        }

        Ok(Self {
            kind,
            seq: bytes[OFF_SEQ],
            payload: Bytes::copy_from_slice(&bytes[HEADER_LEN..]),
        })
    }
}
