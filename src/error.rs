//! 에러 타입 정의

use thiserror::Error;

/// RDT 프로토콜 에러 타입
///
/// 손상 패킷이나 윈도우 밖 ACK 같은 프로토콜 이상은 엔진 내부에서 복구되므로
/// 여기에 나타나지 않는다. 호출자에게 보이는 실패는 채널 에러뿐이다.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("피어 주소가 설정되지 않음")]
    PeerNotSet,

    #[error("연결 종료")]
    ConnectionClosed,

    #[error("잘못된 길이 헤더: {len} bytes")]
    InvalidLengthHeader { len: usize },

    #[error("패킷 페이로드가 길이 헤더보다 작음: {payload_size} bytes")]
    PayloadTooSmall { payload_size: usize },

    #[error("유효하지 않은 설정: {field} = {value}")]
    InvalidConfig { field: &'static str, value: String },
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
