//! 인터넷 체크섬 (RFC 1071)
//!
//! 16비트 빅엔디안 워드 단위로 더하고 캐리를 접은 뒤 1의 보수를 취한다.
//! 홀수 길이면 마지막 바이트 오른쪽에 0을 채운다.

/// 체크섬 계산
///
/// 체크섬 필드가 포함된 버퍼라면 호출 전에 해당 필드를 0으로 채워야 한다.
pub fn compute(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = words.remainder() {
        sum += u32::from(*last) << 8;
    }

    // 캐리 접기
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    !(sum as u16)
}

/// 체크섬 검증 (`data`의 체크섬 필드는 0이어야 함)
pub fn verify(data: &[u8], expected: u16) -> bool {
    compute(data) == expected
}
