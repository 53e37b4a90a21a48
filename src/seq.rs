//! 8비트 seq 번호 구간 연산
//!
//! 송신자와 수신자가 "이 seq가 현재 윈도우 안에 있는가"를 판단할 때 쓰는 유일한 기준.
//! 윈도우 크기 W가 seq 공간(256)보다 작다는 가정 위에서 랩어라운드를 감지한다.

use crate::SEQ_SPACE;

/// `x`가 mod 256 순환 구간 `[start, end]` (양끝 포함) 안에 있는지 검사
///
/// `end < start`이면 구간이 랩어라운드한 것으로 보고 `end`에 256을 더한다.
/// 이때 `x <= start + W - 256`인 작은 값은 "방금 랩어라운드한" 값으로 보고 256을 더한다.
pub fn in_window(x: u8, start: u8, end: u8, window: u8) -> bool {
    let space = i32::from(SEQ_SPACE);
    let start = i32::from(start);
    let mut end = i32::from(end);
    let mut x = i32::from(x);

    if end < start {
        end += space;
        if x <= start + i32::from(window) - space {
            x += space;
        }
    }

    start <= x && x <= end
}

/// 직전 seq (0의 직전은 255)
#[inline]
pub fn prev(seq: u8) -> u8 {
    seq.wrapping_sub(1)
}

/// 다음 seq (255의 다음은 0)
#[inline]
pub fn next(seq: u8) -> u8 {
    seq.wrapping_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agrees_with_plain_range_when_not_wrapped() {
        for window in [1u8, 2, 4, 64, 128] {
            for start in (0..=255u8).step_by(7) {
                for end in (start..=255u8).step_by(5) {
                    for x in 0..=255u8 {
                        assert_eq!(
                            in_window(x, start, end, window),
                            start <= x && x <= end,
                            "W={} start={} end={} x={}",
                            window,
                            start,
                            end,
                            x
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_wrapped_range() {
        // 250 ~ 3, W = 10
        for x in 250..=255u8 {
            assert!(in_window(x, 250, 3, 10));
        }
        for x in 0..=3u8 {
            assert!(in_window(x, 250, 3, 10));
        }
        assert!(!in_window(4, 250, 3, 10));
        assert!(!in_window(100, 250, 3, 10));
        assert!(!in_window(249, 250, 3, 10));
    }

    #[test]
    fn test_wrapped_range_every_window_size() {
        // 길이가 W인 구간이 255를 넘어가는 모든 경우
        for window in 2..=128u8 {
            for offset in 1..window {
                let start = 255 - (offset - 1);
                let end = start.wrapping_add(window - 1);
                assert!(end < start);

                for i in 0..window {
                    assert!(in_window(start.wrapping_add(i), start, end, window));
                }
                assert!(!in_window(start.wrapping_sub(1), start, end, window));
                assert!(!in_window(end.wrapping_add(1), start, end, window));
            }
        }
    }

    #[test]
    fn test_single_point() {
        assert!(in_window(9, 9, 9, 1));
        assert!(!in_window(10, 9, 9, 1));
        assert!(!in_window(8, 9, 9, 1));
    }

    #[test]
    fn test_prev_next_wrap() {
        assert_eq!(prev(0), 255);
        assert_eq!(next(255), 0);
        assert_eq!(prev(next(17)), 17);
    }
}
