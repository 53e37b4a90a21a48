//! 종료 제어 (TWAIT)
//!
//! `close()`는 곧바로 채널을 닫지 않는다. TWAIT 동안 수신 루프를 계속 돌려
//! 마지막 ACK를 잃어버린 피어의 재전송 DATA에 ACK를 보내고, 그동안 DATA가
//! 하나라도 도착했다면 TWAIT를 다시 연장한다. 조용한 TWAIT가 한 번 지나가면 채널을 해제한다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::channel::Channel;
use crate::session::Session;
use crate::Error;

/// 종료 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseState {
    /// `close()` 호출 전
    NotStarted,

    /// TWAIT 대기 중
    Waiting,

    /// 채널 해제됨 (세션 재사용 불가)
    Closed,
}

impl<C: Channel> Session<C> {
    /// 세션 종료
    ///
    /// 종료가 끝난 뒤의 호출은 아무 일도 하지 않는다. 이전 `close()`가 도중에 취소되어
    /// `Waiting`에 머물러 있다면 TWAIT를 처음부터 다시 돌고 채널을 해제한다.
    pub async fn close(&mut self) -> crate::Result<()> {
        match self.close_state {
            CloseState::Closed => {
                debug!("close() 중복 호출 무시");
                return Ok(());
            }
            CloseState::Waiting => debug!("취소된 종료 대기 재개"),
            CloseState::NotStarted => self.close_state = CloseState::Waiting,
        }

        let activity = Arc::new(AtomicBool::new(false));
        let mut timer = tokio::spawn(time_wait(self.config.twait(), activity.clone()));

        let expired = tokio::select! {
            joined = &mut timer => Some(joined),
            err = self.answer_stragglers(&activity) => {
                debug!("종료 대기 중 수신 중단: {}", err);
                None
            }
        };

        // 수신이 먼저 끝났다면 타이머가 끝날 때까지 대기
        let joined = match expired {
            Some(joined) => joined,
            None => timer.await,
        };
        if let Err(e) = joined {
            warn!("TWAIT 타이머 태스크 실패: {}", e);
        }

        self.channel = None;
        self.close_state = CloseState::Closed;
        info!("세션 종료: {}", self.stats.summary());
        Ok(())
    }

    /// 늦게 도착한 DATA에 계속 ACK
    ///
    /// 채널 에러가 날 때까지 반환하지 않는다.
    async fn answer_stragglers(&mut self, activity: &AtomicBool) -> Error {
        let max_length = self.config.payload_size;
        loop {
            match self.receive_segment(max_length, Some(activity)).await {
                Ok(payload) => {
                    warn!("종료 대기 중 새 DATA 수신, 폐기: {} bytes", payload.len());
                }
                Err(e) => return e,
            }
        }
    }
}

/// TWAIT 타이머 태스크
///
/// TWAIT마다 활동 플래그를 확인해 DATA가 있었으면 다시 대기하고, 없으면 끝난다.
async fn time_wait(twait: Duration, activity: Arc<AtomicBool>) {
    loop {
        tokio::time::sleep(twait).await;
        if !activity.swap(false, Ordering::SeqCst) {
            break;
        }
        debug!("TWAIT 중 DATA 수신, {:?} 연장", twait);
    }
}
