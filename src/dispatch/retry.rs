// ==========================================
// 待打包订单发运系统 - 重试策略
// ==========================================
// 指数退避: delay(n) = initial * 2^(n-1)，上限 max_delay
// 只重试 CarrierError::is_retryable() 为 true 的错误
// ==========================================

use crate::config::RetrySettings;
use crate::dispatch::error::CarrierError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// 重试后的调用结果
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T, CarrierError>,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: max_delay.max(initial_delay),
        }
    }

    /// 第 retry 次重试前的等待时间（retry 从 1 开始）
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// 执行操作，按策略重试
    pub async fn run<T, F, Fut>(&self, referencia: &str, mut operation: F) -> Attempted<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CarrierError>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        referencia = %referencia,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "承运商调用失败，准备重试"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Attempted {
                        result: Err(err),
                        attempts: attempt,
                    }
                }
            }
        }
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self::new(settings.max_attempts, settings.initial_delay, settings.max_delay)
    }
}
