//! 等待输出文件
//!
//! 设备的输出调用返回时文件可能还没写出来，需要轮询文件是否存在。
//! 时间源通过 [`Clock`] 注入，测试时不必真的等待。

use crate::error::JobFailure;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 默认超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 时间源
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// 取消标记，可以跨线程共享
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 轮询参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WaitPolicy {
    /// 等待文件出现
    ///
    /// 超时返回 `RenderTimeout`；等待期间被取消返回 `Cancelled`。
    pub fn wait_for_file<C: Clock + ?Sized>(
        &self,
        path: &Path,
        clock: &C,
        cancel: &CancelToken,
    ) -> Result<(), JobFailure> {
        let start = clock.now();

        loop {
            if path.exists() {
                return Ok(());
            }
            if cancel.is_cancelled() {
                return Err(JobFailure::Cancelled);
            }
            let elapsed = clock.now().duration_since(start);
            if elapsed >= self.timeout {
                return Err(JobFailure::RenderTimeout {
                    path: path.to_path_buf(),
                    timeout: self.timeout,
                });
            }
            // 最后一次等待不超过剩余时间
            clock.sleep(self.interval.min(self.timeout - elapsed));
        }
    }
}
