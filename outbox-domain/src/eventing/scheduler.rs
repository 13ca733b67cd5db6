//! 调度（Scheduler）
//!
//! 爬取器的两个自调度循环：“新事件”与“失败重试”。每个循环的形态都是
//! “执行任务并等待完成 → 固定延迟 → 下一次”，因此同一循环的两次运行永不重叠；
//! 两个循环彼此独立，任务失败或 panic 只记录日志，不影响后续调度。
//!
use super::CrawlReport;
use crate::error::DomainResult;
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 新事件循环的默认周期
pub const DEFAULT_CRAWLING_PERIOD: Duration = Duration::from_secs(10);
/// 重试循环的固定周期
pub const RETRY_PERIOD: Duration = Duration::from_secs(90);

/// 调度策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchedulingPolicy {
    /// 不自动循环，由调用方手动触发（测试/运维）
    #[default]
    Manual,
    /// 两个独立的周期循环
    Periodic {
        new_events_period: Duration,
        retry_period: Duration,
    },
}

impl SchedulingPolicy {
    /// 以给定周期运行新事件循环，重试循环使用固定的 `RETRY_PERIOD`
    pub fn periodic(crawling_period: Duration) -> Self {
        SchedulingPolicy::Periodic {
            new_events_period: crawling_period,
            retry_period: RETRY_PERIOD,
        }
    }
}

/// 爬取器运行句柄：用于停止与等待循环结束；丢弃句柄即取消循环
pub struct CrawlerHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl CrawlerHandle {
    pub(crate) fn idle() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    pub(crate) fn spawn(f: impl FnOnce(CancellationToken) -> Vec<JoinHandle<()>>) -> Self {
        let token = CancellationToken::new();
        let tasks = f(token.clone());
        Self { token, tasks }
    }

    /// 是否有循环在运行
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && self.tasks.iter().any(|t| !t.is_finished())
    }

    /// 请求停止；进行中的任务会先完成当前这一轮
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub async fn join(mut self) {
        let tasks = std::mem::take(&mut self.tasks);

        for t in tasks {
            let _ = t.await;
        }
    }

    /// `shutdown` 并等待全部循环退出
    pub async fn stop(self) {
        self.shutdown();
        self.join().await;
    }
}

impl Drop for CrawlerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub(crate) fn spawn_loop<F, Fut>(
    token: CancellationToken,
    name: &'static str,
    period: Duration,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = DomainResult<CrawlReport>> + Send + 'static,
{
    tokio::spawn(async move {
        tracing::info!(job = name, period_ms = period.as_millis() as u64, "crawler loop started");

        while !token.is_cancelled() {
            match AssertUnwindSafe(job()).catch_unwind().await {
                Ok(Ok(report)) => {
                    tracing::trace!(job = name, fetched = report.fetched, "crawler job finished");
                }
                Ok(Err(err)) => {
                    tracing::error!(job = name, error = %err, "crawler job failed");
                }
                Err(_) => {
                    tracing::error!(job = name, "crawler job panicked");
                }
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(period) => {}
            }
        }

        tracing::info!(job = name, "crawler loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn periodic_uses_fixed_retry_period() {
        assert_eq!(
            SchedulingPolicy::periodic(Duration::from_secs(3)),
            SchedulingPolicy::Periodic {
                new_events_period: Duration::from_secs(3),
                retry_period: RETRY_PERIOD,
            }
        );
        assert_eq!(SchedulingPolicy::default(), SchedulingPolicy::Manual);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_never_overlaps_itself_and_survives_failures() {
        let runs = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let handle = {
            let (runs, running, overlaps) = (runs.clone(), running.clone(), overlaps.clone());
            CrawlerHandle::spawn(move |token| {
                vec![spawn_loop(token, "test", Duration::from_secs(10), move || {
                    let (runs, running, overlaps) =
                        (runs.clone(), running.clone(), overlaps.clone());
                    async move {
                        if running.fetch_add(1, Ordering::SeqCst) > 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        // 任务本身比周期更长
                        tokio::time::sleep(Duration::from_secs(25)).await;
                        running.fetch_sub(1, Ordering::SeqCst);

                        let n = runs.fetch_add(1, Ordering::SeqCst);
                        if n % 2 == 0 {
                            Err(DomainError::outbox("connection refused"))
                        } else {
                            Ok(CrawlReport::default())
                        }
                    }
                })]
            })
        };

        // 运行区间：[0,25] [35,60] [70,95] [105,130]
        tokio::time::sleep(Duration::from_secs(131)).await;
        handle.stop().await;

        assert_eq!(runs.load(Ordering::SeqCst), 4);
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_survives_panics() {
        let runs = Arc::new(AtomicUsize::new(0));

        let handle = {
            let runs = runs.clone();
            CrawlerHandle::spawn(move |token| {
                vec![spawn_loop(token, "test", Duration::from_secs(1), move || {
                    let runs = runs.clone();
                    async move {
                        if runs.fetch_add(1, Ordering::SeqCst) == 0 {
                            panic!("first run explodes");
                        }
                        Ok(CrawlReport::default())
                    }
                })]
            })
        };

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(handle.is_running());
        handle.stop().await;

        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn idle_handle_has_no_loops() {
        let handle = CrawlerHandle::idle();
        assert!(!handle.is_running());
        handle.stop().await;
    }
}
