//! 定时任务调度
//!
//! 统一管理防抖任务和周期任务，按 key 取消。
//!
//! # 任务类型
//!
//! - [`TaskKind::Debounced`] - 延迟执行一次；同 key 重新调度会取消旧任务
//! - [`TaskKind::Repeating`] - 周期执行，直到取消
//!
//! Scheduling under a key that is already taken always cancels the previous
//! task first, so at most one task per key is pending.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures::FutureExt;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// 延迟执行一次
    Debounced,
    /// 周期执行
    Repeating,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Debounced => write!(f, "Debounced"),
            TaskKind::Repeating => write!(f, "Repeating"),
        }
    }
}

/// 已调度的任务
struct ScheduledTask {
    kind: TaskKind,
    generation: u64,
    token: CancellationToken,
}

struct SchedulerInner {
    tasks: DashMap<String, ScheduledTask>,
    /// 全局取消令牌
    shutdown: CancellationToken,
    generation: AtomicU64,
}

/// 任务调度器
///
/// # 使用示例
///
/// ```ignore
/// let scheduler = Scheduler::new();
///
/// // 500ms 内重复调度只会执行最后一次
/// scheduler.schedule_debounced("order-sync:T1", Duration::from_millis(500), || async {
///     // 写入远程
/// });
///
/// scheduler.schedule_repeating("poll:orders", Duration::from_secs(5), true, || async {
///     // 拉取订单
/// });
///
/// scheduler.cancel("poll:orders");
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                tasks: DashMap::new(),
                shutdown: CancellationToken::new(),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// 注册任务，返回 (generation, token)
    fn register(&self, key: &str, kind: TaskKind) -> (u64, CancellationToken) {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = self.inner.shutdown.child_token();
        let previous = self.inner.tasks.insert(
            key.to_string(),
            ScheduledTask {
                kind,
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
            tracing::trace!(task = %key, kind = %previous.kind, "Superseded scheduled task");
        }
        (generation, token)
    }

    /// 延迟 `delay` 后执行 `action`；同 key 的待执行任务被取消
    pub fn schedule_debounced<F, Fut>(&self, key: impl Into<String>, delay: Duration, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        let (generation, token) = self.register(&key, TaskKind::Debounced);
        let inner = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            // Fired: the slot is free for the next schedule under this key
            if let Some(inner) = inner.upgrade() {
                inner
                    .tasks
                    .remove_if(&key, |_, task| task.generation == generation);
            }
            run_guarded(&key, TaskKind::Debounced, action()).await;
        });
    }

    /// 每 `period` 执行一次 `action`，`immediate` 时立即先执行一次
    ///
    /// Runs never overlap: the next tick waits for the previous run.
    pub fn schedule_repeating<F, Fut>(
        &self,
        key: impl Into<String>,
        period: Duration,
        immediate: bool,
        mut action: F,
    ) where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        let (_, token) = self.register(&key, TaskKind::Repeating);

        tokio::spawn(async move {
            let start = if immediate {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = run_guarded(&key, TaskKind::Repeating, action()) => {}
                }
            }
            tracing::trace!(task = %key, "Repeating task stopped");
        });
    }

    /// 取消 key 对应的任务；返回是否有任务被取消
    pub fn cancel(&self, key: &str) -> bool {
        match self.inner.tasks.remove(key) {
            Some((_, task)) => {
                task.token.cancel();
                true
            }
            None => false,
        }
    }

    /// key 是否有待执行/运行中的任务
    pub fn is_scheduled(&self, key: &str) -> bool {
        self.inner.tasks.contains_key(key)
    }

    /// 已调度任务数量
    pub fn len(&self) -> usize {
        self.inner.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tasks.is_empty()
    }

    /// 取消所有任务；之后的调度请求被忽略
    pub fn shutdown(&self) {
        tracing::info!("Cancelling {} scheduled tasks", self.inner.tasks.len());
        self.inner.shutdown.cancel();
        self.inner.tasks.clear();
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// 执行任务并捕获 panic
async fn run_guarded<Fut>(key: &str, kind: TaskKind, future: Fut)
where
    Fut: Future<Output = ()> + Send,
{
    if let Err(panic_info) = AssertUnwindSafe(future).catch_unwind().await {
        let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = panic_info.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        tracing::error!(
            task = %key,
            kind = %kind,
            panic = %panic_msg,
            "Scheduled task panicked! This is a bug that should be reported."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_debounce_runs_last_action_once() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));

        for i in 1..=5 {
            let hits = hits.clone();
            let last = last.clone();
            scheduler.schedule_debounced("k", Duration::from_millis(500), move || async move {
                hits.fetch_add(1, Ordering::SeqCst);
                last.store(i, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(scheduler.is_scheduled("k"));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 5);
        assert!(!scheduler.is_scheduled("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_run() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        scheduler.schedule_debounced("k", Duration::from_millis(500), move || async move {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert!(scheduler.cancel("k"));
        assert!(!scheduler.cancel("k"));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_until_cancelled() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        scheduler.schedule_repeating("poll", Duration::from_secs(5), true, move || {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
            }
        });

        // immediate run + runs at 5s and 10s
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        scheduler.cancel("poll");
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_task_is_contained() {
        let scheduler = Scheduler::new();
        scheduler.schedule_debounced("boom", Duration::from_millis(10), || async {
            panic!("boom");
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        scheduler.schedule_debounced("boom", Duration::from_millis(10), move || async move {
            h.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_everything() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        scheduler.schedule_repeating("poll", Duration::from_secs(1), false, move || {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
            }
        });
        scheduler.shutdown();
        assert!(scheduler.is_empty());

        let h = hits.clone();
        scheduler.schedule_debounced("late", Duration::from_millis(1), move || async move {
            h.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
