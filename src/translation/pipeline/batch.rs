//! 翻译批次调度器模块
//!
//! 按固定节奏从翻译队列取出请求并发给远程客户端。
//!
//! ## 调度规则
//!
//! - **单飞**: 一个批次周期进行中时，`drain()` 直接返回
//! - **批次大小**: 每个周期最多取出 5 条最早的请求
//! - **节奏**: 批次发出后等待 1 秒，清除单飞标记并再次 `drain()`
//! - **不等待结果**: 每条请求单独发出，完成顺序不定；失败的请求直接丢弃
//!
//! 单飞标记只防止周期重叠，同一时间最多有一个批次（5 条）的请求在途，
//! 上一批次的慢请求可能和下一批次重叠。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let local = tokio::task::LocalSet::new();
//! local
//!     .run_until(async {
//!         let dispatcher = BatchDispatcher::new(queue.clone(), client.clone());
//!         dispatcher.drain();
//!         dispatcher.wait_idle().await;
//!         println!("{:?}", dispatcher.stats());
//!     })
//!     .await;
//! ```
//!
//! `drain()` 通过 `tokio::task::spawn_local` 派发任务，必须在 `LocalSet` 中调用。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::sync::Notify;

use super::queue::{TranslationQueue, TranslationRequest};
use crate::translation::client::{PatchOutcome, RemoteTranslationClient};
use crate::translation::config::constants;
use crate::translation::error::TranslationResult;

/// 调度统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// 已开始的批次周期
    pub batches: usize,
    /// 已发出的请求
    pub dispatched: usize,
    /// 直接修补成功
    pub patched_direct: usize,
    /// 按内容匹配修补（含匹配数为 0 的情况）
    pub patched_by_content: usize,
    /// 传输失败或后端拒绝
    pub failed: usize,
}

pub struct BatchDispatcher {
    queue: Rc<TranslationQueue>,
    client: Rc<RemoteTranslationClient>,
    in_flight: Cell<bool>,
    outstanding: Cell<usize>,
    stats: RefCell<DispatchStats>,
    idle: Notify,
}

impl BatchDispatcher {
    pub fn new(queue: Rc<TranslationQueue>, client: Rc<RemoteTranslationClient>) -> Rc<Self> {
        Rc::new(Self {
            queue,
            client,
            in_flight: Cell::new(false),
            outstanding: Cell::new(0),
            stats: RefCell::new(DispatchStats::default()),
            idle: Notify::new(),
        })
    }

    /// 开始一个批次周期，返回本次发出的请求数
    pub fn drain(self: &Rc<Self>) -> usize {
        if self.in_flight.get() || self.queue.is_empty() {
            return 0;
        }

        self.in_flight.set(true);
        let batch = self.queue.take_batch(constants::BATCH_SIZE);
        let count = batch.len();

        {
            let mut stats = self.stats.borrow_mut();
            stats.batches += 1;
            stats.dispatched += count;
        }
        tracing::debug!("发出翻译批次: {} 条，剩余 {} 条", count, self.queue.len());

        for request in batch {
            self.spawn_request(request);
        }

        let this = Rc::clone(self);
        tokio::task::spawn_local(async move {
            tokio::time::sleep(constants::BATCH_INTERVAL).await;
            this.in_flight.set(false);
            this.drain();
            this.notify_if_idle();
        });

        count
    }

    fn spawn_request(self: &Rc<Self>, request: TranslationRequest) {
        self.outstanding.set(self.outstanding.get() + 1);

        let this = Rc::clone(self);
        tokio::task::spawn_local(async move {
            let content = request.content.clone();
            let result = this.client.translate(request).await;
            this.record(&content, result);
            this.outstanding.set(this.outstanding.get() - 1);
            this.notify_if_idle();
        });
    }

    fn record(&self, content: &str, result: TranslationResult<PatchOutcome>) {
        let mut stats = self.stats.borrow_mut();
        match result {
            Ok(PatchOutcome::Direct) => stats.patched_direct += 1,
            Ok(PatchOutcome::ContentMatch(matched)) => {
                stats.patched_by_content += 1;
                tracing::trace!("内容匹配替换 {} 处: {:?}", matched, content);
            }
            Err(e) => {
                stats.failed += 1;
                tracing::debug!("翻译失败，已丢弃 {:?}: {}", content, e);
            }
        }
    }

    /// 是否有批次周期在进行
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    /// 尚未完成的请求数
    pub fn outstanding(&self) -> usize {
        self.outstanding.get()
    }

    pub fn is_idle(&self) -> bool {
        !self.in_flight.get() && self.outstanding.get() == 0
    }

    /// 等到没有周期进行、也没有请求在途。
    /// 观察器入队但未调度的请求不算在内。
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    pub fn stats(&self) -> DispatchStats {
        *self.stats.borrow()
    }

    fn notify_if_idle(&self) {
        if self.is_idle() {
            self.idle.notify_waiters();
        }
    }
}
