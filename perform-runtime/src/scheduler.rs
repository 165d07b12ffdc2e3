//! # Scheduler 模块
//!
//! 每帧回调的注册表：key → ticker。
//!
//! 渲染循环每帧调用一次 [`TickScheduler::tick`]，传入以 1/60 秒为单位的帧增量；
//! 每个已注册的 ticker 被调用且仅被调用一次。ticker 之间的调用顺序不作保证。
//!
//! ticker 通过返回 [`TickControl::Remove`] 注销自己，注销在本次 `tick` 返回前生效。

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::{PerformError, PerformResult};

/// 帧增量单位：1 帧 = 1/60 秒
pub const FRAME_RATE: f32 = 60.0;

/// 帧增量换算为秒
pub fn frames_to_seconds(delta_frames: f32) -> f32 {
    delta_frames / FRAME_RATE
}

/// ticker 的返回值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    /// 继续接收后续帧
    Continue,
    /// 注销自己
    Remove,
}

/// 每帧回调
pub trait Ticker {
    /// 推进一帧
    fn tick(&mut self, delta_frames: f32) -> TickControl;

    /// 被外部取消时调用（在注销之前）
    fn cancel(&mut self) {}
}

impl<F> Ticker for F
where
    F: FnMut(f32) -> TickControl,
{
    fn tick(&mut self, delta_frames: f32) -> TickControl {
        self(delta_frames)
    }
}

/// 帧回调调度器
#[derive(Default)]
pub struct TickScheduler {
    tickers: HashMap<String, Box<dyn Ticker>>,
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("tickers", &self.tickers.len())
            .finish()
    }
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 ticker
    ///
    /// key 已被占用时返回 `DuplicateKey`，原有 ticker 不受影响。
    pub fn register_tick(
        &mut self,
        key: impl Into<String>,
        ticker: Box<dyn Ticker>,
    ) -> PerformResult<()> {
        let key = key.into();
        if self.tickers.contains_key(&key) {
            return Err(PerformError::DuplicateKey { key });
        }
        debug!(key = %key, "注册 ticker");
        self.tickers.insert(key, ticker);
        Ok(())
    }

    /// 注销 ticker，返回是否存在
    ///
    /// 注销前调用其 `cancel`，表演实例借此执行收尾。
    pub fn unregister_tick(&mut self, key: &str) -> bool {
        match self.tickers.remove(key) {
            Some(mut ticker) => {
                ticker.cancel();
                debug!(key = %key, "注销 ticker");
                true
            }
            None => false,
        }
    }

    /// 取消 ticker，等同于 [`unregister_tick`](Self::unregister_tick)
    pub fn cancel(&mut self, key: &str) -> bool {
        self.unregister_tick(key)
    }

    /// 推进一帧
    ///
    /// # 返回
    /// 本帧内自行注销的 key 列表
    pub fn tick(&mut self, delta_frames: f32) -> Vec<String> {
        let mut finished = Vec::new();

        for (key, ticker) in &mut self.tickers {
            if ticker.tick(delta_frames) == TickControl::Remove {
                finished.push(key.clone());
            }
        }

        for key in &finished {
            self.tickers.remove(key);
            trace!(key = %key, "ticker 自行注销");
        }

        finished
    }

    /// 是否已注册
    pub fn is_registered(&self, key: &str) -> bool {
        self.tickers.contains_key(key)
    }

    /// 已注册数量
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// 全部 key（已排序）
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.tickers.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// 取消并清空全部 ticker
    pub fn clear(&mut self) {
        for (key, mut ticker) in self.tickers.drain() {
            ticker.cancel();
            trace!(key = %key, "清空时取消 ticker");
        }
    }
}
