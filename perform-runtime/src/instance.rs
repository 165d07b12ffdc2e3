//! # Instance 模块
//!
//! 表演实例：一次表演调用的运行时状态。
//!
//! ## 生命周期
//!
//! ```text
//! Spawning → Running → Completing → Detached
//! ```
//!
//! - `Spawning`：创建节点、插入场景层、同步应用 `elapsed = 0` 的状态
//! - `Running`：每帧累加时间，经 kernel 计算后写回节点
//! - `Completing`：越过总时长（或被取消）时执行一次收尾：透明度清零、按需隐藏容器
//! - `Detached`：终态，不再参与调度
//!
//! 实例从不把节点移出场景层，只负责隐藏并停止更新。

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::{PerformError, PerformResult};
use crate::kernel::{compute_visual_state, is_finished};
use crate::resolver::ResolvedPerform;
use crate::scene::{ContainerNode, ContainerRef, NodeRef, RenderNode, SceneContext};
use crate::scheduler::{TickControl, TickScheduler, Ticker, frames_to_seconds};

/// 实例状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerformState {
    /// 正在创建节点
    #[default]
    Spawning,
    /// 正在播放
    Running,
    /// 正在执行收尾
    Completing,
    /// 已脱离调度
    Detached,
}

impl PerformState {
    /// 是否仍需接收帧更新
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// 表演句柄
///
/// 调用方可以借此引用容器或按 key 取消表演；通常直接丢弃，等待表演自行结束。
#[derive(Debug, Clone)]
pub struct EffectHandle {
    pub container: ContainerRef,
    pub registry_key: String,
}

/// 表演实例
#[derive(Debug)]
pub struct PerformInstance {
    key: String,
    perform: Rc<ResolvedPerform>,
    elapsed: f32,
    container: ContainerRef,
    nodes: Vec<NodeRef>,
    state: PerformState,
}

impl PerformInstance {
    /// 创建实例并挂到场景层（不注册 ticker）
    ///
    /// 返回时已处于 `Running`，节点已应用初始状态。
    pub fn new(perform: Rc<ResolvedPerform>, key: impl Into<String>, ctx: &mut SceneContext) -> Self {
        let key = key.into();
        let container: ContainerRef = Rc::new(RefCell::new(ContainerNode::new()));

        let nodes: Vec<NodeRef> = perform
            .layers
            .iter()
            .map(|layer| {
                let mut node = match ctx.nodes.create_node(&layer.texture) {
                    Ok(node) => node,
                    Err(e) => {
                        // 纹理缺失不影响流程，用占位节点顶上
                        warn!(
                            perform = %perform.name,
                            layer = %layer.name,
                            error = %e,
                            "纹理缺失，使用占位节点"
                        );
                        RenderNode::placeholder()
                    }
                };
                node.scale = layer.scale;
                Rc::new(RefCell::new(node))
            })
            .collect();

        container.borrow_mut().children = nodes.clone();
        ctx.layer_mut(perform.layer).insert(container.clone());

        let mut instance = Self {
            key,
            perform,
            elapsed: 0.0,
            container,
            nodes,
            state: PerformState::Spawning,
        };
        instance.apply();
        instance.state = PerformState::Running;

        debug!(
            perform = %instance.perform.name,
            key = %instance.key,
            layer = %instance.perform.layer,
            "表演开始"
        );
        instance
    }

    /// 创建实例并注册到调度器
    ///
    /// key 冲突时在创建任何节点之前失败。
    pub fn spawn(
        perform: Rc<ResolvedPerform>,
        key: impl Into<String>,
        ctx: &mut SceneContext,
        scheduler: &mut TickScheduler,
    ) -> PerformResult<EffectHandle> {
        let key = key.into();
        if scheduler.is_registered(&key) {
            return Err(PerformError::DuplicateKey { key });
        }

        let layer = perform.layer;
        let instance = Self::new(perform, key.clone(), ctx);
        let handle = instance.handle();

        if let Err(e) = scheduler.register_tick(key, Box::new(instance)) {
            ctx.layer_mut(layer).remove(&handle.container);
            return Err(e);
        }
        Ok(handle)
    }

    /// 句柄
    pub fn handle(&self) -> EffectHandle {
        EffectHandle {
            container: self.container.clone(),
            registry_key: self.key.clone(),
        }
    }

    /// 推进一帧
    pub fn advance(&mut self, delta_frames: f32) -> TickControl {
        if !self.state.is_active() {
            return TickControl::Remove;
        }

        let dt = frames_to_seconds(delta_frames);
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }

        self.apply();

        if is_finished(self.elapsed, &self.perform) {
            self.complete();
            return TickControl::Remove;
        }
        TickControl::Continue
    }

    /// 取消：立即从 `Running` 进入收尾
    pub fn cancel(&mut self) {
        if self.state.is_active() {
            debug!(key = %self.key, elapsed = self.elapsed, "表演被取消");
            self.complete();
        }
    }

    /// 收尾：透明度清零，按需隐藏容器
    ///
    /// kernel 在终点已经给出 0，这里仍然强制清零一次，避免最后一帧残留。
    fn complete(&mut self) {
        self.state = PerformState::Completing;

        for node in &self.nodes {
            node.borrow_mut().opacity = 0.0;
        }
        if self.perform.hide_on_complete {
            self.container.borrow_mut().visible = false;
        }

        self.state = PerformState::Detached;
        debug!(perform = %self.perform.name, key = %self.key, "表演结束");
    }

    /// 把当前时刻的视觉状态写回节点
    fn apply(&self) {
        let states = compute_visual_state(self.elapsed, &self.perform);
        for (node, state) in self.nodes.iter().zip(states) {
            let mut node = node.borrow_mut();
            node.opacity = state.opacity;
            node.position = state.position;
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> PerformState {
        self.state
    }

    /// 已经过的时间（秒）
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    pub fn perform(&self) -> &ResolvedPerform {
        &self.perform
    }
}

impl Ticker for PerformInstance {
    fn tick(&mut self, delta_frames: f32) -> TickControl {
        self.advance(delta_frames)
    }

    fn cancel(&mut self) {
        PerformInstance::cancel(self);
    }
}
