//! # Stage 模块
//!
//! 表演舞台：持有注册表、调度器和场景上下文的门面。
//!
//! 宿主只需要：
//! 1. 启动时 [`PerformStage::new`]
//! 2. 脚本命令触发时 [`PerformStage::perform`]
//! 3. 每帧 [`PerformStage::update`]

use tracing::{debug, info, warn};

use crate::config::PerformConfig;
use crate::error::PerformResult;
use crate::instance::EffectHandle;
use crate::registry::{PerformRegistry, register_all_performs};
use crate::scene::SceneContext;
use crate::scheduler::TickScheduler;

/// 表演舞台
#[derive(Debug)]
pub struct PerformStage {
    registry: PerformRegistry,
    scheduler: TickScheduler,
    scene: SceneContext,
}

impl PerformStage {
    /// 使用无渲染后端的场景创建舞台
    pub fn new(config: &PerformConfig) -> PerformResult<Self> {
        let scene = SceneContext::headless(config.screen);
        Self::with_scene(config, scene)
    }

    /// 使用宿主提供的场景上下文创建舞台
    ///
    /// 注册内置表演（跳过 `disabled` 中的名字），再注册配置中的额外定义。
    /// 任一定义无效则整体失败。
    pub fn with_scene(config: &PerformConfig, scene: SceneContext) -> PerformResult<Self> {
        let mut registry = PerformRegistry::new();
        register_all_performs(&mut registry, &config.screen)?;

        for name in &config.disabled {
            if !registry.unregister(name) {
                warn!(name = %name, "禁用了不存在的内置表演");
            }
        }

        for def in &config.definitions {
            registry.register_definition(def, &config.screen)?;
        }

        info!(performs = registry.len(), "表演舞台初始化完成");
        Ok(Self {
            registry,
            scheduler: TickScheduler::new(),
            scene,
        })
    }

    /// 按名字启动表演
    pub fn perform(&mut self, name: &str) -> PerformResult<EffectHandle> {
        self.registry
            .invoke(name, &mut self.scene, &mut self.scheduler)
    }

    /// 以指定 key 启动表演
    ///
    /// 只适用于由定义注册的表演（内置表演和配置中的额外定义）。
    pub fn perform_with_key(
        &mut self,
        name: &str,
        key: impl Into<String>,
    ) -> PerformResult<EffectHandle> {
        self.registry
            .invoke_with_key(name, key, &mut self.scene, &mut self.scheduler)
    }

    /// 推进一帧
    ///
    /// # 参数
    /// - `delta_frames`: 帧增量（1 = 1/60 秒）
    ///
    /// # 返回
    /// 本帧结束的表演 key
    pub fn update(&mut self, delta_frames: f32) -> Vec<String> {
        let finished = self.scheduler.tick(delta_frames);
        for key in &finished {
            debug!(key = %key, "表演完成");
        }
        finished
    }

    /// 取消表演，返回是否存在
    pub fn cancel(&mut self, key: &str) -> bool {
        self.scheduler.cancel(key)
    }

    /// 表演是否仍在播放
    pub fn is_active(&self, key: &str) -> bool {
        self.scheduler.is_registered(key)
    }

    pub fn active_count(&self) -> usize {
        self.scheduler.len()
    }

    /// 正在播放的表演 key（已排序）
    pub fn active_keys(&self) -> Vec<String> {
        self.scheduler.keys()
    }

    pub fn registry(&self) -> &PerformRegistry {
        &self.registry
    }

    pub fn scene(&self) -> &SceneContext {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneContext {
        &mut self.scene
    }

    /// 取消全部表演
    ///
    /// 场景层中的节点保留，由宿主决定何时销毁。
    pub fn clear(&mut self) {
        self.scheduler.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::definition::LayerChoice;
    use crate::error::PerformError;

    #[test]
    fn test_new_registers_builtins() {
        let stage = PerformStage::new(&PerformConfig::default()).unwrap();
        assert_eq!(stage.registry().len(), 5);
        assert_eq!(stage.active_count(), 0);
    }

    #[test]
    fn test_disabled_and_extra_definitions() {
        let mut extra = builtin::en_sweat();
        extra.name = "enSweatLong".to_string();
        extra.ticker_key = "en-sweat-long-ticker".to_string();
        extra.timeline.duration = Some(3.0);

        let config = PerformConfig {
            definitions: vec![extra],
            disabled: vec!["enHmm".to_string()],
            ..Default::default()
        };
        let stage = PerformStage::new(&config).unwrap();
        assert!(!stage.registry().contains("enHmm"));
        assert!(stage.registry().contains("enSweatLong"));
    }

    #[test]
    fn test_invalid_extra_definition_fails() {
        let mut bad = builtin::en_answer();
        bad.name = "enBad".to_string();
        bad.layers.clear();
        let config = PerformConfig {
            definitions: vec![bad],
            ..Default::default()
        };
        assert!(matches!(
            PerformStage::new(&config),
            Err(PerformError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_perform_update_until_done() {
        let mut stage = PerformStage::new(&PerformConfig::default()).unwrap();
        let handle = stage.perform("enAnswer").unwrap();
        assert!(stage.is_active(&handle.registry_key));

        assert!(stage.update(60.0).is_empty());
        assert_eq!(stage.update(30.0), vec![handle.registry_key.clone()]);
        assert!(!stage.is_active(&handle.registry_key));
        assert_eq!(stage.scene().layer(LayerChoice::Foreground).len(), 1);
    }

    #[test]
    fn test_cancel_and_clear() {
        let mut stage = PerformStage::new(&PerformConfig::default()).unwrap();
        stage.perform("enSweat").unwrap();
        stage.perform("enBubbleSuki").unwrap();
        stage.perform_with_key("enBubbleSuki", "suki-2").unwrap();
        assert_eq!(stage.active_count(), 3);

        assert!(stage.cancel("suki-2"));
        assert!(!stage.cancel("suki-2"));
        assert_eq!(stage.active_count(), 2);

        stage.clear();
        assert_eq!(stage.active_count(), 0);
        assert!(stage.active_keys().is_empty());
    }
}
