//! # Registry 模块
//!
//! 表演名 → 工厂函数的映射。
//!
//! 脚本命令按名字调用表演；注册在启动时通过 [`register_all_performs`] 显式完成，
//! 注册顺序和内容因此是确定的。

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::builtin;
use crate::definition::EffectDefinition;
use crate::error::{PerformError, PerformResult};
use crate::geometry::ScreenGeometry;
use crate::instance::{EffectHandle, PerformInstance};
use crate::resolver::{ResolvedPerform, resolve};
use crate::scene::SceneContext;
use crate::scheduler::TickScheduler;

/// 表演工厂
pub type PerformFactory =
    Box<dyn Fn(&mut SceneContext, &mut TickScheduler) -> PerformResult<EffectHandle>>;

/// 表演注册表
#[derive(Default)]
pub struct PerformRegistry {
    factories: HashMap<String, PerformFactory>,
    /// 由定义注册的表演（可以换 key 启动）
    resolved: HashMap<String, Rc<ResolvedPerform>>,
}

impl std::fmt::Debug for PerformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl PerformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工厂函数
    ///
    /// 同名表演会被覆盖。
    pub fn register_effect(&mut self, name: impl Into<String>, factory: PerformFactory) {
        let name = name.into();
        if self.factories.contains_key(&name) {
            warn!(name = %name, "表演重复注册，覆盖旧定义");
        }
        self.resolved.remove(&name);
        debug!(name = %name, "注册表演");
        self.factories.insert(name, factory);
    }

    /// 校验定义并注册为表演
    ///
    /// 定义无效时不注册，直接返回错误。
    pub fn register_definition(
        &mut self,
        def: &EffectDefinition,
        screen: &ScreenGeometry,
    ) -> PerformResult<()> {
        let perform = Rc::new(resolve(def, screen)?);

        let factory_perform = perform.clone();
        let factory: PerformFactory = Box::new(
            move |ctx: &mut SceneContext,
                  scheduler: &mut TickScheduler|
                  -> PerformResult<EffectHandle> {
                let key = factory_perform.ticker_key.clone();
                PerformInstance::spawn(factory_perform.clone(), key, ctx, scheduler)
            },
        );

        self.register_effect(def.name.clone(), factory);
        self.resolved.insert(def.name.clone(), perform);
        Ok(())
    }

    /// 移除表演，返回是否存在
    pub fn unregister(&mut self, name: &str) -> bool {
        self.resolved.remove(name);
        self.factories.remove(name).is_some()
    }

    /// 按名字启动表演
    pub fn invoke(
        &self,
        name: &str,
        ctx: &mut SceneContext,
        scheduler: &mut TickScheduler,
    ) -> PerformResult<EffectHandle> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PerformError::UnknownEffect {
                name: name.to_string(),
            })?;
        factory(ctx, scheduler)
    }

    /// 以指定 key 启动由定义注册的表演
    ///
    /// 允许同一种表演同时存在多个实例。
    /// 只适用于 [`register_definition`](Self::register_definition) 注册的表演：
    /// 工厂函数自行决定 key，对其调用返回 `InvalidDefinition`。
    pub fn invoke_with_key(
        &self,
        name: &str,
        key: impl Into<String>,
        ctx: &mut SceneContext,
        scheduler: &mut TickScheduler,
    ) -> PerformResult<EffectHandle> {
        match self.resolved.get(name) {
            Some(perform) => PerformInstance::spawn(perform.clone(), key, ctx, scheduler),
            None if self.factories.contains_key(name) => Err(PerformError::invalid_definition(
                name,
                "由工厂函数注册的表演不支持自定义 key",
            )),
            None => Err(PerformError::UnknownEffect {
                name: name.to_string(),
            }),
        }
    }

    /// 是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// 全部表演名（已排序）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// 由定义注册的表演参数
    pub fn definition(&self, name: &str) -> Option<&ResolvedPerform> {
        self.resolved.get(name).map(Rc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// 注册全部内置表演
///
/// 由宿主在启动时调用一次。
pub fn register_all_performs(
    registry: &mut PerformRegistry,
    screen: &ScreenGeometry,
) -> PerformResult<()> {
    for def in builtin::all() {
        registry.register_definition(&def, screen)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::LayerChoice;
    use crate::scheduler::TickControl;

    fn setup() -> (PerformRegistry, SceneContext, TickScheduler) {
        let screen = ScreenGeometry::default();
        let mut registry = PerformRegistry::new();
        register_all_performs(&mut registry, &screen).unwrap();
        (registry, SceneContext::headless(screen), TickScheduler::new())
    }

    #[test]
    fn test_register_all_performs() {
        let (registry, _, _) = setup();
        insta::assert_yaml_snapshot!(registry.names(), @r"
        - enAnswer
        - enBubbleOmit
        - enBubbleSuki
        - enHmm
        - enSweat
        ");
    }

    #[test]
    fn test_invoke_spawns_and_registers() {
        let (registry, mut ctx, mut scheduler) = setup();
        let handle = registry.invoke("enHmm", &mut ctx, &mut scheduler).unwrap();

        assert_eq!(handle.registry_key, "en-hmm-foreground-ticker");
        assert!(scheduler.is_registered(&handle.registry_key));
        assert!(ctx.layer(LayerChoice::Foreground).contains(&handle.container));
    }

    #[test]
    fn test_invoke_unknown() {
        let (registry, mut ctx, mut scheduler) = setup();
        let err = registry.invoke("enNope", &mut ctx, &mut scheduler).unwrap_err();
        assert_eq!(
            err,
            PerformError::UnknownEffect {
                name: "enNope".to_string()
            }
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_invoke_twice_is_duplicate_key() {
        let (registry, mut ctx, mut scheduler) = setup();
        registry.invoke("enSweat", &mut ctx, &mut scheduler).unwrap();
        let err = registry.invoke("enSweat", &mut ctx, &mut scheduler).unwrap_err();
        assert!(matches!(err, PerformError::DuplicateKey { .. }));

        // 换 key 可以并存
        registry
            .invoke_with_key("enSweat", "sweat-2", &mut ctx, &mut scheduler)
            .unwrap();
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn test_invalid_definition_not_registered() {
        let mut registry = PerformRegistry::new();
        let mut def = builtin::en_sweat();
        def.timeline.duration = Some(0.0);
        assert!(
            registry
                .register_definition(&def, &ScreenGeometry::default())
                .is_err()
        );
        assert!(!registry.contains("enSweat"));
    }

    #[test]
    fn test_custom_factory() {
        let mut registry = PerformRegistry::new();
        registry.register_effect(
            "noop",
            Box::new(
                |ctx: &mut SceneContext,
                 scheduler: &mut TickScheduler|
                 -> PerformResult<EffectHandle> {
                let container = std::rc::Rc::new(std::cell::RefCell::new(
                    crate::scene::ContainerNode::new(),
                ));
                ctx.background.insert(container.clone());
                scheduler.register_tick("noop", Box::new(|_: f32| TickControl::Remove))?;
                Ok(EffectHandle {
                    container,
                    registry_key: "noop".to_string(),
                })
                },
            ),
        );

        let mut ctx = SceneContext::headless(ScreenGeometry::default());
        let mut scheduler = TickScheduler::new();
        registry.invoke("noop", &mut ctx, &mut scheduler).unwrap();
        assert_eq!(ctx.layer(LayerChoice::Background).len(), 1);

        // 工厂注册的表演不能换 key
        assert!(matches!(
            registry.invoke_with_key("noop", "noop-2", &mut ctx, &mut scheduler),
            Err(PerformError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            registry.invoke_with_key("missing", "k", &mut ctx, &mut scheduler),
            Err(PerformError::UnknownEffect { .. })
        ));
        assert_eq!(ctx.layer(LayerChoice::Background).len(), 1);
        assert_eq!(scheduler.tick(1.0), vec!["noop".to_string()]);
        assert!(registry.definition("noop").is_none());
        assert!(registry.unregister("noop"));
        assert!(registry.is_empty());
    }
}
