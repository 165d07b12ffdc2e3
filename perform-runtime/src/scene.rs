//! # Scene 模块
//!
//! 表演与场景图之间的边界。
//!
//! 场景层、节点工厂都是外部协作者，这里只定义它们的接口和一个内存实现。
//! 节点用 `Rc<RefCell<T>>` 共享：场景层持有引用用于渲染，
//! 创建它的表演实例是唯一写入方。

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::definition::LayerChoice;
use crate::error::{PerformError, PerformResult};
use crate::geometry::{ScreenGeometry, Vec2};

/// 可渲染节点（精灵）
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    /// 纹理路径；`None` 表示纹理缺失，渲染为占位
    pub texture: Option<String>,
    /// 透明度 (0.0 - 1.0)
    pub opacity: f32,
    /// 位置（图层局部坐标，锚点居中）
    pub position: Vec2,
    /// 缩放
    pub scale: f32,
    /// 是否参与渲染
    pub visible: bool,
}

impl RenderNode {
    /// 创建带纹理的节点
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            texture: Some(texture.into()),
            ..Self::placeholder()
        }
    }

    /// 创建占位节点（纹理缺失）
    pub fn placeholder() -> Self {
        Self {
            texture: None,
            opacity: 1.0,
            position: Vec2::zero(),
            scale: 1.0,
            visible: true,
        }
    }
}

/// 共享节点引用
pub type NodeRef = Rc<RefCell<RenderNode>>;

/// 容器节点：一个表演实例的全部子节点
#[derive(Debug, Default)]
pub struct ContainerNode {
    /// 容器可见性
    pub visible: bool,
    /// 子节点，自底向上
    pub children: Vec<NodeRef>,
}

impl ContainerNode {
    pub fn new() -> Self {
        Self {
            visible: true,
            children: Vec::new(),
        }
    }
}

/// 共享容器引用
pub type ContainerRef = Rc<RefCell<ContainerNode>>;

/// 场景层接口
///
/// 表演只向场景层插入/移除自己的容器，不检查其他内容。
pub trait SceneLayer {
    /// 插入容器
    fn insert(&mut self, node: ContainerRef);

    /// 移除容器，返回是否存在
    fn remove(&mut self, node: &ContainerRef) -> bool;

    /// 容器数量
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 是否包含指定容器（按引用比较）
    fn contains(&self, node: &ContainerRef) -> bool;
}

/// 内存中的特效层
#[derive(Debug, Default)]
pub struct EffectLayer {
    name: String,
    nodes: Vec<ContainerRef>,
}

impl EffectLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// 层名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 全部容器
    pub fn nodes(&self) -> &[ContainerRef] {
        &self.nodes
    }
}

impl SceneLayer for EffectLayer {
    fn insert(&mut self, node: ContainerRef) {
        debug!(layer = %self.name, "插入表演容器");
        self.nodes.push(node);
    }

    fn remove(&mut self, node: &ContainerRef) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| !Rc::ptr_eq(n, node));
        before != self.nodes.len()
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn contains(&self, node: &ContainerRef) -> bool {
        self.nodes.iter().any(|n| Rc::ptr_eq(n, node))
    }
}

/// 节点工厂接口
pub trait NodeFactory {
    /// 按纹理创建节点；纹理无法解析时返回 `MissingTexture`
    fn create_node(&self, texture: &str) -> PerformResult<RenderNode>;
}

/// 总是成功的节点工厂（纹理在渲染时才加载）
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainNodeFactory;

impl NodeFactory for PlainNodeFactory {
    fn create_node(&self, texture: &str) -> PerformResult<RenderNode> {
        Ok(RenderNode::new(texture))
    }
}

/// 只认识已登记纹理的节点工厂
#[derive(Debug, Default, Clone)]
pub struct KnownTextures {
    paths: HashSet<String>,
}

impl KnownTextures {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// 登记纹理
    pub fn insert(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }
}

impl NodeFactory for KnownTextures {
    fn create_node(&self, texture: &str) -> PerformResult<RenderNode> {
        if self.paths.contains(texture) {
            Ok(RenderNode::new(texture))
        } else {
            Err(PerformError::MissingTexture {
                path: texture.to_string(),
            })
        }
    }
}

/// 场景上下文
///
/// 显式传入每个表演构造函数，替代全局舞台对象。
pub struct SceneContext {
    pub foreground: Box<dyn SceneLayer>,
    pub background: Box<dyn SceneLayer>,
    pub nodes: Box<dyn NodeFactory>,
    pub screen: ScreenGeometry,
}

impl std::fmt::Debug for SceneContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneContext")
            .field("foreground", &self.foreground.len())
            .field("background", &self.background.len())
            .field("screen", &self.screen)
            .finish()
    }
}

impl SceneContext {
    /// 使用内存特效层与指定节点工厂
    pub fn new(screen: ScreenGeometry, nodes: Box<dyn NodeFactory>) -> Self {
        Self {
            foreground: Box::new(EffectLayer::new("foreground-effects")),
            background: Box::new(EffectLayer::new("background-effects")),
            nodes,
            screen,
        }
    }

    /// 内存特效层 + `PlainNodeFactory`
    pub fn headless(screen: ScreenGeometry) -> Self {
        Self::new(screen, Box::new(PlainNodeFactory))
    }

    /// 按选择取场景层
    pub fn layer(&self, choice: LayerChoice) -> &dyn SceneLayer {
        match choice {
            LayerChoice::Foreground => self.foreground.as_ref(),
            LayerChoice::Background => self.background.as_ref(),
        }
    }

    /// 按选择取可变场景层
    pub fn layer_mut(&mut self, choice: LayerChoice) -> &mut dyn SceneLayer {
        match choice {
            LayerChoice::Foreground => self.foreground.as_mut(),
            LayerChoice::Background => self.background.as_mut(),
        }
    }
}
