//! 目标源（TargetSource）
//!
//! 代理每次调用都从目标源取得目标对象，调用结束后归还。

use std::fmt;
use std::sync::{Arc, Weak};

use anyhow::anyhow;
use beanstalk_core::prelude::*;

/// 目标源
pub trait TargetSource: Send + Sync {
    /// 目标对象的类，用于切点匹配和代理生成
    fn target_class(&self) -> Arc<ClassDescriptor>;

    /// 每次返回同一个目标时为 true，此时不需要归还
    fn is_static(&self) -> bool;

    fn get_target(&self) -> anyhow::Result<ObjectRef>;

    /// 调用结束后归还目标
    fn release_target(&self, _target: ObjectRef) -> anyhow::Result<()> {
        Ok(())
    }
}

/// 固定目标
#[derive(Clone)]
pub struct SingletonTargetSource {
    target: ObjectRef,
}

impl SingletonTargetSource {
    pub fn new(target: ObjectRef) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &ObjectRef {
        &self.target
    }
}

impl TargetSource for SingletonTargetSource {
    fn target_class(&self) -> Arc<ClassDescriptor> {
        Arc::clone(self.target.class())
    }

    fn is_static(&self) -> bool {
        true
    }

    fn get_target(&self) -> anyhow::Result<ObjectRef> {
        Ok(self.target.clone())
    }
}

impl fmt::Debug for SingletonTargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SingletonTargetSource({:?})", self.target)
    }
}

/// 每次调用从容器取一个新的原型实例，调用结束后销毁
pub struct PrototypeTargetSource {
    container: Weak<Container>,
    bean_name: String,
    class: Arc<ClassDescriptor>,
}

impl PrototypeTargetSource {
    /// `bean_name` 必须是原型作用域的定义
    pub fn new(container: &Arc<Container>, bean_name: &str) -> ContainerResult<Self> {
        let definition = container.get_bean_definition(bean_name)?;
        if !definition.is_prototype() {
            return Err(ContainerError::Other(anyhow!(
                "Target bean '{}' must be prototype-scoped to back a PrototypeTargetSource, but has scope '{}'",
                bean_name,
                definition.scope()
            )));
        }
        Ok(Self {
            container: Arc::downgrade(container),
            bean_name: bean_name.to_string(),
            class: Arc::clone(definition.class()),
        })
    }

    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    fn container(&self) -> anyhow::Result<Arc<Container>> {
        self.container.upgrade().ok_or_else(|| {
            anyhow!(
                "Container backing prototype target '{}' has been dropped",
                self.bean_name
            )
        })
    }
}

impl TargetSource for PrototypeTargetSource {
    fn target_class(&self) -> Arc<ClassDescriptor> {
        Arc::clone(&self.class)
    }

    fn is_static(&self) -> bool {
        false
    }

    fn get_target(&self) -> anyhow::Result<ObjectRef> {
        let target = self.container()?.get_bean(&self.bean_name)?;
        tracing::trace!("Obtained prototype target {:?} for '{}'", target, self.bean_name);
        Ok(target)
    }

    fn release_target(&self, target: ObjectRef) -> anyhow::Result<()> {
        tracing::trace!("Destroying prototype target {:?} of '{}'", target, self.bean_name);
        self.container()?.destroy_bean(&self.bean_name, &target)?;
        Ok(())
    }
}

impl fmt::Debug for PrototypeTargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrototypeTargetSource('{}')", self.bean_name)
    }
}
