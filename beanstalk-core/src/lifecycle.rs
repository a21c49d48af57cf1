//! 生命周期
//!
//! - [`BeanPostProcessor`]：在 Bean 初始化前后、早期引用暴露时和销毁前进行自定义处理
//! - [`BeanFactoryPostProcessor`]：在单例预实例化之前修改容器中的定义
//! - [`LifecycleInvoker`]：按固定顺序运行 Aware 回调、前置处理器、初始化方法和后置处理器
//! - [`DisposableBeanAdapter`]：把销毁前处理器、`on_destroy` 回调与销毁方法合成一个销毁回调

use std::sync::Arc;

use anyhow::anyhow;

use crate::bean::BeanDefinition;
use crate::bean_factory::ConfigurableListableBeanFactory;
use crate::constants::DEFAULT_PROCESSOR_ORDER;
use crate::container::Container;
use crate::error::{ContainerError, ContainerResult};
use crate::object::ObjectRef;

/// BeanPostProcessor trait
///
/// 在 Bean 初始化的不同阶段提供钩子，允许替换或包装 Bean 实例。
///
/// 使用场景：
/// - AOP 代理创建
/// - Bean 包装
/// - 初始化前的校验
///
/// # 示例
///
/// ```
/// use beanstalk_core::prelude::*;
///
/// struct TracingProcessor;
///
/// impl BeanPostProcessor for TracingProcessor {
///     fn post_process_after_initialization(
///         &self,
///         bean: ObjectRef,
///         bean_name: &str,
///     ) -> ContainerResult<ObjectRef> {
///         tracing::info!("Initialized bean '{}' of class '{}'", bean_name, bean.class_name());
///         Ok(bean)
///     }
/// }
/// ```
pub trait BeanPostProcessor: Send + Sync {
    /// 在 Bean 初始化回调之前调用
    fn post_process_before_initialization(
        &self,
        bean: ObjectRef,
        _bean_name: &str,
    ) -> ContainerResult<ObjectRef> {
        Ok(bean)
    }

    /// 在 Bean 初始化回调之后调用
    ///
    /// # 典型用途
    /// - 创建 AOP 代理
    /// - 包装 Bean
    fn post_process_after_initialization(
        &self,
        bean: ObjectRef,
        _bean_name: &str,
    ) -> ContainerResult<ObjectRef> {
        Ok(bean)
    }

    /// 为正在创建的单例提供早期引用
    ///
    /// 循环引用中的另一方拿到的就是这个对象；返回代理时，
    /// 同一个处理器应当在 `post_process_after_initialization` 中识别并跳过该 Bean。
    fn get_early_bean_reference(&self, bean: ObjectRef, _bean_name: &str) -> ContainerResult<ObjectRef> {
        Ok(bean)
    }

    /// 是否需要在该 Bean 销毁前被回调
    fn requires_destruction(&self, _bean: &ObjectRef) -> bool {
        false
    }

    /// Bean 销毁前调用
    fn post_process_before_destruction(&self, _bean: &ObjectRef, _bean_name: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// 获取处理器的名称（用于日志和调试）
    fn name(&self) -> &str {
        "BeanPostProcessor"
    }

    /// 获取处理器的优先级（数字越小优先级越高）
    ///
    /// 默认为 1000
    fn order(&self) -> i32 {
        DEFAULT_PROCESSOR_ORDER
    }
}

/// BeanFactoryPostProcessor trait
///
/// 在 `refresh` 中、任何单例被创建之前调用，可以注册或修改定义。
pub trait BeanFactoryPostProcessor: Send + Sync {
    fn post_process_bean_factory(&self, factory: &dyn ConfigurableListableBeanFactory) -> ContainerResult<()>;

    fn name(&self) -> &str {
        "BeanFactoryPostProcessor"
    }

    fn order(&self) -> i32 {
        DEFAULT_PROCESSOR_ORDER
    }
}

/// 初始化步骤执行器
pub(crate) struct LifecycleInvoker<'c> {
    container: &'c Container,
    processors: Vec<Arc<dyn BeanPostProcessor>>,
}

impl<'c> LifecycleInvoker<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self {
            container,
            processors: container.post_processor_snapshot(),
        }
    }

    /// 依次执行 Aware 回调、前置处理器、`after_properties_set`、初始化方法和后置处理器，
    /// 返回最终暴露的对象
    pub(crate) fn initialize(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        bean: ObjectRef,
    ) -> ContainerResult<ObjectRef> {
        self.invoke_aware_methods(bean_name, &bean)?;

        let mut current = bean;
        for processor in &self.processors {
            tracing::trace!(
                "Applying '{}' before initialization of bean '{}'",
                processor.name(),
                bean_name
            );
            current = processor.post_process_before_initialization(current, bean_name)?;
        }

        self.invoke_init_methods(bean_name, definition, &current)?;

        for processor in &self.processors {
            tracing::trace!(
                "Applying '{}' after initialization of bean '{}'",
                processor.name(),
                bean_name
            );
            current = processor.post_process_after_initialization(current, bean_name)?;
        }

        Ok(current)
    }

    fn invoke_aware_methods(&self, bean_name: &str, bean: &ObjectRef) -> ContainerResult<()> {
        let lifecycle = bean.class().lifecycle();
        if let Some(hook) = &lifecycle.bean_name_aware {
            hook(bean, bean_name).map_err(ContainerError::from_user)?;
        }
        if let Some(hook) = &lifecycle.container_aware {
            if let Some(container) = self.container.shared() {
                hook(bean, &container).map_err(ContainerError::from_user)?;
            }
        }
        Ok(())
    }

    fn invoke_init_methods(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        bean: &ObjectRef,
    ) -> ContainerResult<()> {
        let after_properties_set = bean.class().lifecycle().after_properties_set.clone();
        if let Some(hook) = &after_properties_set {
            tracing::trace!("Invoking after_properties_set() on bean with name '{}'", bean_name);
            hook(bean).map_err(ContainerError::from_user)?;
        }

        if let Some(method) = definition.init_method() {
            if after_properties_set.is_some() && method == "after_properties_set" {
                return Ok(());
            }
            if bean.class().find_method(method, &[]).is_none() {
                return Err(ContainerError::Other(anyhow!(
                    "Could not find an init method named '{}' on bean with name '{}'",
                    method,
                    bean_name
                )));
            }
            tracing::trace!("Invoking init method '{}' on bean with name '{}'", method, bean_name);
            bean.invoke(method, &[]).map_err(ContainerError::from_user)?;
        }
        Ok(())
    }

    /// 依次应用所有处理器的早期引用钩子
    pub(crate) fn early_bean_reference(
        processors: &[Arc<dyn BeanPostProcessor>],
        bean: ObjectRef,
        bean_name: &str,
    ) -> ContainerResult<ObjectRef> {
        let mut exposed = bean;
        for processor in processors {
            exposed = processor.get_early_bean_reference(exposed, bean_name)?;
        }
        Ok(exposed)
    }
}

/// 销毁适配器
pub struct DisposableBeanAdapter {
    bean_name: String,
    bean: ObjectRef,
    destroy_method: Option<String>,
    processors: Vec<Arc<dyn BeanPostProcessor>>,
}

impl DisposableBeanAdapter {
    /// Bean 有任何销毁逻辑时返回适配器
    pub fn for_bean(
        bean_name: &str,
        bean: &ObjectRef,
        definition: &BeanDefinition,
        processors: &[Arc<dyn BeanPostProcessor>],
    ) -> Option<Self> {
        let processors: Vec<Arc<dyn BeanPostProcessor>> = processors
            .iter()
            .filter(|p| p.requires_destruction(bean))
            .cloned()
            .collect();
        let destroy_method = definition.destroy_method().map(str::to_string);
        let has_hook = bean.class().lifecycle().on_destroy.is_some();

        if processors.is_empty() && destroy_method.is_none() && !has_hook {
            return None;
        }
        Some(Self {
            bean_name: bean_name.to_string(),
            bean: bean.clone(),
            destroy_method,
            processors,
        })
    }

    /// 运行全部销毁步骤，返回第一个错误
    pub fn destroy(self) -> anyhow::Result<()> {
        let mut first_error: Option<anyhow::Error> = None;
        let mut record = |result: anyhow::Result<()>| {
            if let Err(e) = result {
                tracing::warn!("Destroy step on bean '{}' failed: {}", self.bean_name, e);
                first_error.get_or_insert(e);
            }
        };

        for processor in &self.processors {
            record(processor.post_process_before_destruction(&self.bean, &self.bean_name));
        }

        let on_destroy = self.bean.class().lifecycle().on_destroy.clone();
        if let Some(hook) = &on_destroy {
            tracing::trace!("Invoking on_destroy() on bean with name '{}'", self.bean_name);
            record(hook(&self.bean));
        }

        if let Some(method) = &self.destroy_method {
            let duplicate = on_destroy.is_some() && method == "on_destroy";
            if !duplicate {
                tracing::trace!("Invoking destroy method '{}' on bean with name '{}'", method, self.bean_name);
                record(self.bean.invoke(method, &[]).map(|_| ()));
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
