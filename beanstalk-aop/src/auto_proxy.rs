//! 自动代理 - 为命中通知器的 Bean 包装 AOP 代理
//!
//! 通过实现 BeanPostProcessor，在 Bean 初始化后为有可用通知器的 Bean 创建代理。
//!
//! ## 循环引用
//!
//! 单例在循环引用中被提前暴露时，早期引用已经是代理；此时初始化后阶段
//! 不再重复包装，而是返回原始实例，容器随后把早期引用（同一个代理）作为最终对象。

use std::collections::HashMap;
use std::sync::Arc;

use beanstalk_core::prelude::*;
use beanstalk_core::AUTO_PROXY_PROCESSOR_ORDER;
use parking_lot::Mutex;

use crate::aop_utils;
use crate::proxy::build_proxy;
use crate::registry::AdvisorRegistry;
use crate::target::SingletonTargetSource;

/// 自动代理创建器
///
/// ## 使用示例
///
/// ```
/// use std::sync::Arc;
/// use beanstalk_core::prelude::*;
/// use beanstalk_aop::prelude::*;
///
/// let registry = Arc::new(AdvisorRegistry::new());
/// let container = Container::new();
/// container.add_bean_post_processor(Arc::new(AutoProxyCreator::new(Arc::clone(&registry))));
/// ```
pub struct AutoProxyCreator {
    registry: Arc<AdvisorRegistry>,
    proxy_target_class: bool,
    early_proxy_references: Mutex<HashMap<String, ObjectRef>>,
}

impl AutoProxyCreator {
    pub fn new(registry: Arc<AdvisorRegistry>) -> Self {
        Self {
            registry,
            proxy_target_class: false,
            early_proxy_references: Mutex::new(HashMap::new()),
        }
    }

    /// 强制使用子类代理
    pub fn proxy_target_class(mut self, force: bool) -> Self {
        self.proxy_target_class = force;
        self
    }

    pub fn registry(&self) -> &Arc<AdvisorRegistry> {
        &self.registry
    }

    fn wrap_if_necessary(&self, bean: ObjectRef, bean_name: &str) -> ContainerResult<ObjectRef> {
        if aop_utils::is_aop_proxy(&bean) {
            return Ok(bean);
        }

        let advisors = self.registry.eligible_advisors(bean.class());
        if advisors.is_empty() {
            tracing::trace!("Bean '{}' does not match any advisor, skipping AOP wrapping", bean_name);
            return Ok(bean);
        }

        tracing::info!(
            "🔷 [AOP] Creating proxy for bean '{}' with {} advisor(s)",
            bean_name,
            advisors.len()
        );
        build_proxy(
            Arc::new(SingletonTargetSource::new(bean)),
            advisors,
            self.proxy_target_class,
        )
    }
}

impl BeanPostProcessor for AutoProxyCreator {
    fn get_early_bean_reference(&self, bean: ObjectRef, bean_name: &str) -> ContainerResult<ObjectRef> {
        self.early_proxy_references
            .lock()
            .insert(bean_name.to_string(), bean.clone());
        self.wrap_if_necessary(bean, bean_name)
    }

    fn post_process_after_initialization(
        &self,
        bean: ObjectRef,
        bean_name: &str,
    ) -> ContainerResult<ObjectRef> {
        let early = self.early_proxy_references.lock().remove(bean_name);
        match early {
            Some(raw) if ObjectRef::ptr_eq(&raw, &bean) => Ok(bean),
            _ => self.wrap_if_necessary(bean, bean_name),
        }
    }

    fn name(&self) -> &str {
        "AutoProxyCreator"
    }

    fn order(&self) -> i32 {
        // 排在普通处理器之后，包装的是已经完全初始化的 Bean
        AUTO_PROXY_PROCESSOR_ORDER
    }
}
