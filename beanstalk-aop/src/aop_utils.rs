//! 代理识别与通知器筛选工具

use std::sync::Arc;

use beanstalk_core::{ClassDescriptor, ObjectRef};

use crate::advised::AdvisedConfig;
use crate::advisor::Advisor;
use crate::pointcut;
use crate::proxy::{AopProxy, ProxyKind};

pub fn is_aop_proxy(object: &ObjectRef) -> bool {
    object.downcast_ref::<AopProxy>().is_some()
}

pub fn is_interface_proxy(object: &ObjectRef) -> bool {
    proxy_kind(object) == Some(ProxyKind::Interface)
}

pub fn is_subclass_proxy(object: &ObjectRef) -> bool {
    proxy_kind(object) == Some(ProxyKind::Subclass)
}

fn proxy_kind(object: &ObjectRef) -> Option<ProxyKind> {
    object.downcast_ref::<AopProxy>().map(AopProxy::kind)
}

/// 代理的配置，可用于在运行期增删通知器
pub fn advised(object: &ObjectRef) -> Option<Arc<AdvisedConfig>> {
    object
        .downcast_ref::<AopProxy>()
        .map(|proxy| Arc::clone(proxy.config()))
}

/// 穿透所有代理层得到最终目标类
pub fn ultimate_target_class(object: &ObjectRef) -> Arc<ClassDescriptor> {
    match object.downcast_ref::<AopProxy>() {
        Some(proxy) => {
            let source = proxy.config().target_source();
            match source.get_target() {
                Ok(target) => {
                    let class = ultimate_target_class(&target);
                    if !source.is_static() {
                        if let Err(e) = source.release_target(target) {
                            tracing::warn!("Failed to release target while resolving its class: {}", e);
                        }
                    }
                    class
                }
                Err(_) => source.target_class(),
            }
        }
        None => Arc::clone(object.class()),
    }
}

/// 通知器是否可能作用于 `class` 的某个方法
pub fn can_apply(advisor: &Advisor, class: &ClassDescriptor) -> bool {
    if !pointcut::matches_class(advisor.pointcut().as_ref(), class) {
        return false;
    }
    let mut current = Some(class);
    while let Some(level) = current {
        if level
            .methods()
            .iter()
            .any(|descriptor| advisor.matches(&descriptor.method, class))
        {
            return true;
        }
        current = level.superclass().map(|s| s.as_ref());
    }
    false
}

/// 保持原有顺序筛选出可作用于 `class` 的通知器
pub fn find_eligible_advisors(advisors: &[Advisor], class: &ClassDescriptor) -> Vec<Advisor> {
    advisors
        .iter()
        .filter(|advisor| can_apply(advisor, class))
        .cloned()
        .collect()
}
