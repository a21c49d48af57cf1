//! 代理工厂
//!
//! 没有任何通知器命中目标类时直接返回目标本身。否则：
//! - 目标类实现了契约且未强制子类代理：生成接口代理，实现目标的全部契约，
//!   契约上的每个方法都经过拦截链
//! - 否则生成子类代理：以目标类为父类，重写所有可重写的方法；
//!   final 方法直接转发给目标。封闭类无法生成子类代理

use std::fmt;
use std::sync::Arc;

use beanstalk_core::class::{ContractCast, MethodInvoker};
use beanstalk_core::{
    ClassDescriptor, ContainerError, ContainerResult, ContractBinding, ContractDescriptor, InvokeResult, Method,
    MethodDescriptor, ObjectRef, TypeInfo, Value,
};

use crate::advice::Advice;
use crate::advised::AdvisedConfig;
use crate::advisor::Advisor;
use crate::aop_utils;
use crate::error::AopError;
use crate::invocation::MethodInvocation;
use crate::joinpoint::JoinPoint;
use crate::target::{SingletonTargetSource, TargetSource};

/// 代理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// 实现目标的契约
    Interface,
    /// 目标类的合成子类
    Subclass,
}

/// 代理实例，方法调用经由它进入拦截链
pub struct AopProxy {
    config: Arc<AdvisedConfig>,
    kind: ProxyKind,
}

impl AopProxy {
    pub fn config(&self) -> &Arc<AdvisedConfig> {
        &self.config
    }

    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    /// 经过拦截链调用 `method`，`proxy` 是持有本实例的对象引用
    fn invoke(&self, proxy: &ObjectRef, method: &Method, args: &[Value]) -> InvokeResult {
        let class = self.config.target_class();
        let target_method = class
            .method_by_signature(method)
            .map(|descriptor| descriptor.method.clone())
            .ok_or_else(|| AopError::NoSuchTargetMethod {
                method: method.to_string(),
                class: class.name().to_string(),
            })?;
        let chain = self.config.chain_for(&target_method, &class);

        let source = self.config.target_source();
        let target = source.get_target()?;
        let result = if chain.is_empty() {
            target.invoke_method(&target_method, args)
        } else {
            let join_point = JoinPoint::new(target_method, args.to_vec(), target.clone(), proxy.clone());
            MethodInvocation::new(join_point, chain).proceed()
        };
        let result = result.map(|value| substitute_proxy(value, &target, proxy));

        release(source, target);
        result
    }

    /// final 方法不经过拦截链
    fn invoke_unadvised(&self, method: &Method, args: &[Value]) -> InvokeResult {
        let source = self.config.target_source();
        let target = source.get_target()?;
        let result = target.invoke_method(method, args);
        release(source, target);
        result
    }
}

/// 归还非静态目标，失败只记录日志，不影响调用结果
fn release(source: &Arc<dyn TargetSource>, target: ObjectRef) {
    if source.is_static() {
        return;
    }
    let class = target.class_name().to_string();
    if let Err(e) = source.release_target(target) {
        tracing::warn!("Failed to release target of proxy for '{}': {}", class, e);
    }
}

impl fmt::Debug for AopProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AopProxy")
            .field("kind", &self.kind)
            .field("config", &self.config)
            .finish()
    }
}

/// 方法返回目标自身时改为返回代理
fn substitute_proxy(value: Value, target: &ObjectRef, proxy: &ObjectRef) -> Value {
    match value {
        Value::Object(object) if ObjectRef::ptr_eq(&object, target) => Value::Object(proxy.clone()),
        other => other,
    }
}

fn proxy_of(object: &ObjectRef) -> anyhow::Result<&AopProxy> {
    object
        .downcast_ref::<AopProxy>()
        .ok_or_else(|| anyhow::anyhow!("object {:?} is not an AOP proxy", object))
}

fn intercepting_invoker(method: Method) -> MethodInvoker {
    Arc::new(move |object: &ObjectRef, args: &[Value]| -> InvokeResult {
        proxy_of(object)?.invoke(object, &method, args)
    })
}

fn forwarding_invoker(method: Method) -> MethodInvoker {
    Arc::new(move |object: &ObjectRef, args: &[Value]| -> InvokeResult {
        proxy_of(object)?.invoke_unadvised(&method, args)
    })
}

/// 代理上的契约视图由契约的委托工厂生成，没有委托工厂时只能按名称调用
fn delegate_binding(contract: &Arc<ContractDescriptor>) -> ContractBinding {
    let delegate = contract.delegate().cloned();
    if delegate.is_none() {
        tracing::debug!(
            "Contract '{}' has no delegate; proxies can only be invoked by method name",
            contract.info()
        );
    }
    let cast: ContractCast =
        Arc::new(move |object: &ObjectRef| delegate.as_ref().map(|factory| factory(object.clone())));
    ContractBinding::new(Arc::clone(contract), cast)
}

fn push_unique(methods: &mut Vec<MethodDescriptor>, descriptor: MethodDescriptor) {
    if !methods.iter().any(|m| m.method.same_signature(&descriptor.method)) {
        methods.push(descriptor);
    }
}

fn interface_proxy_class(class: &Arc<ClassDescriptor>, contracts: &[Arc<ContractDescriptor>]) -> ClassDescriptor {
    let mut methods = Vec::new();
    for contract in contracts {
        for method in contract.methods() {
            push_unique(
                &mut methods,
                MethodDescriptor::new(method.clone(), true, intercepting_invoker(method.clone())),
            );
        }
    }
    ClassDescriptor::synthetic(
        TypeInfo::of::<AopProxy>(),
        format!("{}$$InterfaceProxy", class.name()),
        None,
        contracts.iter().map(delegate_binding).collect(),
        methods,
    )
}

fn subclass_proxy_class(class: &Arc<ClassDescriptor>) -> ContainerResult<ClassDescriptor> {
    if class.is_sealed() {
        return Err(ContainerError::ProxyCreation {
            target: class.name().to_string(),
            reason: "class is sealed and cannot be subclassed".to_string(),
        });
    }

    let mut methods = Vec::new();
    let mut current = Some(class.as_ref());
    while let Some(level) = current {
        for descriptor in level.methods() {
            let method = descriptor.method.clone();
            let invoker = if descriptor.overridable {
                intercepting_invoker(method.clone())
            } else {
                forwarding_invoker(method.clone())
            };
            push_unique(&mut methods, MethodDescriptor::new(method, descriptor.overridable, invoker));
        }
        current = level.superclass().map(|s| s.as_ref());
    }

    let contracts = class.all_contracts();
    Ok(ClassDescriptor::synthetic(
        TypeInfo::of::<AopProxy>(),
        format!("{}$$SubclassProxy", class.name()),
        Some(Arc::clone(class)),
        contracts.iter().map(delegate_binding).collect(),
        methods,
    ))
}

/// 为目标源构建代理
///
/// 通知器列表中没有任何一个命中目标类时返回未包装的目标。
pub fn build_proxy(
    target_source: Arc<dyn TargetSource>,
    advisors: Vec<Advisor>,
    force_subclass: bool,
) -> ContainerResult<ObjectRef> {
    let class = target_source.target_class();
    if aop_utils::find_eligible_advisors(&advisors, &class).is_empty() {
        tracing::trace!("No advisor applies to class '{}', returning the target unwrapped", class.name());
        return target_source.get_target().map_err(ContainerError::from_user);
    }

    let contracts = class.all_contracts();
    let (kind, proxy_class) = if !force_subclass && !contracts.is_empty() {
        (ProxyKind::Interface, interface_proxy_class(&class, &contracts))
    } else {
        (ProxyKind::Subclass, subclass_proxy_class(&class)?)
    };
    tracing::debug!(
        "Creating {:?} proxy '{}' with {} advisor(s)",
        kind,
        proxy_class.name(),
        advisors.len()
    );

    let config = AdvisedConfig::new(target_source)
        .with_advisors(advisors)
        .proxy_target_class(force_subclass);
    let proxy = AopProxy {
        config: Arc::new(config),
        kind,
    };
    Ok(ObjectRef::new(Arc::new(proxy), Arc::new(proxy_class)))
}

/// 代理工厂
///
/// # 示例
///
/// ```
/// use std::sync::Arc;
/// use beanstalk_core::prelude::*;
/// use beanstalk_aop::prelude::*;
/// use parking_lot::Mutex;
///
/// struct Greeter;
///
/// let class = ClassDescriptor::builder::<Greeter>()
///     .method("greet", &[ValueType::Str], |_: &Greeter, args| {
///         Ok(Value::Str(format!("Hello, {}", args.str(0)?)))
///     })
///     .build();
/// let target = ObjectRef::from_value(Greeter, class);
///
/// let calls = Arc::new(Mutex::new(0));
/// let counter = Arc::clone(&calls);
/// let proxy = ProxyFactory::new(target)
///     .add_advice(Advice::before(move |_| {
///         *counter.lock() += 1;
///         Ok(())
///     }))
///     .get_proxy()
///     .unwrap();
///
/// assert_eq!(proxy.invoke("greet", &[Value::from("Ada")]).unwrap(), Value::from("Hello, Ada"));
/// assert_eq!(*calls.lock(), 1);
/// ```
pub struct ProxyFactory {
    target_source: Arc<dyn TargetSource>,
    advisors: Vec<Advisor>,
    proxy_target_class: bool,
}

impl ProxyFactory {
    pub fn new(target: ObjectRef) -> Self {
        Self::with_target_source(Arc::new(SingletonTargetSource::new(target)))
    }

    pub fn with_target_source(target_source: Arc<dyn TargetSource>) -> Self {
        Self {
            target_source,
            advisors: Vec::new(),
            proxy_target_class: false,
        }
    }

    pub fn add_advisor(mut self, advisor: Advisor) -> Self {
        self.advisors.push(advisor);
        self
    }

    /// 添加作用于所有方法的通知
    pub fn add_advice(self, advice: Advice) -> Self {
        let name = format!("advice#{}", self.advisors.len());
        self.add_advisor(Advisor::for_all(name, advice))
    }

    /// 强制使用子类代理
    pub fn proxy_target_class(mut self, force: bool) -> Self {
        self.proxy_target_class = force;
        self
    }

    pub fn get_proxy(self) -> ContainerResult<ObjectRef> {
        build_proxy(self.target_source, self.advisors, self.proxy_target_class)
    }
}
