//! 容器
//!
//! [`Container`] 把定义注册表、作用域、暂存缓存、构造器解析、属性填充和生命周期执行器
//! 组合起来实现 `get_bean`：
//!
//! 1. 解析规范名称（去掉 `&` 前缀并沿别名链解析）
//! 2. 单例先查暂存缓存，当前线程正在创建它时取早期引用
//! 3. 初始化 `depends_on` 声明的 Bean
//! 4. 按作用域分派：单例由暂存缓存保证只创建一次，原型每次新建，自定义作用域交给 [`Scope`]
//! 5. FactoryBean 返回它生产的对象，`&name` 返回工厂本身
//!
//! 所有缓存都是容器实例的字段，不存在全局状态。

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::Instant;

use anyhow::anyhow;
use parking_lot::{Mutex, RwLock};

use crate::bean::{BeanDefinition, BeanReference};
use crate::bean_factory::{
    BeanFactory, ConfigurableBeanFactory, ConfigurableListableBeanFactory, ListableBeanFactory,
};
use crate::config::ContainerConfig;
use crate::constants::{
    is_factory_dereference, strip_factory_prefix, FACTORY_BEAN_PREFIX, SCOPE_PROTOTYPE, SCOPE_SINGLETON,
};
use crate::constructor_resolver::ConstructorResolver;
use crate::error::{ContainerError, ContainerResult, DestroyFailure};
use crate::lifecycle::{BeanFactoryPostProcessor, BeanPostProcessor, DisposableBeanAdapter, LifecycleInvoker};
use crate::object::ObjectRef;
use crate::property_populator::PropertyPopulator;
use crate::registry::DefinitionRegistry;
use crate::scope::{Scope, ScopeStrategy};
use crate::staged_cache::{StagedObjectCache, StagedState};
use crate::utils::dependency::{validate_dependency_graph, DependencyValidationError};
use crate::utils::naming::to_camel_case;
use crate::value::{DefaultTypeConverter, TypeConverter, TypeInfo, Value};

fn is_singleton_scope(scope: &str) -> bool {
    scope.is_empty() || scope == SCOPE_SINGLETON
}

/// 非单例 Bean 的创建标记
///
/// 同一线程重入创建同名原型（或自定义作用域）Bean 时立即失败，离开作用域时清除标记。
struct PrototypeCreationGuard<'a> {
    container: &'a Container,
    name: String,
    thread: ThreadId,
}

impl<'a> PrototypeCreationGuard<'a> {
    fn enter(container: &'a Container, name: &str) -> ContainerResult<Self> {
        let thread = thread::current().id();
        let mut in_creation = container.prototypes_in_creation.lock();
        let stack = in_creation.entry(thread).or_default();
        if stack.iter().any(|n| n == name) {
            let mut chain = stack.clone();
            chain.push(name.to_string());
            return Err(ContainerError::CircularDependency(format!(
                "Requested prototype bean '{}' is currently in creation ({})",
                name,
                chain.join(" -> ")
            )));
        }
        stack.push(name.to_string());
        Ok(Self {
            container,
            name: name.to_string(),
            thread,
        })
    }
}

impl Drop for PrototypeCreationGuard<'_> {
    fn drop(&mut self) {
        let mut in_creation = self.container.prototypes_in_creation.lock();
        if let Some(stack) = in_creation.get_mut(&self.thread) {
            if let Some(pos) = stack.iter().rposition(|n| *n == self.name) {
                stack.remove(pos);
            }
            if stack.is_empty() {
                in_creation.remove(&self.thread);
            }
        }
    }
}

/// Bean 容器
///
/// 通过 [`Container::new`] 或 [`Container::with_config`] 创建，返回 `Arc<Container>`，
/// 可以在线程间共享。
///
/// # 示例
///
/// ```
/// use beanstalk_core::prelude::*;
///
/// struct Greeter {
///     greeting: parking_lot::RwLock<String>,
/// }
///
/// let class = ClassDescriptor::builder::<Greeter>()
///     .default_constructor(|| Greeter { greeting: parking_lot::RwLock::new(String::new()) })
///     .property("greeting", ValueType::Str, |g: &Greeter, v: Value| {
///         *g.greeting.write() = v.as_str().unwrap_or_default().to_string();
///         Ok(())
///     })
///     .build();
///
/// let container = Container::new();
/// container
///     .register_bean_definition(
///         "greeter",
///         BeanDefinition::new(class).with_property_literal("greeting", "hello"),
///     )
///     .unwrap();
///
/// let greeter = container.get_bean_as::<Greeter>("greeter").unwrap();
/// assert_eq!(*greeter.greeting.read(), "hello");
/// ```
pub struct Container {
    config: ContainerConfig,
    registry: DefinitionRegistry,
    singletons: StagedObjectCache,
    scopes: RwLock<HashMap<String, Arc<dyn Scope>>>,
    prototypes_in_creation: Mutex<HashMap<ThreadId, Vec<String>>>,
    /// 单例 FactoryBean 生产的对象
    factory_products: Mutex<HashMap<String, ObjectRef>>,
    post_processors: RwLock<Vec<Arc<dyn BeanPostProcessor>>>,
    factory_post_processors: RwLock<Vec<Arc<dyn BeanFactoryPostProcessor>>>,
    converter: RwLock<Arc<dyn TypeConverter>>,
    self_ref: Weak<Container>,
}

impl Container {
    pub fn new() -> Arc<Self> {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            registry: DefinitionRegistry::new(config.allow_bean_definition_overriding),
            config,
            singletons: StagedObjectCache::new(),
            scopes: RwLock::new(HashMap::new()),
            prototypes_in_creation: Mutex::new(HashMap::new()),
            factory_products: Mutex::new(HashMap::new()),
            post_processors: RwLock::new(Vec::new()),
            factory_post_processors: RwLock::new(Vec::new()),
            converter: RwLock::new(Arc::new(DefaultTypeConverter)),
            self_ref: self_ref.clone(),
        })
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 指向自身的共享引用，容器正在被释放时为 `None`
    pub fn shared(&self) -> Option<Arc<Container>> {
        self.self_ref.upgrade()
    }

    pub fn type_converter(&self) -> Arc<dyn TypeConverter> {
        Arc::clone(&*self.converter.read())
    }

    pub fn set_type_converter(&self, converter: Arc<dyn TypeConverter>) {
        *self.converter.write() = converter;
    }

    pub fn add_bean_factory_post_processor(&self, processor: Arc<dyn BeanFactoryPostProcessor>) {
        let mut processors = self.factory_post_processors.write();
        tracing::debug!("Added bean factory post-processor '{}'", processor.name());
        processors.push(processor);
        processors.sort_by_key(|p| p.order());
    }

    /// 运行 BeanFactoryPostProcessor，然后预实例化所有非延迟单例
    pub fn refresh(&self) -> ContainerResult<()> {
        let started = Instant::now();

        let factory_processors = self.factory_post_processors.read().clone();
        for processor in &factory_processors {
            tracing::debug!("Invoking bean factory post-processor '{}'", processor.name());
            processor.post_process_bean_factory(self)?;
        }

        self.preinstantiate_singletons()?;

        tracing::info!(
            "Container refreshed in {:?} with {} bean definition(s) and {} singleton(s)",
            started.elapsed(),
            self.registry.count(),
            self.singletons.singleton_count()
        );
        Ok(())
    }

    /// 静态检查构造器引用和 `depends_on` 组成的依赖图
    ///
    /// 这些依赖无法通过早期引用满足，存在环或缺失的 Bean 时返回错误。
    pub fn validate_dependencies(&self) -> ContainerResult<()> {
        let mut graph: HashMap<String, Vec<String>> = HashMap::new();
        for name in self.registry.names() {
            let Some(definition) = self.registry.get(&name) else {
                continue;
            };
            let dependencies = definition
                .depends_on()
                .iter()
                .map(String::as_str)
                .chain(definition.constructor_references())
                .map(|dep| self.registry.canonical_name(dep))
                .collect();
            graph.insert(name, dependencies);
        }
        for name in self.singletons.singleton_names() {
            graph.entry(name).or_default();
        }

        validate_dependency_graph(&graph).map_err(|e| match e {
            DependencyValidationError::CircularDependency { .. } => {
                ContainerError::CircularDependency(e.to_string())
            }
            DependencyValidationError::MissingDependency { .. } => ContainerError::Other(anyhow!(e.to_string())),
        })?;

        tracing::info!("Dependency validation passed for {} bean(s)", graph.len());
        Ok(())
    }

    /// 销毁单个单例及依赖它的单例
    pub fn destroy_singleton(&self, name: &str) -> ContainerResult<()> {
        let name = self.transformed_bean_name(name);
        let mut failures = Vec::new();
        self.singletons.destroy_singleton(&name, &mut failures);
        self.factory_products.lock().remove(&name);
        Self::failures_to_result(failures)
    }

    pub fn staged_state(&self, name: &str) -> StagedState {
        self.singletons.state_of(&self.transformed_bean_name(name))
    }

    pub fn is_currently_in_creation(&self, name: &str) -> bool {
        self.singletons.is_in_creation(&self.transformed_bean_name(name))
    }

    /// 依赖 `name` 的 Bean
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.singletons.dependents_of(&self.transformed_bean_name(name))
    }

    /// `name` 依赖的 Bean
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.singletons.dependencies_of(&self.transformed_bean_name(name))
    }

    /// 已就绪的单例名称，按就绪顺序
    pub fn singleton_names(&self) -> Vec<String> {
        self.singletons.singleton_names()
    }

    pub(crate) fn post_processor_snapshot(&self) -> Vec<Arc<dyn BeanPostProcessor>> {
        self.post_processors.read().clone()
    }

    fn transformed_bean_name(&self, name: &str) -> String {
        self.registry.canonical_name(strip_factory_prefix(name))
    }

    fn failures_to_result(failures: Vec<DestroyFailure>) -> ContainerResult<()> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContainerError::DestroyInvocation { failures })
        }
    }

    fn resolve_scope(&self, scope: &str) -> ContainerResult<ScopeStrategy> {
        match scope {
            "" | SCOPE_SINGLETON => Ok(ScopeStrategy::Singleton),
            SCOPE_PROTOTYPE => Ok(ScopeStrategy::Prototype),
            other => self
                .scopes
                .read()
                .get(other)
                .cloned()
                .map(|scope| ScopeStrategy::Custom(other.to_string(), scope))
                .ok_or_else(|| ContainerError::NoSuchScope(other.to_string())),
        }
    }

    fn do_get_bean(&self, name: &str, args: Option<&[Value]>) -> ContainerResult<ObjectRef> {
        let bean_name = self.transformed_bean_name(name);

        if args.is_none() {
            let shared = self
                .singletons
                .get_singleton(&bean_name, self.config.allow_circular_references)?;
            if let Some(shared) = shared {
                if self.singletons.is_in_creation(&bean_name) {
                    tracing::trace!(
                        "Returning eagerly cached instance of singleton bean '{}' that is not fully initialized yet - a consequence of a circular reference",
                        bean_name
                    );
                } else {
                    tracing::trace!("Returning cached instance of singleton bean '{}'", bean_name);
                }
                return self.object_for_instance(shared, name, &bean_name);
            }
        }

        let Some(definition) = self.registry.get(&bean_name) else {
            if let Some(manual) = self.singletons.get_ready(&bean_name) {
                return self.object_for_instance(manual, name, &bean_name);
            }
            return Err(ContainerError::BeanNotFound(name.to_string()));
        };

        self.initialize_depends_on(&bean_name, &definition)?;

        let scope = self.resolve_scope(definition.scope())?;
        let object = match &scope {
            ScopeStrategy::Singleton => self.singletons.get_or_create(&bean_name, || {
                tracing::debug!("Creating shared instance of singleton bean '{}'", bean_name);
                self.create_bean(&bean_name, &definition, &scope, args)
            })?,
            ScopeStrategy::Prototype => {
                let _guard = PrototypeCreationGuard::enter(self, &bean_name)?;
                tracing::trace!("Creating instance of prototype bean '{}'", bean_name);
                self.create_bean(&bean_name, &definition, &scope, args)?
            }
            ScopeStrategy::Custom(scope_name, custom) => {
                let mut factory = || -> ContainerResult<ObjectRef> {
                    let _guard = PrototypeCreationGuard::enter(self, &bean_name)?;
                    tracing::trace!("Creating instance of bean '{}' in scope '{}'", bean_name, scope_name);
                    self.create_bean(&bean_name, &definition, &scope, args)
                };
                custom.get(&bean_name, &mut factory)?
            }
        };

        self.object_for_instance(object, name, &bean_name)
    }

    fn initialize_depends_on(&self, bean_name: &str, definition: &BeanDefinition) -> ContainerResult<()> {
        for dep in definition.depends_on() {
            let dep = self.registry.canonical_name(dep);
            if self.singletons.is_dependent(bean_name, &dep) {
                return Err(ContainerError::CircularDependency(format!(
                    "Circular depends-on relationship between '{}' and '{}'",
                    bean_name, dep
                )));
            }
            self.singletons.register_dependent(&dep, bean_name);
            self.get_bean(&dep).map_err(|e| {
                if e.is_not_found() {
                    ContainerError::BeanCreation {
                        name: bean_name.to_string(),
                        source: Box::new(ContainerError::Other(anyhow!(
                            "'{}' depends on missing bean '{}'",
                            bean_name,
                            dep
                        ))),
                    }
                } else {
                    e
                }
            })?;
        }
        Ok(())
    }

    fn create_bean(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        scope: &ScopeStrategy,
        args: Option<&[Value]>,
    ) -> ContainerResult<ObjectRef> {
        self.do_create_bean(bean_name, definition, scope, args)
            .map_err(|e| ContainerError::wrap_creation(bean_name, e))
    }

    fn do_create_bean(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        scope: &ScopeStrategy,
        args: Option<&[Value]>,
    ) -> ContainerResult<ObjectRef> {
        let raw = ConstructorResolver::new(self).instantiate(bean_name, definition, args)?;

        let early_exposure = matches!(scope, ScopeStrategy::Singleton)
            && self.config.allow_circular_references
            && self.singletons.is_created_by_current_thread(bean_name);
        if early_exposure {
            tracing::trace!(
                "Eagerly caching bean '{}' to allow for resolving potential circular references",
                bean_name
            );
            let processors = self.post_processor_snapshot();
            let early_raw = raw.clone();
            let early_name = bean_name.to_string();
            self.singletons.add_singleton_factory(
                bean_name,
                Box::new(move || LifecycleInvoker::early_bean_reference(&processors, early_raw, &early_name)),
            );
        }

        PropertyPopulator::new(self).populate(bean_name, definition, &raw)?;
        let mut exposed = LifecycleInvoker::new(self).initialize(bean_name, definition, raw.clone())?;

        if early_exposure {
            if let Some(early) = self.singletons.early_reference(bean_name) {
                if ObjectRef::ptr_eq(&exposed, &raw) {
                    exposed = early;
                } else if !self.config.allow_raw_injection_despite_wrapping {
                    let dependents = self.singletons.dependents_of(bean_name);
                    if !dependents.is_empty() {
                        return Err(ContainerError::Other(anyhow!(
                            "Bean with name '{}' has been injected into other beans [{}] in its raw version as part of a circular reference, but has eventually been wrapped",
                            bean_name,
                            dependents.join(", ")
                        )));
                    }
                }
            }
        }

        self.register_disposable_if_necessary(bean_name, definition, &raw, scope);
        Ok(exposed)
    }

    fn register_disposable_if_necessary(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        bean: &ObjectRef,
        scope: &ScopeStrategy,
    ) {
        if matches!(scope, ScopeStrategy::Prototype) {
            return;
        }
        let processors = self.post_processor_snapshot();
        let Some(adapter) = DisposableBeanAdapter::for_bean(bean_name, bean, definition, &processors) else {
            return;
        };
        match scope {
            ScopeStrategy::Singleton => {
                self.singletons
                    .register_disposable(bean_name, Box::new(move || adapter.destroy()));
            }
            ScopeStrategy::Custom(_, custom) => {
                custom.register_destruction_callback(bean_name, Box::new(move || adapter.destroy()));
            }
            ScopeStrategy::Prototype => {}
        }
    }

    /// FactoryBean 解引用：`&name` 返回工厂本身，否则返回工厂生产的对象
    fn object_for_instance(
        &self,
        instance: ObjectRef,
        requested_name: &str,
        bean_name: &str,
    ) -> ContainerResult<ObjectRef> {
        if is_factory_dereference(requested_name) {
            if !instance.class().is_factory_bean() {
                return Err(ContainerError::TypeMismatch {
                    target: format!("bean '{}'", bean_name),
                    expected: "factory bean".to_string(),
                    found: instance.class_name().to_string(),
                });
            }
            return Ok(instance);
        }

        let class = Arc::clone(instance.class());
        let Some(factory) = class.factory() else {
            return Ok(instance);
        };

        if factory.singleton && self.singletons.contains_ready(bean_name) {
            if let Some(product) = self.factory_products.lock().get(bean_name) {
                return Ok(product.clone());
            }
            let product = self.object_from_factory(&instance, bean_name)?;
            let mut products = self.factory_products.lock();
            return Ok(products.entry(bean_name.to_string()).or_insert(product).clone());
        }
        self.object_from_factory(&instance, bean_name)
    }

    fn object_from_factory(&self, factory_bean: &ObjectRef, bean_name: &str) -> ContainerResult<ObjectRef> {
        let Some(factory) = factory_bean.class().factory() else {
            return Ok(factory_bean.clone());
        };
        tracing::trace!("Obtaining object from factory bean '{}'", bean_name);
        let mut product = (factory.get_object)(factory_bean)
            .map_err(|e| ContainerError::wrap_creation(bean_name, ContainerError::from_user(e)))?;
        for processor in self.post_processor_snapshot() {
            product = processor.post_process_after_initialization(product, bean_name)?;
        }
        Ok(product)
    }

    fn invalidate_cached_instance(&self, name: &str, previous_scope: Option<&str>) {
        let mut failures = Vec::new();
        self.singletons.destroy_singleton(name, &mut failures);
        self.factory_products.lock().remove(name);
        if let Some(scope_name) = previous_scope.filter(|s| !is_singleton_scope(s) && *s != SCOPE_PROTOTYPE) {
            let scope = self.scopes.read().get(scope_name).cloned();
            if let Some(scope) = scope {
                scope.remove(name);
            }
        }
        for failure in failures {
            tracing::warn!("Failed to destroy invalidated bean '{}': {}", failure.bean_name, failure.message);
        }
    }

    pub(crate) fn resolve_reference(&self, current: &str, reference: &BeanReference) -> ContainerResult<ObjectRef> {
        self.fetch_dependency(current, reference.name())
    }

    /// 获取依赖并登记依赖关系
    pub(crate) fn fetch_dependency(&self, current: &str, name: &str) -> ContainerResult<ObjectRef> {
        let object = self.get_bean(name)?;
        self.singletons
            .register_dependent(&self.transformed_bean_name(name), current);
        Ok(object)
    }

    /// 名称对应的 Bean 能否作为 `ty` 使用
    ///
    /// 已就绪的实例（可能是代理）优先于定义中的类；FactoryBean 只有在产品已缓存时才参与匹配。
    pub(crate) fn is_type_match(&self, name: &str, ty: &TypeInfo) -> bool {
        let bean_name = self.transformed_bean_name(name);
        if let Some(object) = self.singletons.get_ready(&bean_name) {
            if !object.class().is_factory_bean() {
                return object.is_instance_of(ty);
            }
            return self
                .factory_products
                .lock()
                .get(&bean_name)
                .map(|product| product.is_instance_of(ty))
                .unwrap_or(false);
        }
        self.registry
            .get(&bean_name)
            .map(|d| !d.class().is_factory_bean() && d.class().is_assignable_to(ty))
            .unwrap_or(false)
    }

    /// 可以注入为 `ty` 的候选 Bean，排除 `exclude` 和不参与自动装配的定义
    pub(crate) fn autowire_candidates(&self, ty: &TypeInfo, exclude: &str) -> Vec<String> {
        self.get_bean_names_for_type(ty)
            .into_iter()
            .filter(|name| name != exclude)
            .filter(|name| {
                self.registry
                    .get(name)
                    .map(|d| d.is_autowire_candidate())
                    .unwrap_or(true)
            })
            .collect()
    }

    /// 候选中唯一的 primary Bean
    pub(crate) fn primary_candidate(&self, candidates: &[String]) -> Option<String> {
        let mut primaries = candidates.iter().filter(|name| {
            self.registry
                .get(name)
                .map(|d| d.is_primary())
                .unwrap_or(false)
        });
        match (primaries.next(), primaries.next()) {
            (Some(primary), None) => Some(primary.clone()),
            _ => None,
        }
    }

    /// 为构造器参数确定依赖名称：参数名、唯一类型匹配（含 primary）、类型名的小驼峰形式
    pub(crate) fn resolve_dependency_name(&self, current: &str, param: &str, ty: &TypeInfo) -> Option<String> {
        if self.transformed_bean_name(param) != current && self.is_type_match(param, ty) {
            return Some(param.to_string());
        }

        let mut candidates = self.autowire_candidates(ty, current);
        if candidates.len() == 1 {
            return candidates.pop();
        }
        if candidates.len() > 1 {
            if let Some(primary) = self.primary_candidate(&candidates) {
                return Some(primary);
            }
        }

        let conventional = to_camel_case(ty.name());
        (conventional != current && self.is_type_match(&conventional, ty)).then_some(conventional)
    }
}

impl BeanFactory for Container {
    fn get_bean(&self, name: &str) -> ContainerResult<ObjectRef> {
        self.do_get_bean(name, None)
    }

    fn get_bean_with_args(&self, name: &str, args: &[Value]) -> ContainerResult<ObjectRef> {
        self.do_get_bean(name, Some(args))
    }

    fn get_bean_of_required_type(&self, name: &str, required: &TypeInfo) -> ContainerResult<ObjectRef> {
        let object = self.get_bean(name)?;
        if !object.is_instance_of(required) {
            return Err(ContainerError::TypeMismatch {
                target: format!("bean '{}'", name),
                expected: required.name().to_string(),
                found: object.class_name().to_string(),
            });
        }
        Ok(object)
    }

    fn contains_bean(&self, name: &str) -> bool {
        let bean_name = self.transformed_bean_name(name);
        self.registry.contains(&bean_name) || self.singletons.contains_ready(&bean_name)
    }

    fn is_singleton(&self, name: &str) -> ContainerResult<bool> {
        let bean_name = self.transformed_bean_name(name);
        match self.registry.get(&bean_name) {
            Some(definition) => {
                let shared = is_singleton_scope(definition.scope());
                match definition.class().factory() {
                    Some(factory) if !is_factory_dereference(name) => Ok(shared && factory.singleton),
                    _ => Ok(shared),
                }
            }
            None if self.singletons.contains_ready(&bean_name) => Ok(true),
            None => Err(ContainerError::BeanNotFound(name.to_string())),
        }
    }

    fn is_prototype(&self, name: &str) -> ContainerResult<bool> {
        let bean_name = self.transformed_bean_name(name);
        match self.registry.get(&bean_name) {
            Some(definition) => Ok(definition.scope() == SCOPE_PROTOTYPE),
            None if self.singletons.contains_ready(&bean_name) => Ok(false),
            None => Err(ContainerError::BeanNotFound(name.to_string())),
        }
    }

    fn get_aliases(&self, name: &str) -> Vec<String> {
        let requested = strip_factory_prefix(name);
        let canonical = self.registry.canonical_name(requested);
        let mut aliases: Vec<String> = self
            .registry
            .aliases_of(&canonical)
            .into_iter()
            .filter(|alias| alias != requested)
            .collect();
        if canonical != requested {
            aliases.insert(0, canonical);
        }
        aliases
    }
}

impl ListableBeanFactory for Container {
    fn get_bean_definition_names(&self) -> Vec<String> {
        self.registry.names()
    }

    fn get_bean_definition_count(&self) -> usize {
        self.registry.count()
    }

    fn contains_bean_definition(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    fn get_bean_names_for_type(&self, ty: &TypeInfo) -> Vec<String> {
        let mut names: Vec<String> = self
            .registry
            .names()
            .into_iter()
            .filter(|name| self.is_type_match(name, ty))
            .collect();
        for name in self.singletons.singleton_names() {
            if !self.registry.contains(&name) && !names.contains(&name) && self.is_type_match(&name, ty) {
                names.push(name);
            }
        }
        names
    }

    fn get_bean_of_type(&self, ty: &TypeInfo) -> ContainerResult<ObjectRef> {
        let candidates = self.get_bean_names_for_type(ty);
        match candidates.len() {
            1 => self.get_bean(&candidates[0]),
            _ => match self.primary_candidate(&candidates) {
                Some(primary) => self.get_bean(&primary),
                None => Err(ContainerError::NoUniqueBean {
                    type_name: ty.name().to_string(),
                    candidates,
                }),
            },
        }
    }

    fn get_beans_of_type(&self, ty: &TypeInfo) -> ContainerResult<Vec<(String, ObjectRef)>> {
        self.get_bean_names_for_type(ty)
            .into_iter()
            .map(|name| self.get_bean(&name).map(|object| (name, object)))
            .collect()
    }
}

impl ConfigurableBeanFactory for Container {
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()> {
        tracing::trace!("Registering bean definition '{}' of class '{}'", name, definition.class().name());
        let previous = self.registry.register(name, definition)?;
        if previous.is_some() || self.singletons.contains_ready(name) {
            self.invalidate_cached_instance(name, previous.as_ref().map(BeanDefinition::scope));
        }
        Ok(())
    }

    fn remove_bean_definition(&self, name: &str) -> ContainerResult<()> {
        let removed = self.registry.remove(name)?;
        self.invalidate_cached_instance(name, Some(removed.scope()));
        tracing::debug!("Removed bean definition '{}'", name);
        Ok(())
    }

    fn get_bean_definition(&self, name: &str) -> ContainerResult<BeanDefinition> {
        let bean_name = self.transformed_bean_name(name);
        self.registry
            .get(&bean_name)
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))
    }

    fn register_alias(&self, name: &str, alias: &str) -> ContainerResult<()> {
        self.registry.register_alias(name, alias)
    }

    fn register_singleton(&self, name: &str, object: ObjectRef) -> ContainerResult<()> {
        self.singletons.register_manual(name, object)?;
        tracing::debug!("Registered singleton '{}'", name);
        Ok(())
    }

    fn register_scope(&self, name: &str, scope: Arc<dyn Scope>) -> ContainerResult<()> {
        if name.is_empty() || name == SCOPE_SINGLETON || name == SCOPE_PROTOTYPE {
            return Err(ContainerError::Other(anyhow!(
                "Cannot replace existing scopes 'singleton' and 'prototype'"
            )));
        }
        if self.scopes.write().insert(name.to_string(), scope).is_some() {
            tracing::debug!("Replacing scope '{}'", name);
        } else {
            tracing::debug!("Registered scope '{}'", name);
        }
        Ok(())
    }

    fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        let mut processors = self.post_processors.write();
        tracing::debug!(
            "Added bean post-processor '{}' with order {}",
            processor.name(),
            processor.order()
        );
        processors.push(processor);
        processors.sort_by_key(|p| p.order());
    }

    fn get_bean_post_processors(&self) -> Vec<Arc<dyn BeanPostProcessor>> {
        self.post_processor_snapshot()
    }

    fn destroy_bean(&self, name: &str, bean: &ObjectRef) -> ContainerResult<()> {
        let bean_name = self.transformed_bean_name(name);
        let definition = self
            .registry
            .get(&bean_name)
            .unwrap_or_else(|| BeanDefinition::new(Arc::clone(bean.class())));
        let processors = self.post_processor_snapshot();
        let Some(adapter) = DisposableBeanAdapter::for_bean(&bean_name, bean, &definition, &processors) else {
            return Ok(());
        };
        adapter.destroy().map_err(|e| ContainerError::DestroyInvocation {
            failures: vec![DestroyFailure {
                bean_name,
                message: e.to_string(),
            }],
        })
    }

    fn destroy_scoped_bean(&self, name: &str) -> ContainerResult<()> {
        let bean_name = self.transformed_bean_name(name);
        let definition = self
            .registry
            .get(&bean_name)
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))?;
        match self.resolve_scope(definition.scope())? {
            ScopeStrategy::Custom(scope_name, scope) => {
                if scope.remove(&bean_name).is_some() {
                    tracing::debug!("Destroyed bean '{}' in scope '{}'", bean_name, scope_name);
                }
                Ok(())
            }
            other => Err(ContainerError::Other(anyhow!(
                "Bean '{}' has scope '{}', scoped destruction needs a custom scope",
                bean_name,
                other.name()
            ))),
        }
    }

    fn destroy_singletons(&self) -> ContainerResult<()> {
        tracing::info!("Destroying {} singleton(s)", self.singletons.singleton_count());
        let failures = self.singletons.destroy_all();
        self.factory_products.lock().clear();
        Self::failures_to_result(failures)
    }
}

impl ConfigurableListableBeanFactory for Container {
    fn preinstantiate_singletons(&self) -> ContainerResult<()> {
        let names = self.registry.names();
        tracing::debug!("Pre-instantiating singletons: {:?}", names);
        for name in names {
            let Some(definition) = self.registry.get(&name) else {
                continue;
            };
            if definition.is_lazy_init() || !is_singleton_scope(definition.scope()) {
                continue;
            }
            if definition.class().is_factory_bean() {
                self.get_bean(&format!("{}{}", FACTORY_BEAN_PREFIX, name))?;
            } else {
                self.get_bean(&name)?;
            }
        }
        Ok(())
    }

    fn freeze_configuration(&self) {
        self.registry.freeze();
        tracing::debug!("Bean definition configuration frozen");
    }

    fn is_configuration_frozen(&self) -> bool {
        self.registry.is_frozen()
    }

    fn set_bean_scope(&self, name: &str, scope: &str) -> ContainerResult<()> {
        let bean_name = self.transformed_bean_name(name);
        let before = self.registry.update(
            &bean_name,
            &format!("change scope of bean '{}'", bean_name),
            |definition| definition.set_scope(scope),
        )?;
        if before.scope() != scope {
            tracing::debug!(
                "Scope of bean '{}' changed from '{}' to '{}'",
                bean_name,
                before.scope(),
                scope
            );
            self.invalidate_cached_instance(&bean_name, Some(before.scope()));
        }
        Ok(())
    }

    fn set_bean_attribute(&self, name: &str, key: &str, value: &str) -> ContainerResult<()> {
        let bean_name = self.transformed_bean_name(name);
        self.registry.update(
            &bean_name,
            &format!("set attribute '{}' of bean '{}'", key, bean_name),
            |definition| definition.set_attribute(key, value),
        )?;
        Ok(())
    }
}
