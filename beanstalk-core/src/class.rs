//! 类描述符
//!
//! 容器不依赖编译期反射，每个可管理的类型通过 [`ClassBuilder`] 注册一个
//! [`ClassDescriptor`]：构造器、可写属性、可调用方法、实现的契约（trait）、
//! 生命周期回调以及可选的 FactoryBean 行为。代理类也由描述符表示，
//! 因此代理与普通对象走同一条调用路径。

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::anyhow;

use crate::container::Container;
use crate::object::{AnyObject, ObjectRef};
use crate::value::{TypeInfo, Value, ValueType};

/// 方法调用结果
pub type InvokeResult = anyhow::Result<Value>;

/// 方法实现：接收目标对象和参数
pub type MethodInvoker = Arc<dyn Fn(&ObjectRef, &[Value]) -> InvokeResult + Send + Sync>;

/// 构造器实现
pub type Instantiator = Arc<dyn Fn(Args<'_>) -> anyhow::Result<AnyObject> + Send + Sync>;

/// setter 或字段写入器
pub type PropertyWriter = Arc<dyn Fn(&ObjectRef, Value) -> anyhow::Result<()> + Send + Sync>;

/// 把对象视为某个契约，返回装箱的 `Arc<dyn Contract>`
pub type ContractCast = Arc<dyn Fn(&ObjectRef) -> Option<Box<dyn Any>> + Send + Sync>;

/// 为接口代理生成契约实现，返回装箱的 `Arc<dyn Contract>`
pub type ContractDelegate = Arc<dyn Fn(ObjectRef) -> Box<dyn Any> + Send + Sync>;

pub type ObjectHook = Arc<dyn Fn(&ObjectRef) -> anyhow::Result<()> + Send + Sync>;
pub type NameAwareHook = Arc<dyn Fn(&ObjectRef, &str) -> anyhow::Result<()> + Send + Sync>;
pub type ContainerAwareHook =
    Arc<dyn Fn(&ObjectRef, &Arc<Container>) -> anyhow::Result<()> + Send + Sync>;
pub type FactoryHook = Arc<dyn Fn(&ObjectRef) -> anyhow::Result<ObjectRef> + Send + Sync>;

/// 方法签名
///
/// 同名同参数类型的方法签名相同；`declaring` 记录声明它的类或契约，
/// 参与相等性比较，因此同一签名在不同类型上是不同的方法。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Method {
    declaring: TypeInfo,
    name: String,
    params: Vec<ValueType>,
}

impl Method {
    pub fn new(declaring: TypeInfo, name: impl Into<String>, params: Vec<ValueType>) -> Self {
        Self {
            declaring,
            name: name.into(),
            params,
        }
    }

    pub fn declaring(&self) -> &TypeInfo {
        &self.declaring
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn same_signature(&self, other: &Method) -> bool {
        self.name == other.name && self.params == other.params
    }

    /// 实参的个数与类型是否匹配
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(ty, arg)| {
                    arg.conforms_to(ty) || matches!((arg, ty), (Value::Int(_), ValueType::Float))
                })
    }

    /// 同一签名在另一个类型上的方法
    pub fn with_declaring(&self, declaring: TypeInfo) -> Method {
        Method {
            declaring,
            name: self.name.clone(),
            params: self.params.clone(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(f, "{}::{}({})", self.declaring.name(), self.name, params.join(", "))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// 类上声明的方法
#[derive(Clone)]
pub struct MethodDescriptor {
    pub method: Method,
    /// final 方法不能被子类代理拦截
    pub overridable: bool,
    pub invoker: MethodInvoker,
}

impl MethodDescriptor {
    pub fn new(method: Method, overridable: bool, invoker: MethodInvoker) -> Self {
        Self {
            method,
            overridable,
            invoker,
        }
    }
}

/// 构造器参数
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    pub name: String,
    pub ty: ValueType,
}

#[derive(Clone)]
pub struct ConstructorDescriptor {
    pub params: Vec<ParamDescriptor>,
    pub instantiate: Instantiator,
}

impl ConstructorDescriptor {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// 可写属性，setter 优先于字段写入
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: ValueType,
    pub setter: Option<PropertyWriter>,
    pub field: Option<PropertyWriter>,
}

impl PropertyDescriptor {
    pub fn is_writable(&self) -> bool {
        self.setter.is_some() || self.field.is_some()
    }
}

/// 契约（trait）描述符
///
/// 列出契约上的方法签名，可选地提供一个委托工厂：
/// 给定一个把调用转发到拦截链的对象，生成该契约的实现，
/// 接口代理据此也能以 `Arc<dyn Contract>` 的形式被取出。
pub struct ContractDescriptor {
    info: TypeInfo,
    methods: Vec<Method>,
    delegate: Option<ContractDelegate>,
}

impl ContractDescriptor {
    pub fn builder<C: ?Sized + 'static>() -> ContractBuilder<C> {
        ContractBuilder {
            info: TypeInfo::of::<C>(),
            methods: Vec::new(),
            delegate: None,
            _marker: PhantomData,
        }
    }

    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn delegate(&self) -> Option<&ContractDelegate> {
        self.delegate.as_ref()
    }

    pub fn find_method(&self, signature: &Method) -> Option<&Method> {
        self.methods.iter().find(|m| m.same_signature(signature))
    }
}

impl fmt::Debug for ContractDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractDescriptor")
            .field("info", &self.info)
            .field("methods", &self.methods)
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}

pub struct ContractBuilder<C: ?Sized> {
    info: TypeInfo,
    methods: Vec<Method>,
    delegate: Option<ContractDelegate>,
    _marker: PhantomData<fn(&C)>,
}

impl<C: ?Sized + 'static> ContractBuilder<C> {
    pub fn method(mut self, name: &str, params: &[ValueType]) -> Self {
        self.methods.push(Method::new(self.info, name, params.to_vec()));
        self
    }

    /// 接口代理使用的契约实现工厂
    pub fn delegate<F>(mut self, factory: F) -> Self
    where
        F: Fn(ObjectRef) -> Arc<C> + Send + Sync + 'static,
    {
        self.delegate = Some(Arc::new(move |proxy| Box::new(factory(proxy)) as Box<dyn Any>));
        self
    }

    pub fn build(self) -> Arc<ContractDescriptor> {
        Arc::new(ContractDescriptor {
            info: self.info,
            methods: self.methods,
            delegate: self.delegate,
        })
    }
}

/// 类对某个契约的实现
#[derive(Clone)]
pub struct ContractBinding {
    pub contract: Arc<ContractDescriptor>,
    pub cast: ContractCast,
}

impl ContractBinding {
    pub fn new(contract: Arc<ContractDescriptor>, cast: ContractCast) -> Self {
        Self { contract, cast }
    }
}

/// 生命周期回调
#[derive(Clone, Default)]
pub struct ClassLifecycle {
    pub bean_name_aware: Option<NameAwareHook>,
    pub container_aware: Option<ContainerAwareHook>,
    pub after_properties_set: Option<ObjectHook>,
    pub on_destroy: Option<ObjectHook>,
}

/// FactoryBean 行为：容器返回 `get_object` 的产物，`&name` 返回工厂本身
#[derive(Clone)]
pub struct FactoryBeanDescriptor {
    pub singleton: bool,
    pub get_object: FactoryHook,
}

/// 类描述符
pub struct ClassDescriptor {
    info: TypeInfo,
    name: String,
    superclass: Option<Arc<ClassDescriptor>>,
    contracts: Vec<ContractBinding>,
    constructors: Vec<ConstructorDescriptor>,
    properties: Vec<PropertyDescriptor>,
    methods: Vec<MethodDescriptor>,
    lifecycle: ClassLifecycle,
    factory: Option<FactoryBeanDescriptor>,
    sealed: bool,
}

impl ClassDescriptor {
    pub fn builder<T: Any + Send + Sync>() -> ClassBuilder<T> {
        ClassBuilder::new()
    }

    /// 合成类（代理）
    ///
    /// 合成类没有构造器、属性和生命周期回调，实例由代理工厂直接创建。
    pub fn synthetic(
        info: TypeInfo,
        name: impl Into<String>,
        superclass: Option<Arc<ClassDescriptor>>,
        contracts: Vec<ContractBinding>,
        methods: Vec<MethodDescriptor>,
    ) -> Self {
        Self {
            info,
            name: name.into(),
            superclass,
            contracts,
            constructors: Vec::new(),
            properties: Vec::new(),
            methods,
            lifecycle: ClassLifecycle::default(),
            factory: None,
            sealed: true,
        }
    }

    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.info.id()
    }

    pub fn superclass(&self) -> Option<&Arc<ClassDescriptor>> {
        self.superclass.as_ref()
    }

    pub fn contracts(&self) -> &[ContractBinding] {
        &self.contracts
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    pub fn default_constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructors.iter().find(|c| c.params.is_empty())
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn lifecycle(&self) -> &ClassLifecycle {
        &self.lifecycle
    }

    pub fn factory(&self) -> Option<&FactoryBeanDescriptor> {
        self.factory.as_ref()
    }

    pub fn is_factory_bean(&self) -> bool {
        self.factory.is_some()
    }

    /// 不允许子类代理
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// 按名称和实参查找方法，先查本类再查父类
    pub fn find_method(&self, name: &str, args: &[Value]) -> Option<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.method.name() == name && m.method.accepts(args))
            .or_else(|| self.superclass.as_ref().and_then(|s| s.find_method(name, args)))
    }

    /// 按签名查找方法，忽略声明类型
    pub fn method_by_signature(&self, signature: &Method) -> Option<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.method.same_signature(signature))
            .or_else(|| {
                self.superclass
                    .as_ref()
                    .and_then(|s| s.method_by_signature(signature))
            })
    }

    pub fn contract_binding(&self, contract: TypeId) -> Option<&ContractBinding> {
        self.contracts
            .iter()
            .find(|b| b.contract.info().id() == contract)
            .or_else(|| {
                self.superclass
                    .as_ref()
                    .and_then(|s| s.contract_binding(contract))
            })
    }

    /// 所有契约，包括父类实现的
    pub fn all_contracts(&self) -> Vec<Arc<ContractDescriptor>> {
        let mut result: Vec<Arc<ContractDescriptor>> = Vec::new();
        let mut current = Some(self);
        while let Some(class) = current {
            for binding in &class.contracts {
                if !result.iter().any(|c| c.info() == binding.contract.info()) {
                    result.push(Arc::clone(&binding.contract));
                }
            }
            current = class.superclass.as_deref();
        }
        result
    }

    /// 本类、父类链或任一契约与 `ty` 相同
    pub fn is_assignable_to(&self, ty: &TypeInfo) -> bool {
        if self.info == *ty || self.contracts.iter().any(|b| b.contract.info() == ty) {
            return true;
        }
        self.superclass
            .as_ref()
            .map(|s| s.is_assignable_to(ty))
            .unwrap_or(false)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name().to_string()))
            .field(
                "contracts",
                &self.contracts.iter().map(|b| *b.contract.info()).collect::<Vec<_>>(),
            )
            .field("constructors", &self.constructors.len())
            .field(
                "properties",
                &self.properties.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            )
            .field(
                "methods",
                &self.methods.iter().map(|m| &m.method).collect::<Vec<_>>(),
            )
            .field("sealed", &self.sealed)
            .finish()
    }
}

/// 构造器与方法实参的只读视图，提供带类型的访问
#[derive(Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn get(&self, index: usize) -> anyhow::Result<&'a Value> {
        self.values
            .get(index)
            .ok_or_else(|| anyhow!("missing argument #{}", index))
    }

    pub fn str(&self, index: usize) -> anyhow::Result<&'a str> {
        let value = self.get(index)?;
        value
            .as_str()
            .ok_or_else(|| anyhow!("argument #{} is {}, expected str", index, value.kind()))
    }

    pub fn int(&self, index: usize) -> anyhow::Result<i64> {
        let value = self.get(index)?;
        value
            .as_i64()
            .ok_or_else(|| anyhow!("argument #{} is {}, expected int", index, value.kind()))
    }

    pub fn float(&self, index: usize) -> anyhow::Result<f64> {
        let value = self.get(index)?;
        value
            .as_f64()
            .ok_or_else(|| anyhow!("argument #{} is {}, expected float", index, value.kind()))
    }

    pub fn bool(&self, index: usize) -> anyhow::Result<bool> {
        let value = self.get(index)?;
        value
            .as_bool()
            .ok_or_else(|| anyhow!("argument #{} is {}, expected bool", index, value.kind()))
    }

    pub fn object(&self, index: usize) -> anyhow::Result<ObjectRef> {
        let value = self.get(index)?;
        value
            .as_object()
            .cloned()
            .ok_or_else(|| anyhow!("argument #{} is {}, expected object", index, value.kind()))
    }

    /// 取出具体类型的对象
    pub fn bean<T: Any + Send + Sync>(&self, index: usize) -> anyhow::Result<Arc<T>> {
        let object = self.object(index)?;
        object.downcast::<T>().ok_or_else(|| {
            anyhow!(
                "argument #{} is {}, expected {}",
                index,
                object.class().name(),
                TypeInfo::of::<T>()
            )
        })
    }

    /// 以契约形式取出对象，适用于代理
    pub fn contract<C: ?Sized + 'static>(&self, index: usize) -> anyhow::Result<Arc<C>> {
        let object = self.object(index)?;
        object.as_contract::<C>().ok_or_else(|| {
            anyhow!(
                "argument #{} is {}, which does not implement {}",
                index,
                object.class().name(),
                TypeInfo::of::<C>()
            )
        })
    }
}

fn target_of<T: Any>(object: &ObjectRef) -> anyhow::Result<&T> {
    object.downcast_ref::<T>().ok_or_else(|| {
        anyhow!(
            "object of class '{}' is not a {}",
            object.class().name(),
            TypeInfo::of::<T>()
        )
    })
}

/// 类描述符构建器
///
/// # 示例
///
/// ```
/// use beanstalk_core::prelude::*;
/// use parking_lot::Mutex;
///
/// struct Counter {
///     step: Mutex<i64>,
///     total: Mutex<i64>,
/// }
///
/// let class = ClassDescriptor::builder::<Counter>()
///     .default_constructor(|| Counter { step: Mutex::new(1), total: Mutex::new(0) })
///     .property("step", ValueType::Int, |c: &Counter, v| {
///         *c.step.lock() = v.as_i64().unwrap_or(1);
///         Ok(())
///     })
///     .method("increment", &[], |c: &Counter, _args| {
///         let mut total = c.total.lock();
///         *total += *c.step.lock();
///         Ok(Value::Int(*total))
///     })
///     .build();
///
/// assert_eq!(class.name(), "Counter");
/// assert!(class.property("step").is_some());
/// ```
pub struct ClassBuilder<T> {
    class: ClassDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    fn new() -> Self {
        let info = TypeInfo::of::<T>();
        Self {
            class: ClassDescriptor {
                info,
                name: info.name().to_string(),
                superclass: None,
                contracts: Vec::new(),
                constructors: Vec::new(),
                properties: Vec::new(),
                methods: Vec::new(),
                lifecycle: ClassLifecycle::default(),
                factory: None,
                sealed: false,
            },
            _marker: PhantomData,
        }
    }

    /// 覆盖显示名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.class.name = name.into();
        self
    }

    pub fn constructor<F>(mut self, params: &[(&str, ValueType)], f: F) -> Self
    where
        F: Fn(Args<'_>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let instantiate: Instantiator =
            Arc::new(move |args: Args<'_>| -> anyhow::Result<AnyObject> { Ok(Arc::new(f(args)?)) });
        self.class.constructors.push(ConstructorDescriptor {
            params: params
                .iter()
                .map(|(name, ty)| ParamDescriptor {
                    name: (*name).to_string(),
                    ty: *ty,
                })
                .collect(),
            instantiate,
        });
        self
    }

    pub fn default_constructor<F>(self, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructor(&[], move |_| Ok(f()))
    }

    fn property_entry(&mut self, name: &str, ty: ValueType) -> &mut PropertyDescriptor {
        let index = match self.class.properties.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.class.properties.push(PropertyDescriptor {
                    name: name.to_string(),
                    ty,
                    setter: None,
                    field: None,
                });
                self.class.properties.len() - 1
            }
        };
        &mut self.class.properties[index]
    }

    /// 通过 setter 写入的属性
    pub fn property<F>(mut self, name: &str, ty: ValueType, setter: F) -> Self
    where
        F: Fn(&T, Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let writer: PropertyWriter =
            Arc::new(move |object: &ObjectRef, value: Value| setter(target_of::<T>(object)?, value));
        self.property_entry(name, ty).setter = Some(writer);
        self
    }

    /// 直接写字段的属性，没有 setter 时使用
    pub fn field<F>(mut self, name: &str, ty: ValueType, write: F) -> Self
    where
        F: Fn(&T, Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let writer: PropertyWriter =
            Arc::new(move |object: &ObjectRef, value: Value| write(target_of::<T>(object)?, value));
        self.property_entry(name, ty).field = Some(writer);
        self
    }

    fn push_method<F>(mut self, name: &str, params: &[ValueType], overridable: bool, f: F) -> Self
    where
        F: Fn(&T, Args<'_>) -> InvokeResult + Send + Sync + 'static,
    {
        let invoker: MethodInvoker = Arc::new(move |object: &ObjectRef, args: &[Value]| {
            f(target_of::<T>(object)?, Args::new(args))
        });
        self.class.methods.push(MethodDescriptor::new(
            Method::new(self.class.info, name, params.to_vec()),
            overridable,
            invoker,
        ));
        self
    }

    /// 可被代理拦截的方法
    pub fn method<F>(self, name: &str, params: &[ValueType], f: F) -> Self
    where
        F: Fn(&T, Args<'_>) -> InvokeResult + Send + Sync + 'static,
    {
        self.push_method(name, params, true, f)
    }

    /// 不可重写的方法，子类代理直接转发
    pub fn final_method<F>(self, name: &str, params: &[ValueType], f: F) -> Self
    where
        F: Fn(&T, Args<'_>) -> InvokeResult + Send + Sync + 'static,
    {
        self.push_method(name, params, false, f)
    }

    /// 声明实现契约 `C`，`cast` 把具体实例转换为 `Arc<dyn C>`
    pub fn implements<C, F>(mut self, contract: &Arc<ContractDescriptor>, cast: F) -> Self
    where
        C: ?Sized + 'static,
        F: Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
    {
        debug_assert!(
            contract.info().is::<C>(),
            "contract descriptor {} does not describe the cast target",
            contract.info()
        );
        let cast: ContractCast = Arc::new(move |object: &ObjectRef| {
            object
                .downcast::<T>()
                .map(|concrete| Box::new(cast(concrete)) as Box<dyn Any>)
        });
        self.class
            .contracts
            .push(ContractBinding::new(Arc::clone(contract), cast));
        self
    }

    pub fn bean_name_aware<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &str) + Send + Sync + 'static,
    {
        self.class.lifecycle.bean_name_aware = Some(Arc::new(
            move |object: &ObjectRef, name: &str| -> anyhow::Result<()> {
                f(target_of::<T>(object)?, name);
                Ok(())
            },
        ));
        self
    }

    pub fn container_aware<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &Arc<Container>) + Send + Sync + 'static,
    {
        self.class.lifecycle.container_aware = Some(Arc::new(
            move |object: &ObjectRef, container: &Arc<Container>| -> anyhow::Result<()> {
                f(target_of::<T>(object)?, container);
                Ok(())
            },
        ));
        self
    }

    /// 属性填充完成后调用
    pub fn after_properties_set<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.class.lifecycle.after_properties_set =
            Some(Arc::new(move |object: &ObjectRef| f(target_of::<T>(object)?)));
        self
    }

    pub fn on_destroy<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.class.lifecycle.on_destroy =
            Some(Arc::new(move |object: &ObjectRef| f(target_of::<T>(object)?)));
        self
    }

    /// 声明为 FactoryBean
    pub fn factory_bean<F>(mut self, singleton: bool, get_object: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<ObjectRef> + Send + Sync + 'static,
    {
        self.class.factory = Some(FactoryBeanDescriptor {
            singleton,
            get_object: Arc::new(move |object: &ObjectRef| get_object(target_of::<T>(object)?)),
        });
        self
    }

    /// 禁止子类代理
    pub fn sealed(mut self) -> Self {
        self.class.sealed = true;
        self
    }

    pub fn build(self) -> Arc<ClassDescriptor> {
        Arc::new(self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    trait Named: Send + Sync {
        fn label(&self) -> String;
    }

    struct Widget {
        label: Mutex<String>,
    }

    impl Named for Widget {
        fn label(&self) -> String {
            self.label.lock().clone()
        }
    }

    fn named_contract() -> Arc<ContractDescriptor> {
        ContractDescriptor::builder::<dyn Named>()
            .method("label", &[])
            .build()
    }

    fn widget_class() -> Arc<ClassDescriptor> {
        ClassDescriptor::builder::<Widget>()
            .constructor(&[("label", ValueType::Str)], |args| {
                Ok(Widget { label: Mutex::new(args.str(0)?.to_string()) })
            })
            .default_constructor(|| Widget { label: Mutex::new("default".into()) })
            .property("label", ValueType::Str, |w: &Widget, v| {
                *w.label.lock() = v.to_string();
                Ok(())
            })
            .method("label", &[], |w: &Widget, _| Ok(Value::Str(w.label())))
            .final_method("describe", &[ValueType::Str], |w: &Widget, args| {
                Ok(Value::Str(format!("{}: {}", args.str(0)?, w.label())))
            })
            .implements::<dyn Named, _>(&named_contract(), |w| w as Arc<dyn Named>)
            .build()
    }

    #[test]
    fn test_builder_collects_members() {
        let class = widget_class();
        assert_eq!(class.name(), "Widget");
        assert_eq!(class.constructors().len(), 2);
        assert!(class.default_constructor().is_some());
        assert!(class.property("label").map(|p| p.is_writable()).unwrap_or(false));
        assert_eq!(class.methods().len(), 2);
        assert!(!class.methods()[1].overridable);
        assert!(class.is_assignable_to(&TypeInfo::of::<Widget>()));
        assert!(class.is_assignable_to(&TypeInfo::of::<dyn Named>()));
        assert!(!class.is_assignable_to(&TypeInfo::of::<String>()));
    }

    #[test]
    fn test_method_lookup_and_signature() {
        let class = widget_class();
        let found = class
            .find_method("describe", &[Value::from("w")])
            .map(|m| m.method.to_string());
        assert_eq!(found.as_deref(), Some("Widget::describe(str)"));
        assert!(class.find_method("describe", &[]).is_none());

        let contract_method = Method::new(TypeInfo::of::<dyn Named>(), "label", vec![]);
        assert!(class.method_by_signature(&contract_method).is_some());
        assert_ne!(contract_method, class.methods()[0].method);
        assert!(contract_method.same_signature(&class.methods()[0].method));
    }

    #[test]
    fn test_args_accessors() {
        let values = vec![Value::from("x"), Value::Int(3), Value::Bool(true)];
        let args = Args::new(&values);
        assert_eq!(args.str(0).unwrap(), "x");
        assert_eq!(args.int(1).unwrap(), 3);
        assert_eq!(args.float(1).unwrap(), 3.0);
        assert!(args.bool(2).unwrap());
        assert!(args.int(0).is_err());
        assert!(args.get(5).is_err());
    }
}
