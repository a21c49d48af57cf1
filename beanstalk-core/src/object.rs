//! 容器管理的对象引用

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;

use crate::class::{ClassDescriptor, InvokeResult, Method};
use crate::value::{TypeInfo, Value};

/// 类型擦除的实例
pub type AnyObject = Arc<dyn Any + Send + Sync>;

/// 对象引用：实例加上它的类描述符
///
/// 克隆只增加引用计数；两个引用是否指向同一对象用 [`ObjectRef::ptr_eq`] 判断。
#[derive(Clone)]
pub struct ObjectRef {
    instance: AnyObject,
    class: Arc<ClassDescriptor>,
}

impl ObjectRef {
    pub fn new(instance: AnyObject, class: Arc<ClassDescriptor>) -> Self {
        Self { instance, class }
    }

    /// 包装一个新值
    pub fn from_value<T: Any + Send + Sync>(value: T, class: Arc<ClassDescriptor>) -> Self {
        debug_assert_eq!(
            ClassDescriptor::type_id(&class),
            TypeId::of::<T>(),
            "class '{}' does not describe the wrapped value",
            class.name()
        );
        Self::new(Arc::new(value), class)
    }

    pub fn instance(&self) -> &AnyObject {
        &self.instance
    }

    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.instance).downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }

    pub fn is_instance_of(&self, ty: &TypeInfo) -> bool {
        self.class.is_assignable_to(ty)
    }

    /// 以契约 `C` 的形式取出对象
    ///
    /// 普通对象通过类上声明的转换取出；接口代理通过契约的委托工厂取出，
    /// 调用会经过拦截链。
    pub fn as_contract<C: ?Sized + 'static>(&self) -> Option<Arc<C>> {
        let binding = self.class.contract_binding(TypeId::of::<C>())?;
        let boxed = (binding.cast)(self)?;
        boxed.downcast::<Arc<C>>().ok().map(|contract| *contract)
    }

    /// 按名称调用方法
    pub fn invoke(&self, name: &str, args: &[Value]) -> InvokeResult {
        let descriptor = self.class.find_method(name, args).ok_or_else(|| {
            anyhow!(
                "No method '{}' on class '{}' accepts arguments {:?}",
                name,
                self.class.name(),
                args
            )
        })?;
        (descriptor.invoker)(self, args)
    }

    /// 按签名调用方法
    pub fn invoke_method(&self, method: &Method, args: &[Value]) -> InvokeResult {
        let descriptor = self.class.method_by_signature(method).ok_or_else(|| {
            anyhow!("Method {} is not declared on class '{}'", method, self.class.name())
        })?;
        (descriptor.invoker)(self, args)
    }

    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&a.instance) as *const (),
            Arc::as_ptr(&b.instance) as *const (),
        )
    }

    /// 实例地址，用于日志
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.instance) as *const () as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.class.name(), self.identity())
    }
}
