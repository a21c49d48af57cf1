//! Bean Factory - 核心容器接口
//!
//! 接口按能力分层：只读访问、带泛型的便捷访问、可列举、可配置。
//! [`Container`](crate::container::Container) 实现全部接口。

use std::any::Any;
use std::sync::Arc;

use crate::bean::BeanDefinition;
use crate::error::{ContainerError, ContainerResult};
use crate::lifecycle::BeanPostProcessor;
use crate::object::ObjectRef;
use crate::scope::Scope;
use crate::value::{TypeInfo, Value};

/// BeanFactory - 最基础的容器接口
///
/// 注意：此 trait 不包含泛型方法，因此可以作为 trait object 使用
pub trait BeanFactory: Send + Sync {
    /// 按名称或别名获取 Bean；`&name` 获取 FactoryBean 本身
    fn get_bean(&self, name: &str) -> ContainerResult<ObjectRef>;

    /// 以显式构造器参数获取 Bean
    fn get_bean_with_args(&self, name: &str, args: &[Value]) -> ContainerResult<ObjectRef>;

    /// 获取 Bean 并检查它可以作为 `required` 使用
    fn get_bean_of_required_type(&self, name: &str, required: &TypeInfo) -> ContainerResult<ObjectRef>;

    fn contains_bean(&self, name: &str) -> bool;

    fn is_singleton(&self, name: &str) -> ContainerResult<bool>;

    fn is_prototype(&self, name: &str) -> ContainerResult<bool>;

    fn get_aliases(&self, name: &str) -> Vec<String>;
}

/// ListableBeanFactory - 可列举的 Bean 工厂
pub trait ListableBeanFactory: BeanFactory {
    /// 按注册顺序返回所有定义名称
    fn get_bean_definition_names(&self) -> Vec<String>;

    fn get_bean_definition_count(&self) -> usize;

    fn contains_bean_definition(&self, name: &str) -> bool;

    /// 可以作为 `ty` 使用的 Bean 名称
    fn get_bean_names_for_type(&self, ty: &TypeInfo) -> Vec<String>;

    /// 按类型获取唯一的 Bean，多个候选时取唯一的 primary
    fn get_bean_of_type(&self, ty: &TypeInfo) -> ContainerResult<ObjectRef>;

    fn get_beans_of_type(&self, ty: &TypeInfo) -> ContainerResult<Vec<(String, ObjectRef)>>;
}

/// BeanFactoryExt - 提供泛型方法，不能作为 trait object 使用
pub trait BeanFactoryExt: ListableBeanFactory {
    /// 获取 Bean 并还原为具体类型
    fn get_bean_as<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        let object = self.get_bean(name)?;
        object.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
            target: format!("bean '{}'", name),
            expected: TypeInfo::of::<T>().name().to_string(),
            found: object.class_name().to_string(),
        })
    }

    /// 以契约形式获取 Bean，代理也适用
    fn get_contract<C: ?Sized + 'static>(&self, name: &str) -> ContainerResult<Arc<C>> {
        let object = self.get_bean(name)?;
        object.as_contract::<C>().ok_or_else(|| ContainerError::TypeMismatch {
            target: format!("bean '{}'", name),
            expected: TypeInfo::of::<C>().name().to_string(),
            found: object.class_name().to_string(),
        })
    }

    /// 按类型获取唯一的 Bean
    fn get_bean_by_type<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        let ty = TypeInfo::of::<T>();
        let object = self.get_bean_of_type(&ty)?;
        object.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
            target: format!("bean of type '{}'", ty),
            expected: ty.name().to_string(),
            found: object.class_name().to_string(),
        })
    }
}

impl<F: ListableBeanFactory + ?Sized> BeanFactoryExt for F {}

/// ConfigurableBeanFactory - 可配置的 Bean 工厂
pub trait ConfigurableBeanFactory: BeanFactory {
    /// 注册定义；覆盖已有定义时会销毁旧实例
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()>;

    fn remove_bean_definition(&self, name: &str) -> ContainerResult<()>;

    fn get_bean_definition(&self, name: &str) -> ContainerResult<BeanDefinition>;

    fn register_alias(&self, name: &str, alias: &str) -> ContainerResult<()>;

    /// 注册外部创建的单例
    fn register_singleton(&self, name: &str, object: ObjectRef) -> ContainerResult<()>;

    fn register_scope(&self, name: &str, scope: Arc<dyn Scope>) -> ContainerResult<()>;

    /// 添加后置处理器，按 `order()` 排序
    fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>);

    fn get_bean_post_processors(&self) -> Vec<Arc<dyn BeanPostProcessor>>;

    /// 销毁调用方持有的实例（通常是原型）
    fn destroy_bean(&self, name: &str, bean: &ObjectRef) -> ContainerResult<()>;

    /// 从自定义作用域移除并销毁实例
    fn destroy_scoped_bean(&self, name: &str) -> ContainerResult<()>;

    /// 按注册的逆序销毁所有单例
    fn destroy_singletons(&self) -> ContainerResult<()>;
}

/// ConfigurableListableBeanFactory - 可配置且可列举的 Bean 工厂
///
/// 这是 BeanFactoryPostProcessor 接收的参数类型
pub trait ConfigurableListableBeanFactory: ListableBeanFactory + ConfigurableBeanFactory {
    /// 预实例化所有非延迟单例
    fn preinstantiate_singletons(&self) -> ContainerResult<()>;

    fn freeze_configuration(&self);

    fn is_configuration_frozen(&self) -> bool;

    /// 修改作用域；作用域变化时丢弃已缓存的实例
    fn set_bean_scope(&self, name: &str, scope: &str) -> ContainerResult<()>;

    fn set_bean_attribute(&self, name: &str, key: &str, value: &str) -> ContainerResult<()>;
}
