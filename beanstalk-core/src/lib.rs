// beanstalk-core: Bean 生命周期容器
//
// 按声明式定义构造、装配和销毁托管对象：
// - 单例、原型和自定义作用域
// - 构造器注入与 setter 注入，setter 循环依赖通过早期引用解决
// - 生命周期回调（Aware、初始化、销毁）与后置处理器
// - FactoryBean、别名、depends-on

pub mod bean;
pub mod bean_factory;
pub mod class;
pub mod config;
pub mod constants;
mod constructor_resolver;
pub mod container;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod object;
mod property_populator;
pub mod registry;
pub mod scope;
pub mod staged_cache;
pub mod utils;
pub mod value;

// 重新导出常用类型
pub use bean::{AutowireMode, BeanDefinition, BeanReference, PropertySpec, PropertyValue};
pub use bean_factory::{
    BeanFactory, BeanFactoryExt, ConfigurableBeanFactory, ConfigurableListableBeanFactory,
    ListableBeanFactory,
};
pub use class::{
    Args, ClassBuilder, ClassDescriptor, ContractBinding, ContractDescriptor, InvokeResult, Method,
    MethodDescriptor,
};
pub use config::ContainerConfig;
pub use constants::*;
pub use container::Container;
pub use error::{ApplicationResult, ContainerError, ContainerResult, DestroyFailure};
pub use lifecycle::{BeanFactoryPostProcessor, BeanPostProcessor, DisposableBeanAdapter};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use object::{AnyObject, ObjectRef};
pub use scope::{DestructionCallback, Scope, ScopeStrategy, ThreadScope};
pub use staged_cache::StagedState;
pub use value::{ConversionError, DefaultTypeConverter, TypeConverter, TypeInfo, Value, ValueType};

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::bean::{AutowireMode, BeanDefinition, BeanReference, PropertyValue};
    pub use crate::bean_factory::{
        BeanFactory, BeanFactoryExt, ConfigurableBeanFactory, ConfigurableListableBeanFactory,
        ListableBeanFactory,
    };
    pub use crate::class::{Args, ClassDescriptor, ContractDescriptor, InvokeResult, Method};
    pub use crate::config::ContainerConfig;
    pub use crate::container::Container;
    pub use crate::error::{ApplicationResult, ContainerError, ContainerResult};
    pub use crate::lifecycle::{BeanFactoryPostProcessor, BeanPostProcessor};
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::object::ObjectRef;
    pub use crate::scope::{Scope, ThreadScope};
    pub use crate::utils;
    pub use crate::value::{TypeInfo, Value, ValueType};
    // Re-export anyhow for convenience
    pub use anyhow::{anyhow, Context};
}
