/// 容器常量定义
///
/// 作用域名称、FactoryBean 解引用前缀以及后置处理器的排序值，
/// 在容器与切面模块中共享，避免硬编码字符串不一致

/// 单例作用域名称
pub const SCOPE_SINGLETON: &str = "singleton";

/// 原型作用域名称
pub const SCOPE_PROTOTYPE: &str = "prototype";

/// `&name` 表示获取 FactoryBean 本身而不是它生产的对象
pub const FACTORY_BEAN_PREFIX: &str = "&";

/// 后置处理器的默认优先级
pub const DEFAULT_PROCESSOR_ORDER: i32 = 1000;

/// 自动代理创建器的优先级，排在普通处理器之后
pub const AUTO_PROXY_PROCESSOR_ORDER: i32 = 2000;

pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// 判断名称是否为 FactoryBean 解引用形式
pub fn is_factory_dereference(name: &str) -> bool {
    name.starts_with(FACTORY_BEAN_PREFIX)
}

/// 去掉所有 `&` 前缀
pub fn strip_factory_prefix(name: &str) -> &str {
    name.trim_start_matches(FACTORY_BEAN_PREFIX)
}
