use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use beanstalk_aop::prelude::*;
use beanstalk_core::prelude::*;

struct Alpha {
    beta: OnceLock<ObjectRef>,
}

struct Beta {
    alpha: OnceLock<ObjectRef>,
}

struct Clock;

fn set_once(cell: &OnceLock<ObjectRef>, value: Value) -> anyhow::Result<()> {
    let object = value.into_object().ok_or_else(|| anyhow!("expected an object"))?;
    cell.set(object).map_err(|_| anyhow!("property already set"))
}

fn alpha_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<Alpha>()
        .default_constructor(|| Alpha { beta: OnceLock::new() })
        .property("beta", ValueType::object::<Beta>(), |a: &Alpha, v: Value| set_once(&a.beta, v))
        .method("ping", &[], |_: &Alpha, _| Ok(Value::from("alpha")))
        .build()
}

fn beta_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<Beta>()
        .default_constructor(|| Beta { alpha: OnceLock::new() })
        .property("alpha", ValueType::object::<Alpha>(), |b: &Beta, v: Value| set_once(&b.alpha, v))
        .method("ping", &[], |_: &Beta, _| Ok(Value::from("beta")))
        .build()
}

fn clock_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<Clock>()
        .default_constructor(|| Clock)
        .method("now", &[], |_: &Clock, _| Ok(Value::Int(42)))
        .build()
}

fn advised_container(calls: &Arc<AtomicUsize>) -> Arc<Container> {
    let registry = Arc::new(AdvisorRegistry::new());
    let counter = Arc::clone(calls);
    registry.register(
        Advisor::with_expression(
            "pings",
            "within(Alpha) || within(Beta)",
            Advice::before(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap(),
    );

    let container = Container::new();
    container.add_bean_post_processor(Arc::new(AutoProxyCreator::new(registry)));
    container
        .register_bean_definition("alpha", BeanDefinition::new(alpha_class()).with_property_ref("beta", "beta"))
        .unwrap();
    container
        .register_bean_definition("beta", BeanDefinition::new(beta_class()).with_property_ref("alpha", "alpha"))
        .unwrap();
    container
        .register_bean_definition("clock", BeanDefinition::new(clock_class()))
        .unwrap();
    container
}

fn raw_target(proxy: &ObjectRef) -> ObjectRef {
    aop_utils::advised(proxy)
        .expect("bean should be proxied")
        .target_source()
        .get_target()
        .unwrap()
}

#[test]
fn test_setter_cycle_sees_proxies_on_both_sides() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = advised_container(&calls);

    let alpha = container.get_bean("alpha").unwrap();
    let beta = container.get_bean("beta").unwrap();
    assert!(aop_utils::is_aop_proxy(&alpha));
    assert!(aop_utils::is_aop_proxy(&beta));

    let raw_beta = raw_target(&beta).downcast::<Beta>().unwrap();
    assert!(ObjectRef::ptr_eq(raw_beta.alpha.get().unwrap(), &alpha));
    let raw_alpha = raw_target(&alpha).downcast::<Alpha>().unwrap();
    assert!(ObjectRef::ptr_eq(raw_alpha.beta.get().unwrap(), &beta));

    // 再次获取得到同一个代理
    assert!(ObjectRef::ptr_eq(&container.get_bean("alpha").unwrap(), &alpha));
}

#[test]
fn test_advice_fires_through_injected_proxy() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = advised_container(&calls);

    let beta = container.get_bean("beta").unwrap();
    let raw_beta = raw_target(&beta).downcast::<Beta>().unwrap();
    let injected_alpha = raw_beta.alpha.get().unwrap();

    assert_eq!(injected_alpha.invoke("ping", &[]).unwrap(), Value::from("alpha"));
    assert_eq!(beta.invoke("ping", &[]).unwrap(), Value::from("beta"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unadvised_bean_is_not_proxied() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = advised_container(&calls);

    let clock = container.get_bean("clock").unwrap();
    assert!(!aop_utils::is_aop_proxy(&clock));
    assert!(clock.downcast::<Clock>().is_some());
    assert_eq!(clock.invoke("now", &[]).unwrap(), Value::Int(42));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_proxied_bean_is_found_by_type() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = advised_container(&calls);
    container.refresh().unwrap();

    let by_type = container.get_bean_of_type(&TypeInfo::of::<Alpha>()).unwrap();
    assert!(ObjectRef::ptr_eq(&by_type, &container.get_bean("alpha").unwrap()));
    assert_eq!(aop_utils::ultimate_target_class(&by_type).name(), "Alpha");
}
