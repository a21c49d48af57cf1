use std::sync::{Arc, OnceLock};
use std::thread;

use beanstalk_core::prelude::*;
use parking_lot::{Mutex, RwLock};

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

struct Counter;

fn counter_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<Counter>()
        .default_constructor(|| Counter)
        .build()
}

#[test]
fn test_singleton_identity_and_prototype_distinctness() {
    let container = Container::new();
    container
        .register_bean_definition("shared", BeanDefinition::new(counter_class()))
        .unwrap();
    container
        .register_bean_definition("fresh", BeanDefinition::new(counter_class()).prototype())
        .unwrap();

    let first = container.get_bean("shared").unwrap();
    let second = container.get_bean("shared").unwrap();
    assert!(ObjectRef::ptr_eq(&first, &second));

    let first = container.get_bean("fresh").unwrap();
    let second = container.get_bean("fresh").unwrap();
    assert!(!ObjectRef::ptr_eq(&first, &second));

    assert!(container.is_singleton("shared").unwrap());
    assert!(container.is_prototype("fresh").unwrap());
    assert!(container.get_bean("missing").unwrap_err().is_not_found());
}

struct Service {
    name: String,
    log: Log,
}

fn logging_class(log: &Log) -> Arc<ClassDescriptor> {
    let created = Arc::clone(log);
    ClassDescriptor::builder::<Service>()
        .constructor(&[("name", ValueType::Str)], move |args: Args<'_>| {
            Ok(Service {
                name: args.str(0)?.to_string(),
                log: Arc::clone(&created),
            })
        })
        .on_destroy(|s: &Service| {
            s.log.lock().push(s.name.clone());
            Ok(())
        })
        .build()
}

#[test]
fn test_destroy_runs_in_reverse_registration_order() {
    let log = new_log();
    let container = Container::new();
    for name in ["S1", "S2"] {
        container
            .register_bean_definition(name, BeanDefinition::new(logging_class(&log)).with_constructor_literal(name))
            .unwrap();
    }
    container.refresh().unwrap();

    container.destroy_singletons().unwrap();
    assert_eq!(*log.lock(), vec!["S2", "S1"]);
    assert_eq!(container.singleton_names(), Vec::<String>::new());
}

#[test]
fn test_destroy_failures_are_collected() {
    let log = new_log();
    let failing = ClassDescriptor::builder::<Counter>()
        .default_constructor(|| Counter)
        .method("close", &[], |_: &Counter, _| Err(anyhow!("socket already closed")))
        .build();

    let container = Container::new();
    container
        .register_bean_definition("S1", BeanDefinition::new(logging_class(&log)).with_constructor_literal("S1"))
        .unwrap();
    container
        .register_bean_definition("broken", BeanDefinition::new(failing).with_destroy_method("close"))
        .unwrap();
    container
        .register_bean_definition("S3", BeanDefinition::new(logging_class(&log)).with_constructor_literal("S3"))
        .unwrap();
    container.refresh().unwrap();

    let err = container.destroy_singletons().unwrap_err();
    match err {
        ContainerError::DestroyInvocation { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].bean_name, "broken");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(*log.lock(), vec!["S3", "S1"]);
}

#[derive(Debug)]
struct Repository {
    url: String,
}

struct UserService {
    repository: Arc<Repository>,
}

fn repository_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<Repository>()
        .constructor(&[("url", ValueType::Str)], |args: Args<'_>| {
            Ok(Repository {
                url: args.str(0)?.to_string(),
            })
        })
        .build()
}

fn user_service_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<UserService>()
        .constructor(&[("store", ValueType::object::<Repository>())], |args: Args<'_>| {
            Ok(UserService {
                repository: args.bean::<Repository>(0)?,
            })
        })
        .build()
}

fn repository(url: &str) -> BeanDefinition {
    BeanDefinition::new(repository_class()).with_constructor_literal(url)
}

#[test]
fn test_constructor_autowired_by_unique_type() {
    let container = Container::new();
    container
        .register_bean_definition("userRepository", repository("db://users"))
        .unwrap();
    container
        .register_bean_definition("userService", BeanDefinition::new(user_service_class()))
        .unwrap();

    let service = container.get_bean_as::<UserService>("userService").unwrap();
    assert_eq!(service.repository.url, "db://users");
    assert_eq!(container.dependents_of("userRepository"), vec!["userService"]);
}

#[test]
fn test_constructor_autowired_by_type_name_convention() {
    let container = Container::new();
    container.register_bean_definition("repository", repository("db://main")).unwrap();
    container.register_bean_definition("backup", repository("db://backup")).unwrap();
    container
        .register_bean_definition("userService", BeanDefinition::new(user_service_class()))
        .unwrap();

    let service = container.get_bean_as::<UserService>("userService").unwrap();
    assert_eq!(service.repository.url, "db://main");
}

#[test]
fn test_constructor_autowired_by_primary() {
    let container = Container::new();
    container.register_bean_definition("repository", repository("db://main")).unwrap();
    container
        .register_bean_definition("backup", repository("db://backup").with_primary(true))
        .unwrap();
    container
        .register_bean_definition("userService", BeanDefinition::new(user_service_class()))
        .unwrap();

    let service = container.get_bean_as::<UserService>("userService").unwrap();
    assert_eq!(service.repository.url, "db://backup");
    let by_type = container.get_bean_by_type::<Repository>().unwrap();
    assert_eq!(by_type.url, "db://backup");
}

#[test]
fn test_ambiguous_type_lookup() {
    let container = Container::new();
    container.register_bean_definition("one", repository("db://1")).unwrap();
    container.register_bean_definition("two", repository("db://2")).unwrap();

    let err = container.get_bean_by_type::<Repository>().unwrap_err();
    assert!(matches!(err, ContainerError::NoUniqueBean { ref candidates, .. } if candidates.len() == 2));
    assert_eq!(container.get_beans_of_type(&TypeInfo::of::<Repository>()).unwrap().len(), 2);
}

struct Server {
    host: String,
    port: i64,
}

#[test]
fn test_explicit_arguments_are_converted() {
    let class = ClassDescriptor::builder::<Server>()
        .constructor(&[("host", ValueType::Str), ("port", ValueType::Int)], |args: Args<'_>| {
            Ok(Server {
                host: args.str(0)?.to_string(),
                port: args.int(1)?,
            })
        })
        .build();
    let container = Container::new();
    container
        .register_bean_definition("server", BeanDefinition::new(class).prototype())
        .unwrap();

    let server = container
        .get_bean_with_args("server", &[Value::from("localhost"), Value::from("8080")])
        .unwrap();
    let server = server.downcast::<Server>().unwrap();
    assert_eq!(server.host, "localhost");
    assert_eq!(server.port, 8080);

    let err = container
        .get_bean_with_args("server", &[Value::from("localhost"), Value::from("eighty")])
        .unwrap_err();
    assert!(err.is_type_mismatch(), "unexpected error: {}", err);
}

struct Pool {
    size: RwLock<i64>,
    ratio: RwLock<f64>,
    name: RwLock<String>,
}

fn pool_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<Pool>()
        .default_constructor(|| Pool {
            size: RwLock::new(0),
            ratio: RwLock::new(0.0),
            name: RwLock::new(String::new()),
        })
        .property("size", ValueType::Int, |p: &Pool, v: Value| {
            *p.size.write() = v.as_i64().ok_or_else(|| anyhow!("size must be an int"))?;
            Ok(())
        })
        .property("ratio", ValueType::Float, |p: &Pool, v: Value| {
            *p.ratio.write() = v.as_f64().ok_or_else(|| anyhow!("ratio must be a float"))?;
            Ok(())
        })
        .field("name", ValueType::Str, |p: &Pool, v: Value| {
            *p.name.write() = v.as_str().unwrap_or_default().to_string();
            Ok(())
        })
        .build()
}

#[test]
fn test_literal_properties_converted_to_declared_types() {
    let container = Container::new();
    container
        .register_bean_definition(
            "pool",
            BeanDefinition::new(pool_class())
                .with_property_literal("size", "16")
                .with_property_literal("ratio", "0.75")
                .with_property_literal("name", "primary"),
        )
        .unwrap();

    let pool = container.get_bean_as::<Pool>("pool").unwrap();
    assert_eq!(*pool.size.read(), 16);
    assert_eq!(*pool.ratio.read(), 0.75);
    assert_eq!(*pool.name.read(), "primary");
}

#[test]
fn test_literal_conversion_failure_is_type_mismatch() {
    let container = Container::new();
    container
        .register_bean_definition(
            "pool",
            BeanDefinition::new(pool_class()).with_property_literal("size", "sixteen"),
        )
        .unwrap();

    let err = container.get_bean("pool").unwrap_err();
    assert!(err.is_type_mismatch());
    assert!(err.to_string().contains("property 'size' of bean 'pool'"));
}

#[test]
fn test_unknown_property_fails() {
    let container = Container::new();
    container
        .register_bean_definition("pool", BeanDefinition::new(pool_class()).with_property_literal("color", "red"))
        .unwrap();
    let err = container.get_bean("pool").unwrap_err();
    assert!(err.to_string().contains("no such property"));
}

struct Lifecycle {
    log: Log,
}

struct OrderedProcessor {
    label: &'static str,
    order: i32,
    log: Log,
}

impl BeanPostProcessor for OrderedProcessor {
    fn post_process_before_initialization(&self, bean: ObjectRef, bean_name: &str) -> ContainerResult<ObjectRef> {
        if bean_name == "lifecycle" {
            self.log.lock().push(format!("{}.before", self.label));
        }
        Ok(bean)
    }

    fn post_process_after_initialization(&self, bean: ObjectRef, bean_name: &str) -> ContainerResult<ObjectRef> {
        if bean_name == "lifecycle" {
            self.log.lock().push(format!("{}.after", self.label));
        }
        Ok(bean)
    }

    fn name(&self) -> &str {
        self.label
    }

    fn order(&self) -> i32 {
        self.order
    }
}

#[test]
fn test_initialization_callback_order() {
    let log = new_log();
    let created = Arc::clone(&log);
    let class = ClassDescriptor::builder::<Lifecycle>()
        .default_constructor(move || Lifecycle {
            log: Arc::clone(&created),
        })
        .bean_name_aware(|l: &Lifecycle, name: &str| l.log.lock().push(format!("name={}", name)))
        .container_aware(|l: &Lifecycle, _: &Arc<Container>| l.log.lock().push("container".into()))
        .after_properties_set(|l: &Lifecycle| {
            l.log.lock().push("after_properties_set".into());
            Ok(())
        })
        .method("start", &[], |l: &Lifecycle, _| {
            l.log.lock().push("start".into());
            Ok(Value::Unit)
        })
        .build();

    let container = Container::new();
    container.add_bean_post_processor(Arc::new(OrderedProcessor {
        label: "late",
        order: 10,
        log: Arc::clone(&log),
    }));
    container.add_bean_post_processor(Arc::new(OrderedProcessor {
        label: "early",
        order: 5,
        log: Arc::clone(&log),
    }));
    container
        .register_bean_definition("lifecycle", BeanDefinition::new(class).with_init_method("start"))
        .unwrap();

    container.get_bean("lifecycle").unwrap();
    assert_eq!(
        *log.lock(),
        vec![
            "name=lifecycle",
            "container",
            "early.before",
            "late.before",
            "after_properties_set",
            "start",
            "early.after",
            "late.after",
        ]
    );
}

#[test]
fn test_missing_init_method_fails_creation() {
    let container = Container::new();
    container
        .register_bean_definition("counter", BeanDefinition::new(counter_class()).with_init_method("warm_up"))
        .unwrap();
    let err = container.get_bean("counter").unwrap_err();
    assert!(err.to_string().contains("init method named 'warm_up'"));
}

struct DataSource {
    log: Log,
}

struct Dao {
    log: Log,
    data_source: OnceLock<ObjectRef>,
}

#[test]
fn test_dependents_destroyed_before_their_dependencies() {
    let log = new_log();
    let ds_log = Arc::clone(&log);
    let data_source = ClassDescriptor::builder::<DataSource>()
        .default_constructor(move || DataSource {
            log: Arc::clone(&ds_log),
        })
        .on_destroy(|d: &DataSource| {
            d.log.lock().push("dataSource".into());
            Ok(())
        })
        .build();
    let dao_log = Arc::clone(&log);
    let dao = ClassDescriptor::builder::<Dao>()
        .default_constructor(move || Dao {
            log: Arc::clone(&dao_log),
            data_source: OnceLock::new(),
        })
        .property("dataSource", ValueType::object::<DataSource>(), |d: &Dao, v: Value| {
            let object = v.into_object().ok_or_else(|| anyhow!("expected an object"))?;
            d.data_source.set(object).map_err(|_| anyhow!("already set"))
        })
        .on_destroy(|d: &Dao| {
            d.log.lock().push("dao".into());
            Ok(())
        })
        .build();

    let container = Container::new();
    container
        .register_bean_definition("dao", BeanDefinition::new(dao).with_property_ref("dataSource", "dataSource"))
        .unwrap();
    container
        .register_bean_definition("dataSource", BeanDefinition::new(data_source))
        .unwrap();
    container.refresh().unwrap();

    container.destroy_singleton("dataSource").unwrap();
    assert_eq!(*log.lock(), vec!["dao", "dataSource"]);
    assert_eq!(container.staged_state("dao"), beanstalk_core::StagedState::Absent);
}

#[test]
fn test_depends_on_initializes_first() {
    let log = new_log();
    let container = Container::new();
    for name in ["cache", "warmup"] {
        let log = Arc::clone(&log);
        let class = ClassDescriptor::builder::<Counter>()
            .default_constructor(move || {
                log.lock().push(name.to_string());
                Counter
            })
            .build();
        let definition = BeanDefinition::new(class);
        let definition = if name == "cache" {
            definition.with_depends_on(vec!["warmup".into()])
        } else {
            definition
        };
        container.register_bean_definition(name, definition).unwrap();
    }

    container.get_bean("cache").unwrap();
    assert_eq!(*log.lock(), vec!["warmup", "cache"]);
}

#[test]
fn test_depends_on_missing_bean() {
    let container = Container::new();
    container
        .register_bean_definition("cache", BeanDefinition::new(counter_class()).with_depends_on(vec!["ghost".into()]))
        .unwrap();
    let err = container.get_bean("cache").unwrap_err();
    assert!(err.to_string().contains("depends on missing bean 'ghost'"));
    assert!(container.validate_dependencies().is_err());
}

struct Connection {
    url: String,
}

struct ConnectionFactory {
    url: RwLock<String>,
}

#[test]
fn test_factory_bean_product_and_dereference() {
    let connection_class = ClassDescriptor::builder::<Connection>().build();
    let factory_class = ClassDescriptor::builder::<ConnectionFactory>()
        .default_constructor(|| ConnectionFactory {
            url: RwLock::new(String::new()),
        })
        .property("url", ValueType::Str, |f: &ConnectionFactory, v: Value| {
            *f.url.write() = v.as_str().unwrap_or_default().to_string();
            Ok(())
        })
        .factory_bean(true, move |f: &ConnectionFactory| {
            Ok(ObjectRef::from_value(
                Connection { url: f.url.read().clone() },
                Arc::clone(&connection_class),
            ))
        })
        .build();

    let container = Container::new();
    container
        .register_bean_definition(
            "connection",
            BeanDefinition::new(factory_class).with_property_literal("url", "db://orders"),
        )
        .unwrap();
    container.refresh().unwrap();

    let first = container.get_bean_as::<Connection>("connection").unwrap();
    let second = container.get_bean_as::<Connection>("connection").unwrap();
    assert_eq!(first.url, "db://orders");
    assert!(Arc::ptr_eq(&first, &second));

    let factory = container.get_bean("&connection").unwrap();
    assert!(factory.downcast::<ConnectionFactory>().is_some());
    assert!(container.get_bean("&missing").is_err());

    container.register_bean_definition("plain", BeanDefinition::new(counter_class())).unwrap();
    assert!(container.get_bean("&plain").unwrap_err().is_type_mismatch());
}

struct Session {
    log: Log,
}

#[test]
fn test_thread_scope_instances_and_destruction() {
    let log = new_log();
    let created = Arc::clone(&log);
    let class = ClassDescriptor::builder::<Session>()
        .default_constructor(move || Session {
            log: Arc::clone(&created),
        })
        .on_destroy(|s: &Session| {
            s.log.lock().push("session destroyed".into());
            Ok(())
        })
        .build();

    let container = Container::new();
    container.register_scope("thread", Arc::new(ThreadScope::new())).unwrap();
    container
        .register_bean_definition("session", BeanDefinition::new(class).with_scope("thread"))
        .unwrap();

    let here = container.get_bean("session").unwrap();
    assert!(ObjectRef::ptr_eq(&here, &container.get_bean("session").unwrap()));

    let other = {
        let container = Arc::clone(&container);
        thread::spawn(move || container.get_bean("session").unwrap())
            .join()
            .unwrap()
    };
    assert!(!ObjectRef::ptr_eq(&here, &other));

    container.destroy_scoped_bean("session").unwrap();
    assert_eq!(*log.lock(), vec!["session destroyed"]);
    assert!(!ObjectRef::ptr_eq(&here, &container.get_bean("session").unwrap()));
    assert!(container.destroy_scoped_bean("missing").is_err());
}

#[test]
fn test_prototype_destroyed_by_caller() {
    let log = new_log();
    let container = Container::new();
    container
        .register_bean_definition(
            "worker",
            BeanDefinition::new(logging_class(&log))
                .prototype()
                .with_constructor_literal("worker"),
        )
        .unwrap();

    let worker = container.get_bean("worker").unwrap();
    container.destroy_singletons().unwrap();
    assert!(log.lock().is_empty());

    container.destroy_bean("worker", &worker).unwrap();
    assert_eq!(*log.lock(), vec!["worker"]);
}

struct MakePrototype;

impl BeanFactoryPostProcessor for MakePrototype {
    fn post_process_bean_factory(&self, factory: &dyn ConfigurableListableBeanFactory) -> ContainerResult<()> {
        for name in factory.get_bean_definition_names() {
            if factory.get_bean_definition(&name)?.attribute("role") == Some("worker") {
                factory.set_bean_scope(&name, "prototype")?;
            }
        }
        Ok(())
    }
}

#[test]
fn test_factory_post_processor_edits_definitions_before_instantiation() {
    let container = Container::new();
    container
        .register_bean_definition("job", BeanDefinition::new(counter_class()).with_attribute("role", "worker"))
        .unwrap();
    container
        .register_bean_definition("clock", BeanDefinition::new(counter_class()))
        .unwrap();
    container.add_bean_factory_post_processor(Arc::new(MakePrototype));
    container.refresh().unwrap();

    assert!(container.is_prototype("job").unwrap());
    assert_eq!(container.singleton_names(), vec!["clock"]);
}

#[test]
fn test_lazy_singleton_not_preinstantiated() {
    let container = Container::new();
    container
        .register_bean_definition("lazy", BeanDefinition::new(counter_class()).with_lazy(true))
        .unwrap();
    container.refresh().unwrap();
    assert!(container.singleton_names().is_empty());
    container.get_bean("lazy").unwrap();
    assert_eq!(container.singleton_names(), vec!["lazy"]);
}

#[test]
fn test_override_disabled_by_config() {
    let config = ContainerConfig::from_toml_str("allow-bean-definition-overriding = false").unwrap();
    let container = Container::with_config(config);
    container
        .register_bean_definition("clock", BeanDefinition::new(counter_class()))
        .unwrap();
    let err = container
        .register_bean_definition("clock", BeanDefinition::new(counter_class()))
        .unwrap_err();
    assert!(matches!(err, ContainerError::BeanAlreadyExists(_)));
}

#[test]
fn test_required_type_mismatch() {
    let container = Container::new();
    container
        .register_bean_definition("clock", BeanDefinition::new(counter_class()))
        .unwrap();
    assert!(container
        .get_bean_of_required_type("clock", &TypeInfo::of::<Counter>())
        .is_ok());
    let err = container
        .get_bean_of_required_type("clock", &TypeInfo::of::<Repository>())
        .unwrap_err();
    assert!(err.is_type_mismatch());
    assert!(container.get_bean_as::<Repository>("clock").is_err());
}

struct Target {
    helper: OnceLock<ObjectRef>,
}

#[test]
fn test_autowire_by_type_for_unspecified_properties() {
    let class = ClassDescriptor::builder::<Target>()
        .default_constructor(|| Target { helper: OnceLock::new() })
        .property("helper", ValueType::object::<Counter>(), |t: &Target, v: Value| {
            let object = v.into_object().ok_or_else(|| anyhow!("expected an object"))?;
            t.helper.set(object).map_err(|_| anyhow!("already set"))
        })
        .build();
    let container = Container::new();
    container
        .register_bean_definition("counter", BeanDefinition::new(counter_class()))
        .unwrap();
    container
        .register_bean_definition("target", BeanDefinition::new(class).with_autowire(AutowireMode::ByType))
        .unwrap();

    let target = container.get_bean_as::<Target>("target").unwrap();
    let counter = container.get_bean("counter").unwrap();
    assert!(ObjectRef::ptr_eq(target.helper.get().unwrap(), &counter));
}
