//! di-impl 集成测试
use di_abstractions::{Dependency, ServiceDescriptor, StaticDiscovery};
use di_impl::ServiceContext;
use infrastructure_common::DependencyError;
use infrastructure_composition::ContainerBootstrapper;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

/// 测试服务
trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

#[derive(Debug)]
struct English;

impl Greeter for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

#[derive(Debug)]
struct French;

impl Greeter for French {
    fn greet(&self) -> String {
        "bonjour".to_string()
    }
}

#[derive(Debug)]
struct Counter {
    value: usize,
}

struct Chorus {
    greeters: Vec<Arc<dyn Greeter>>,
}

impl Chorus {
    fn sing(&self) -> Vec<String> {
        self.greeters.iter().map(|g| g.greet()).collect()
    }
}

#[derive(Debug)]
struct A;

#[derive(Debug)]
struct B;

#[derive(Debug)]
struct Unregistered;

fn counting_factory(calls: &Arc<AtomicUsize>, delay: Duration) -> ServiceDescriptor {
    let calls = Arc::clone(calls);
    ServiceDescriptor::factory::<Counter, _>(Vec::new(), move |_| {
        std::thread::sleep(delay);
        Ok(Counter {
            value: calls.fetch_add(1, Ordering::SeqCst),
        })
    })
}

#[test]
fn test_find_one_is_idempotent() -> anyhow::Result<()> {
    let context = ServiceContext::new();
    let calls = Arc::new(AtomicUsize::new(0));
    context.register(counting_factory(&calls, Duration::ZERO))?;

    let first = context.get::<Counter>(None)?;
    for _ in 0..10 {
        let again = context.get::<Counter>(None)?;
        assert!(Arc::ptr_eq(&first, &again));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_concurrent_callers_share_one_construction() -> anyhow::Result<()> {
    const THREADS: usize = 16;
    let context = ServiceContext::new();
    let calls = Arc::new(AtomicUsize::new(0));
    context.register(counting_factory(&calls, Duration::from_millis(20)))?;

    let barrier = Barrier::new(THREADS);
    let instances: Vec<Arc<Counter>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    context.get::<Counter>(None).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
    assert_eq!(instances[0].value, 0);
    Ok(())
}

#[test]
fn test_qualified_variants() -> anyhow::Result<()> {
    let context = ServiceContext::new();
    context.register_instance::<dyn Greeter>(Some("a"), Arc::new(English))?;
    context.register_instance::<dyn Greeter>(Some("b"), Arc::new(French))?;

    let all: Vec<String> = context
        .find_all::<dyn Greeter>(None)?
        .iter()
        .map(|g| g.greet())
        .collect();
    assert_eq!(all, ["hello", "bonjour"]);

    match context.find_one::<dyn Greeter>(None) {
        Err(DependencyError::AmbiguousService { candidates, .. }) => {
            assert_eq!(candidates, ["a", "b"]);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("ambiguous lookup must fail"),
    }

    let a = context.find_one::<dyn Greeter>(Some("a"))?.unwrap();
    assert_eq!(a.greet(), "hello");
    assert_eq!(context.find_all::<dyn Greeter>(Some("b"))?.len(), 1);
    Ok(())
}

#[test]
fn test_single_qualified_candidate_fallback() -> anyhow::Result<()> {
    let context = ServiceContext::new();
    context.register_instance::<dyn Greeter>(Some("x"), Arc::new(French))?;

    let fallback = context.find_one::<dyn Greeter>(None)?.unwrap();
    let qualified = context.find_one::<dyn Greeter>(Some("x"))?.unwrap();
    assert!(Arc::ptr_eq(&fallback, &qualified));
    assert!(context.find_one::<dyn Greeter>(Some("y"))?.is_none());
    Ok(())
}

#[test]
fn test_cycle_reports_path_and_leaves_nothing_realized() -> anyhow::Result<()> {
    let context = ServiceContext::new();
    context.register_factory::<A, _>(vec![Dependency::one::<B>()], |deps| {
        deps.take_one::<B>()?;
        Ok(A)
    })?;
    context.register_factory::<B, _>(vec![Dependency::one::<A>()], |deps| {
        deps.take_one::<A>()?;
        Ok(B)
    })?;

    match context.find_one::<A>(None) {
        Err(DependencyError::CircularDependency { cycle }) => {
            assert_eq!(cycle, ["A", "B", "A"]);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("cycle must be detected"),
    }
    assert!(context.registered_services().iter().all(|s| !s.realized));
    assert_eq!(context.stats().factory_invocations, 0);

    // 静态检查同样能发现该循环
    let errors = context.validate().unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, DependencyError::CircularDependency { .. })));
    Ok(())
}

#[test]
fn test_find_all_unregistered_is_empty() -> anyhow::Result<()> {
    let context = ServiceContext::new();
    assert!(context.find_all::<Unregistered>(None)?.is_empty());
    assert!(context.find_all::<dyn Greeter>(Some("nobody"))?.is_empty());
    assert!(context.find_one::<Unregistered>(None)?.is_none());
    Ok(())
}

#[test]
fn test_concurrent_add_service_same_slot() {
    let context = ServiceContext::new();
    let barrier = Barrier::new(2);

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|value| {
                let context = &context;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    context.add_service(Counter { value })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let losers: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(losers.len(), 1);
    assert!(losers[0].is_duplicate());
    assert_eq!(context.registered_services().len(), 1);
}

#[test]
fn test_concurrent_add_service_distinct_qualifiers() {
    let context = ServiceContext::new();
    let barrier = Barrier::new(2);

    std::thread::scope(|scope| {
        for (value, qualifier) in ["left", "right"].into_iter().enumerate() {
            let context = &context;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                context.add_service_named(qualifier, Counter { value }).unwrap();
            });
        }
    });

    assert_eq!(context.find_all::<Counter>(None).unwrap().len(), 2);
    assert_eq!(context.get::<Counter>(Some("right")).unwrap().value, 1);
}

#[test]
fn test_missing_dependency_can_be_retried() -> anyhow::Result<()> {
    let context = ServiceContext::new();
    context.register_factory::<A, _>(vec![Dependency::one::<B>()], |deps| {
        deps.take_one::<B>()?;
        Ok(A)
    })?;

    let error = context.find_one::<A>(None).unwrap_err();
    assert!(error.is_no_such_service());

    context.add_service(B)?;
    assert!(context.find_one::<A>(None)?.is_some());
    Ok(())
}

#[test]
fn test_collection_dependency_order() -> anyhow::Result<()> {
    let context = ServiceContext::new();
    context.register(ServiceDescriptor::instance_as::<dyn Greeter>(Arc::new(French)).named("fr"))?;
    context.register(ServiceDescriptor::instance_as::<dyn Greeter>(Arc::new(English)).named("en"))?;
    context.register_factory::<Chorus, _>(vec![Dependency::all::<dyn Greeter>()], |deps| {
        Ok(Chorus {
            greeters: deps.take_all::<dyn Greeter>()?,
        })
    })?;

    let chorus = context.get::<Chorus>(None)?;
    assert_eq!(chorus.sing(), ["bonjour", "hello"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_resolution_from_async_tasks() -> anyhow::Result<()> {
    let context = ServiceContext::new();
    let calls = Arc::new(AtomicUsize::new(0));
    context.register(counting_factory(&calls, Duration::from_millis(10)))?;
    context.register(ServiceDescriptor::factory_as::<dyn Greeter, _>(
        vec![Dependency::one::<Counter>()],
        |deps| {
            deps.take_one::<Counter>()?;
            Ok(Arc::new(English) as Arc<dyn Greeter>)
        },
    ))?;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let context = context.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            context.get::<dyn Greeter>(None).map(|g| g.greet())
        }));
    }
    for task in tasks {
        assert_eq!(task.await??, "hello");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(context.stats().realized_services, 2);
    Ok(())
}

#[test]
fn test_bootstrap_with_discovery() -> anyhow::Result<()> {
    let discovery = StaticDiscovery::new("greeters")
        .with(ServiceDescriptor::instance_as::<dyn Greeter>(Arc::new(English)).named("en"))
        .with(ServiceDescriptor::instance_as::<dyn Greeter>(Arc::new(French)).named("fr"));

    let context = ContainerBootstrapper::new()
        .add_discovery(discovery)
        .register(ServiceDescriptor::factory::<Chorus, _>(
            vec![Dependency::all::<dyn Greeter>()],
            |deps| {
                Ok(Chorus {
                    greeters: deps.take_all::<dyn Greeter>()?,
                })
            },
        ))
        .bootstrap()?;

    // 直接注册的描述符先于发现源注册
    let summaries = context.registered_services();
    assert_eq!(summaries[0].key, "Chorus");
    assert_eq!(summaries[1].key, "dyn Greeter@en");

    let json = serde_json::to_value(&summaries)?;
    assert_eq!(json[0]["dependencies"][0], "[dyn Greeter]");

    assert_eq!(context.get::<Chorus>(None)?.sing(), ["hello", "bonjour"]);
    Ok(())
}
