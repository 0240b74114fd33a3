use futures::StreamExt as _;
use infuse::{
    async_impl, dependencies, Arguments, Chain, Dependencies, FinalizeErrorKind, InjectErrorKind, InstantiateErrorKind, Provider,
    ResolveErrorKind,
};
use std::{
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
    time::Duration,
};
use tracing_test::traced_test;

struct Int(i64);
struct Client;
struct Handler(Arc<Client>);

fn async_int() -> Provider {
    Provider::new_async(Dependencies::new(), |_: Arguments| async {
        tokio::task::yield_now().await;
        Ok::<_, InstantiateErrorKind>(Int(42))
    })
    .unwrap()
}

fn counted_client(open: &Arc<AtomicI32>) -> Provider {
    let (acquire, release) = (open.clone(), open.clone());
    Provider::with_async_finalizer(
        Dependencies::new(),
        move |_: Arguments| {
            let open = acquire.clone();
            async move {
                open.fetch_add(1, Ordering::SeqCst);
                Ok::<_, InstantiateErrorKind>(Client)
            }
        },
        move |_: Arc<Client>| {
            let open = release.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                open.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, FinalizeErrorKind>(())
            }
        },
    )
    .unwrap()
}

fn handler() -> Provider {
    Provider::new(dependencies! { client: Client }.unwrap(), |arguments: Arguments| {
        Ok::<_, InstantiateErrorKind>(Handler(arguments.get("client")?))
    })
    .unwrap()
}

#[tokio::test]
#[traced_test]
async fn test_async_increment_in_scope() {
    let chain = Chain::new();
    let f = async_impl::inject::function(dependencies! { n: Int }.unwrap(), |_: Chain, arguments: Arguments| async move {
        arguments.get::<Int>("n").unwrap().0 + 1
    });

    let registration = async_int().scope(&chain);
    assert_eq!(f.call(&chain, Arguments::new()).await.unwrap(), 43);
    registration.unregister();

    let Err(InjectErrorKind::Resolve(err)) = f.call(&chain, Arguments::new()).await else {
        panic!("expected a resolve error outside of the scope");
    };
    assert!(err.is_activation());
}

#[tokio::test]
#[traced_test]
async fn test_async_only_from_sync_path() {
    let chain = Chain::new();
    let _registration = async_int().scope(&chain);
    let f = infuse::inject::function(dependencies! { n: Int }.unwrap(), |_: &Chain, arguments: Arguments| {
        arguments.get::<Int>("n").unwrap().0 + 1
    });

    let Err(InjectErrorKind::Resolve(err)) = f.call(&chain, Arguments::new()) else {
        panic!("expected a resolve error");
    };
    assert!(matches!(err, ResolveErrorKind::AsyncInSyncContext { .. }));
}

#[tokio::test]
#[traced_test]
async fn test_sync_provider_with_async_dependency() {
    let chain = Chain::new();
    let open = Arc::new(AtomicI32::new(0));
    let _client = counted_client(&open).scope(&chain);
    let _handler = handler().scope(&chain);

    let consumer = async_impl::inject::function(dependencies! { handler: Handler }.unwrap(), {
        let open = open.clone();
        move |chain: Chain, arguments: Arguments| {
            let open = open.clone();
            async move {
                assert_eq!(open.load(Ordering::SeqCst), 1);
                let handler = arguments.get::<Handler>("handler").unwrap();
                Arc::ptr_eq(&handler.0, &chain.get::<Client>().unwrap())
            }
        }
    });

    assert!(consumer.call(&chain, Arguments::new()).await.unwrap());
    assert_eq!(open.load(Ordering::SeqCst), 0);

    let sync_consumer = infuse::inject::function(dependencies! { handler: Handler }.unwrap(), |_: &Chain, _: Arguments| ());
    let Err(InjectErrorKind::Resolve(err)) = sync_consumer.call(&chain, Arguments::new()) else {
        panic!("expected a resolve error");
    };
    assert!(err.is_activation());
    assert_eq!(open.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[traced_test]
async fn test_stream_keeps_dependencies_open() {
    let chain = Chain::new();
    let open = Arc::new(AtomicI32::new(0));
    let _client = counted_client(&open).scope(&chain);

    let pages = async_impl::inject::stream(dependencies! { client: Client }.unwrap(), |_: Chain, _: Arguments| {
        futures::stream::iter(1..=3).then(|page| async move {
            tokio::task::yield_now().await;
            page
        })
    });

    let mut injected = pages.call(&chain, Arguments::new()).await.unwrap();
    let mut seen = Vec::new();
    while let Some(page) = injected.next().await {
        assert_eq!(open.load(Ordering::SeqCst), 1);
        seen.push(page);
    }

    assert_eq!(seen, [1, 2, 3]);
    assert_eq!(open.load(Ordering::SeqCst), 0);
    assert!(injected.take_error().is_none());
}

#[tokio::test]
#[traced_test]
async fn test_stream_dropped_early() {
    let chain = Chain::new();
    let open = Arc::new(AtomicI32::new(0));
    let _client = counted_client(&open).scope(&chain);

    let pages = async_impl::inject::stream(dependencies! { client: Client }.unwrap(), |_: Chain, _: Arguments| {
        futures::stream::iter(1..=3)
    });

    let mut injected = pages.call(&chain, Arguments::new()).await.unwrap();
    assert_eq!(injected.next().await, Some(1));
    drop(injected);

    tokio::time::timeout(Duration::from_secs(1), async {
        while open.load(Ordering::SeqCst) != 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
    assert!(chain.get::<Client>().is_none());
}

#[tokio::test(flavor = "multi_thread")]
#[traced_test]
async fn test_forked_chains_in_tasks() {
    let chain = Chain::new();
    let _registration = async_int().scope(&chain);

    let f = Arc::new(async_impl::inject::function(
        dependencies! { n: Int }.unwrap(),
        |_: Chain, arguments: Arguments| async move { arguments.get::<Int>("n").unwrap().0 },
    ));

    let tasks: Vec<_> = (0..4)
        .map(|offset| {
            let chain = chain.fork();
            let f = f.clone();
            tokio::spawn(async move {
                let _registration = Provider::instance(Int(offset)).scope(&chain);
                f.call(&chain, Arguments::new()).await.unwrap()
            })
        })
        .collect();

    for (offset, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap(), offset as i64);
    }
    assert_eq!(f.call(&chain, Arguments::new()).await.unwrap(), 42);
}
