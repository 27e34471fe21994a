use crate::*;

use std::time::Duration;

#[tokio::test]
async fn test_ttl_elapses_without_sweep() -> Result<()> {
    let (store, clock) = open_manual(StoreOptions::default()).await?;

    store.register(&peer(1), "foo1", &record(1), 1).await?;
    store.register(&peer(2), "foo1", &record(2), 60).await?;
    assert_eq!(store.count_registrations(&peer(1)).await?, 1);
    assert_eq!(store.discover("foo1", None, 100).await?.registrations.len(), 2);

    clock.advance(1);

    assert_eq!(store.count_registrations(&peer(1)).await?, 0);
    let page = store.discover("foo1", None, 100).await?;
    assert_eq!(page.registrations.len(), 1);
    assert_eq!(page.registrations[0].peer, peer(2));

    assert_eq!(store.sweep_expired().await?, 1);
    assert_eq!(store.count_registrations(&peer(2)).await?, 1);

    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_reregistration_extends_lifetime() -> Result<()> {
    let (store, clock) = open_manual(StoreOptions::default()).await?;

    store.register(&peer(1), "foo1", &record(1), 10).await?;
    clock.advance(8);
    store.register(&peer(1), "foo1", &record(1), 10).await?;
    clock.advance(8);

    assert_eq!(store.count_registrations(&peer(1)).await?, 1);
    assert_eq!(store.sweep_expired().await?, 0);

    store.close().await?;
    Ok(())
}

/// Real clock, real sleep: the same check the background sweeper relies on.
#[tokio::test]
async fn test_cleanup_with_system_clock() -> Result<()> {
    let store = RendezvousStore::open(":memory:").await?;

    store.register(&peer(1), "foo1", &record(1), 1).await?;
    assert_eq!(store.count_registrations(&peer(1)).await?, 1);

    tokio::time::sleep(Duration::from_secs(2)).await;

    store.sweep_expired().await?;
    assert_eq!(store.count_registrations(&peer(1)).await?, 0);
    assert!(store.discover("foo1", None, 100).await?.registrations.is_empty());

    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_close_interrupts_sleeping_sweeper() -> Result<()> {
    let options = StoreOptions {
        sweep_interval: Duration::from_secs(3600),
        ..StoreOptions::default()
    };
    let (store, _clock) = open_manual(options).await?;

    let closed = tokio::time::timeout(Duration::from_secs(5), store.close()).await;
    assert!(closed.is_ok(), "close waited for the sweep interval");
    closed??;
    Ok(())
}
