use crate::*;

use rendezvous_store::StoreError;

#[tokio::test]
async fn test_durable_nonce_survives_reopen() -> Result<()> {
    let db = TempDb::new("nonce");

    let store = RendezvousStore::open(&db.locator()).await?;
    assert!(store.is_durable());
    let nonce1 = store.nonce();
    store.close().await?;

    let store = RendezvousStore::open(&db.locator()).await?;
    let nonce2 = store.nonce();
    store.close().await?;

    assert_eq!(nonce1, nonce2, "persistent store nonces differ");
    Ok(())
}

#[tokio::test]
async fn test_registrations_survive_reopen() -> Result<()> {
    let db = TempDb::new("rows");

    let store = RendezvousStore::open(&db.locator()).await?;
    store.register(&peer(1), "foo1", &record(1), 600).await?;
    store.register(&peer(1), "foo2", &record(1), 600).await?;
    store.close().await?;

    let store = RendezvousStore::open(&db.locator()).await?;
    assert_eq!(store.count_registrations(&peer(1)).await?, 2);
    let page = store.discover("foo1", None, 10).await?;
    assert_eq!(page.registrations.len(), 1);
    assert_eq!(page.registrations[0].signed_record, record(1));
    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_cookie_from_before_restart_keeps_paging() -> Result<()> {
    let db = TempDb::new("cookie");

    let store = RendezvousStore::open(&db.locator()).await?;
    store.register(&peer(1), "foo1", &record(1), 600).await?;
    let page = store.discover("foo1", None, 10).await?;
    assert_eq!(page.registrations.len(), 1);
    let cookie = page.cookie;
    store.close().await?;

    let store = RendezvousStore::open(&db.locator()).await?;
    store.register(&peer(2), "foo1", &record(2), 600).await?;

    let page = store.discover("foo1", Some(&cookie), 10).await?;
    assert_eq!(page.registrations.len(), 1);
    assert_eq!(page.registrations[0].peer, peer(2));
    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_sequence_is_not_reused_after_emptying_and_restart() -> Result<()> {
    let db = TempDb::new("seq");

    let store = RendezvousStore::open(&db.locator()).await?;
    let first = store.register(&peer(1), "foo1", &record(1), 600).await?;
    let second = store.register(&peer(2), "foo1", &record(2), 600).await?;
    let cookie = store.discover("foo1", None, 10).await?.cookie;
    store.unregister(&peer(1), "").await?;
    store.unregister(&peer(2), "").await?;
    store.close().await?;

    let store = RendezvousStore::open(&db.locator()).await?;
    let third = store.register(&peer(3), "foo1", &record(3), 600).await?;
    assert!(first < second && second < third);

    // The old cookie points past `second`; the new row must still show up.
    let page = store.discover("foo1", Some(&cookie), 10).await?;
    assert_eq!(page.registrations.len(), 1);
    assert_eq!(page.registrations[0].peer, peer(3));
    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_cookie_from_another_store_is_rejected() -> Result<()> {
    let db_a = TempDb::new("epoch-a");
    let db_b = TempDb::new("epoch-b");

    let a = RendezvousStore::open(&db_a.locator()).await?;
    let b = RendezvousStore::open(&db_b.locator()).await?;
    assert_ne!(a.nonce(), b.nonce());

    a.register(&peer(1), "foo1", &record(1), 600).await?;
    let cookie = a.discover("foo1", None, 10).await?.cookie;

    let err = b.discover("foo1", Some(&cookie), 10).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidCookie), "got {err:?}");

    a.close().await?;
    b.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_memory_stores_have_no_continuity() -> Result<()> {
    let a = RendezvousStore::open(":memory:").await?;
    a.register(&peer(1), "foo1", &record(1), 600).await?;
    let cookie = a.discover("foo1", None, 10).await?.cookie;
    let nonce_a = a.nonce();
    a.close().await?;

    let b = RendezvousStore::open(":memory:").await?;
    assert_ne!(nonce_a, b.nonce());
    assert_eq!(b.count_registrations(&peer(1)).await?, 0);
    assert!(b.discover("foo1", Some(&cookie), 10).await.is_err());
    b.close().await?;
    Ok(())
}
