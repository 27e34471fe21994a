use crate::*;

use std::collections::HashSet;

use rendezvous_store::StoreError;

#[tokio::test]
async fn test_two_peer_walkthrough() -> Result<()> {
    let (store, _clock) = open_manual(StoreOptions::default()).await?;

    store.register(&peer(1), "foo1", &record(1), 60).await?;
    assert_eq!(store.count_registrations(&peer(1)).await?, 1);

    let page = store.discover("foo1", None, 100).await?;
    assert_eq!(page.registrations.len(), 1);
    assert_eq!(page.registrations[0].peer, peer(1));
    let c1 = page.cookie;

    store.register(&peer(2), "foo1", &record(2), 60).await?;
    let page = store.discover("foo1", Some(&c1), 100).await?;
    assert_eq!(page.registrations.len(), 1);
    assert_eq!(page.registrations[0].peer, peer(2));

    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_every_page_size_yields_each_registration_once() -> Result<()> {
    let (store, _clock) = open_manual(StoreOptions::default()).await?;

    let mut expected = Vec::new();
    for i in 0..20 {
        let ns = if i % 3 == 0 { "alpha" } else { "beta" };
        store.register(&peer(i), ns, &record(i), 60).await?;
        expected.push(peer(i));
    }

    for page_size in [1, 2, 3, 7, 19, 20, 50] {
        let (seen, _) = drain(&store, "", page_size, None).await?;
        let peers: Vec<_> = seen.iter().map(|r| r.peer.clone()).collect();
        assert_eq!(peers, expected, "page size {page_size}");
    }

    let (alpha, _) = drain(&store, "alpha", 2, None).await?;
    assert_eq!(alpha.len(), 7);
    assert!(alpha.iter().all(|r| r.namespace == "alpha"));

    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_reregistration_moves_peer_to_end() -> Result<()> {
    let (store, _clock) = open_manual(StoreOptions::default()).await?;

    store.register(&peer(1), "ns", &record(1), 60).await?;
    store.register(&peer(2), "ns", &record(2), 60).await?;
    store.register(&peer(1), "ns", &record(1), 60).await?;

    let page = store.discover("ns", None, 100).await?;
    let peers: Vec<_> = page.registrations.iter().map(|r| r.peer.clone()).collect();
    assert_eq!(peers, vec![peer(2), peer(1)]);

    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_mutation_between_pages_causes_no_gaps_or_repeats() -> Result<()> {
    let (store, _clock) = open_manual(StoreOptions::default()).await?;

    for i in 0..10 {
        store.register(&peer(i), "ns", &record(i), 60).await?;
    }

    let first = store.discover("ns", None, 4).await?;
    let first_peers: Vec<_> = first.registrations.iter().map(|r| r.peer.clone()).collect();
    assert_eq!(first_peers, (0..4).map(peer).collect::<Vec<_>>());

    // Delete already-returned rows and one not yet returned, add new ones.
    store.unregister(&peer(0), "ns").await?;
    store.unregister(&peer(1), "ns").await?;
    store.unregister(&peer(5), "ns").await?;
    store.register(&peer(100), "ns", &record(100), 60).await?;
    store.register(&peer(101), "ns", &record(101), 60).await?;

    let (rest, _) = drain(&store, "ns", 3, Some(first.cookie)).await?;
    let rest_peers: Vec<_> = rest.iter().map(|r| r.peer.clone()).collect();
    let expected: Vec<_> = [4, 6, 7, 8, 9, 100, 101].into_iter().map(peer).collect();
    assert_eq!(rest_peers, expected);

    let all: HashSet<_> = first_peers.iter().chain(rest_peers.iter()).collect();
    assert_eq!(all.len(), first_peers.len() + rest_peers.len());

    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_exhausted_cookie_picks_up_later_registrations() -> Result<()> {
    let (store, _clock) = open_manual(StoreOptions::default()).await?;

    store.register(&peer(1), "ns", &record(1), 60).await?;
    let (seen, cookie) = drain(&store, "ns", 10, None).await?;
    assert_eq!(seen.len(), 1);

    // Polling an exhausted cursor keeps returning the same position.
    let idle = store.discover("ns", Some(&cookie), 10).await?;
    assert!(idle.registrations.is_empty());
    assert_eq!(idle.cookie, cookie);

    store.register(&peer(2), "ns", &record(2), 60).await?;
    let page = store.discover("ns", Some(&cookie), 10).await?;
    assert_eq!(page.registrations.len(), 1);
    assert_eq!(page.registrations[0].peer, peer(2));

    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_cookie_is_bound_to_its_namespace() -> Result<()> {
    let (store, _clock) = open_manual(StoreOptions::default()).await?;
    store.register(&peer(1), "foo1", &record(1), 60).await?;
    store.register(&peer(2), "foo2", &record(2), 60).await?;

    let scoped = store.discover("foo1", None, 10).await?.cookie;
    let global = store.discover("", None, 10).await?.cookie;

    for (ns, cookie) in [("", &scoped), ("foo2", &scoped), ("foo1", &global)] {
        let err = store.discover(ns, Some(cookie), 10).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCookie), "{ns:?}: {err:?}");
    }

    let mut truncated = scoped.clone();
    truncated.pop();
    let err = store.discover("foo1", Some(&truncated), 10).await.unwrap_err();
    assert!(matches!(err, StoreError::MalformedCookie(_)));

    store.close().await?;
    Ok(())
}
