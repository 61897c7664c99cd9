//! Read-through query cache with request de-duplication.
//!
//! The cache is owned by a single event loop and mutated through `&mut self`.
//! Fetches run as spawned tasks and report back over a channel which the
//! owner drains with [`QueryCache::poll`] on its tick, so no locks are held
//! around the entry map.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::key::{CacheKey, CacheTag};
use super::state::{EntrySnapshot, ErrorInfo, QueryStatus};

/// A factory that produces one fetch future per call.
type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, ErrorInfo>> + Send + Sync>;

/// Bounds on how long unused entries are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
  /// Entries without subscribers are evicted after this long
  pub keep_unused_for: Duration,
  /// Upper bound on entries; the longest-unused are evicted first
  pub max_entries: usize,
}

impl Default for CacheOptions {
  fn default() -> Self {
    Self {
      keep_unused_for: Duration::from_secs(60),
      max_entries: 256,
    }
  }
}

/// A subscriber's handle on one cache entry.
///
/// Holding it counts as a subscription; dropping it (or passing it to
/// [`QueryCache::release`]) unsubscribes.
#[derive(Debug)]
pub struct Subscription<V> {
  key: CacheKey,
  rx: watch::Receiver<EntrySnapshot<V>>,
}

impl<V> Subscription<V> {
  pub fn key(&self) -> &CacheKey {
    &self.key
  }

  pub fn status(&self) -> QueryStatus<V> {
    self.rx.borrow().status.clone()
  }

  /// Current state of the entry, marking it as seen.
  pub fn mark_seen(&mut self) -> EntrySnapshot<V> {
    self.rx.borrow_and_update().clone()
  }
}

struct Entry<V> {
  tags: Vec<CacheTag>,
  fetcher: Fetcher<V>,
  /// Generation of the latest fetch; older responses are discarded
  generation: u64,
  tx: watch::Sender<EntrySnapshot<V>>,
  idle_since: Option<Instant>,
}

impl<V> Entry<V> {
  fn subscribers(&self) -> usize {
    self.tx.receiver_count()
  }

  fn is_pending(&self) -> bool {
    self.tx.borrow().status.is_pending()
  }
}

struct Completion<V> {
  key: CacheKey,
  generation: u64,
  result: Result<V, ErrorInfo>,
}

/// Per-resource-type store of query results.
pub struct QueryCache<V> {
  label: &'static str,
  options: CacheOptions,
  entries: HashMap<CacheKey, Entry<V>>,
  next_generation: u64,
  in_flight: usize,
  completions_tx: mpsc::UnboundedSender<Completion<V>>,
  completions_rx: mpsc::UnboundedReceiver<Completion<V>>,
}

impl<V: Send + Sync + 'static> QueryCache<V> {
  pub fn new(label: &'static str, options: CacheOptions) -> Self {
    let (completions_tx, completions_rx) = mpsc::unbounded_channel();
    Self {
      label,
      options,
      entries: HashMap::new(),
      next_generation: 0,
      in_flight: 0,
      completions_tx,
      completions_rx,
    }
  }

  /// Subscribe to `key`, fetching it if no entry exists.
  ///
  /// Returns immediately. An existing entry is shared as-is: a pending one
  /// resolves for every subscriber at once, a settled one is not refreshed.
  /// `fetcher` is only used when the entry is created.
  pub fn query<F, Fut>(&mut self, key: CacheKey, tags: Vec<CacheTag>, fetcher: F) -> Subscription<V>
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, ErrorInfo>> + Send + 'static,
  {
    if let Some(entry) = self.entries.get_mut(&key) {
      entry.idle_since = None;
      trace!(cache = self.label, %key, "attached to existing entry");
      return Subscription {
        rx: entry.tx.subscribe(),
        key,
      };
    }

    let (tx, rx) = watch::channel(EntrySnapshot::pending(key.clone()));
    let fetcher: Fetcher<V> = Arc::new(move || fetcher().boxed());
    self.entries.insert(
      key.clone(),
      Entry {
        tags,
        fetcher,
        generation: 0,
        tx,
        idle_since: None,
      },
    );
    self.start_fetch(&key);

    Subscription { key, rx }
  }

  /// Unsubscribe explicitly, starting the entry's idle clock right away.
  pub fn release(&mut self, subscription: Subscription<V>) {
    let key = subscription.key.clone();
    drop(subscription);

    if let Some(entry) = self.entries.get_mut(&key) {
      if entry.subscribers() == 0 {
        entry.idle_since = Some(Instant::now());
      }
    }
  }

  /// Invalidate every entry matching `tag`.
  ///
  /// Subscribed entries are refetched immediately; unsubscribed ones are
  /// dropped and will be fetched again on their next query. Returns the
  /// number of entries affected.
  pub fn invalidate(&mut self, tag: &CacheTag) -> usize {
    // Collect first so refetching can't disturb the iteration
    let matched: Vec<CacheKey> = self
      .entries
      .iter()
      .filter(|(_, entry)| entry.tags.iter().any(|provided| tag.matches(provided)))
      .map(|(key, _)| key.clone())
      .collect();

    for key in &matched {
      let subscribed = self
        .entries
        .get(key)
        .is_some_and(|entry| entry.subscribers() > 0);

      if subscribed {
        self.start_fetch(key);
      } else {
        self.entries.remove(key);
        trace!(cache = self.label, %key, "dropped unsubscribed entry");
      }
    }

    if !matched.is_empty() {
      debug!(cache = self.label, %tag, count = matched.len(), "invalidated");
    }
    matched.len()
  }

  /// Start a new fetch for a settled entry.
  ///
  /// Returns false if there is no such entry or its fetch is still in
  /// flight; the pending request already answers for it.
  pub fn refetch(&mut self, key: &CacheKey) -> bool {
    let settled = self.entries.get(key).is_some_and(|entry| !entry.is_pending());
    if settled {
      self.start_fetch(key);
    }
    settled
  }

  /// Refetch `key` only if its last fetch failed.
  pub fn retry(&mut self, key: &CacheKey) -> bool {
    let rejected = self
      .entries
      .get(key)
      .is_some_and(|entry| entry.tx.borrow().status.is_rejected());

    if rejected {
      debug!(cache = self.label, %key, "retrying rejected entry");
      self.start_fetch(key);
    }
    rejected
  }

  /// Apply finished fetches and evict unused entries.
  ///
  /// Returns the number of entries that transitioned. Call this on every
  /// tick of the owning event loop.
  pub fn poll(&mut self) -> usize {
    let mut applied = 0;
    while let Ok(completion) = self.completions_rx.try_recv() {
      if self.settle(completion) {
        applied += 1;
      }
    }
    self.evict_unused();
    applied
  }

  pub fn in_flight(&self) -> usize {
    self.in_flight
  }

  fn start_fetch(&mut self, key: &CacheKey) {
    self.next_generation += 1;
    let generation = self.next_generation;

    let Some(entry) = self.entries.get_mut(key) else {
      return;
    };
    entry.generation = generation;
    entry.tx.send_if_modified(|snapshot| {
      if snapshot.status.is_pending() {
        return false;
      }
      *snapshot = EntrySnapshot::pending(key.clone());
      true
    });

    let future = (entry.fetcher)();
    let tx = self.completions_tx.clone();
    let key = key.clone();
    self.in_flight += 1;
    debug!(cache = self.label, %key, generation, "fetch started");

    tokio::spawn(async move {
      let result = future.await;
      // The receiver lives as long as the cache; a closed channel means
      // nobody is left to care about the result.
      let _ = tx.send(Completion {
        key,
        generation,
        result,
      });
    });
  }

  fn settle(&mut self, completion: Completion<V>) -> bool {
    self.in_flight = self.in_flight.saturating_sub(1);
    let Completion {
      key,
      generation,
      result,
    } = completion;

    let Some(entry) = self.entries.get_mut(&key) else {
      trace!(cache = self.label, %key, generation, "response for dropped entry discarded");
      return false;
    };

    if entry.generation != generation {
      debug!(
        cache = self.label,
        %key,
        generation,
        current = entry.generation,
        "stale response discarded"
      );
      return false;
    }

    if let Err(error) = &result {
      warn!(cache = self.label, %key, %error, "fetch failed");
    } else {
      trace!(cache = self.label, %key, generation, "fetch resolved");
    }

    entry.tx.send_replace(EntrySnapshot::settled(key, result));
    true
  }

  fn evict_unused(&mut self) {
    let now = Instant::now();
    for entry in self.entries.values_mut() {
      if entry.subscribers() > 0 {
        entry.idle_since = None;
      } else if entry.idle_since.is_none() {
        entry.idle_since = Some(now);
      }
    }

    // Pending entries stay until their fetch lands
    let keep_for = self.options.keep_unused_for;
    let label = self.label;
    self.entries.retain(|key, entry| {
      let expired = !entry.is_pending()
        && entry
          .idle_since
          .is_some_and(|since| now.duration_since(since) >= keep_for);
      if expired {
        trace!(cache = label, %key, "evicted unused entry");
      }
      !expired
    });

    let excess = self.entries.len().saturating_sub(self.options.max_entries);
    if excess == 0 {
      return;
    }

    let mut idle: Vec<(Instant, CacheKey)> = self
      .entries
      .iter()
      .filter(|(_, entry)| !entry.is_pending())
      .filter_map(|(key, entry)| entry.idle_since.map(|since| (since, key.clone())))
      .collect();
    idle.sort_by_key(|(since, _)| *since);

    for (_, key) in idle.into_iter().take(excess) {
      self.entries.remove(&key);
      trace!(cache = self.label, %key, "evicted over capacity");
    }
  }
}

/// Inspection helpers for tests.
#[cfg(test)]
impl<V: Send + Sync + 'static> QueryCache<V> {
  /// Wait for the next fetch to finish and apply it.
  ///
  /// Returns `None` when nothing is in flight, otherwise whether the
  /// response was applied (false if it was stale).
  pub async fn settle_next(&mut self) -> Option<bool> {
    if self.in_flight == 0 {
      return None;
    }
    let completion = self.completions_rx.recv().await?;
    Some(self.settle(completion))
  }

  pub fn snapshot(&self, key: &CacheKey) -> Option<EntrySnapshot<V>> {
    self.entries.get(key).map(|entry| entry.tx.borrow().clone())
  }

  pub fn subscriber_count(&self, key: &CacheKey) -> usize {
    self.entries.get(key).map_or(0, Entry::subscribers)
  }

  pub fn contains(&self, key: &CacheKey) -> bool {
    self.entries.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::key::QueryArgs;
  use crate::cache::state::ErrorKind;
  use crate::catalog::Endpoint;
  use std::collections::VecDeque;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;
  use tokio::sync::oneshot;

  type Gate = oneshot::Sender<Result<u32, ErrorInfo>>;

  /// Fetcher whose responses are released by the test, in any order.
  #[derive(Clone, Default)]
  struct GatedFetcher {
    calls: Arc<AtomicUsize>,
    pending: Arc<Mutex<VecDeque<oneshot::Receiver<Result<u32, ErrorInfo>>>>>,
  }

  impl GatedFetcher {
    /// Prepare the response for the next call.
    fn expect_call(&self) -> Gate {
      let (tx, rx) = oneshot::channel();
      self.pending.lock().unwrap().push_back(rx);
      tx
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }

    fn fetcher(
      &self,
    ) -> impl Fn() -> BoxFuture<'static, Result<u32, ErrorInfo>> + Send + Sync + 'static {
      let this = self.clone();
      move || {
        this.calls.fetch_add(1, Ordering::SeqCst);
        let rx = this.pending.lock().unwrap().pop_front();
        async move {
          match rx {
            Some(rx) => rx
              .await
              .unwrap_or_else(|_| Err(ErrorInfo::network("gate dropped"))),
            None => Err(ErrorInfo::network("unexpected call")),
          }
        }
        .boxed()
      }
    }
  }

  fn videos_key() -> CacheKey {
    CacheKey::list(
      Endpoint::Videos,
      &QueryArgs::new()
        .with("ordering", "-view_count")
        .with("page_size", 5u32),
    )
  }

  fn videos_tags() -> Vec<CacheTag> {
    vec![CacheTag::all(Endpoint::Videos)]
  }

  #[tokio::test]
  async fn test_concurrent_identical_queries_fetch_once() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    let gate = fetcher.expect_call();

    let first = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    // Same arguments in a different order
    let second_key = CacheKey::list(
      Endpoint::Videos,
      &QueryArgs::new()
        .with("page_size", "5")
        .with("ordering", "-view_count"),
    );
    let second = cache.query(second_key, videos_tags(), fetcher.fetcher());

    assert_eq!(fetcher.calls(), 1);
    assert!(first.status().is_pending());
    assert!(second.status().is_pending());
    assert_eq!(cache.subscriber_count(&videos_key()), 2);

    gate.send(Ok(99)).unwrap();
    assert_eq!(cache.settle_next().await, Some(true));

    match (first.status(), second.status()) {
      (QueryStatus::Resolved(a), QueryStatus::Resolved(b)) => {
        assert_eq!(*a, 99);
        assert!(Arc::ptr_eq(&a, &b));
      }
      other => panic!("expected both resolved, got {:?}", other),
    }
    assert_eq!(fetcher.calls(), 1);
  }

  #[tokio::test]
  async fn test_settled_entry_is_served_without_refetch() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    fetcher.expect_call().send(Ok(1)).unwrap();

    let _first = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    cache.settle_next().await;

    let second = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    assert_eq!(second.status().data(), Some(&1));
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(cache.in_flight(), 0);
  }

  #[tokio::test]
  async fn test_subscribers_are_notified_on_transition() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    let gate = fetcher.expect_call();

    let mut subscription = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    let before = subscription.mark_seen();
    assert!(before.status.is_pending());
    assert!(before.settled_at.is_none());

    gate.send(Ok(5)).unwrap();
    cache.settle_next().await;

    let snapshot = subscription.mark_seen();
    assert_eq!(snapshot.status.data(), Some(&5));
    assert!(snapshot.settled_at.is_some());
  }

  #[tokio::test]
  async fn test_invalidate_discards_stale_response() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    let first_gate = fetcher.expect_call();
    let second_gate = fetcher.expect_call();

    let subscription = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    assert_eq!(cache.invalidate(&CacheTag::all(Endpoint::Videos)), 1);
    assert_eq!(fetcher.calls(), 2);

    second_gate.send(Ok(2)).unwrap();
    assert_eq!(cache.settle_next().await, Some(true));
    assert_eq!(subscription.status().data(), Some(&2));

    // The first request answers late and must not win
    first_gate.send(Ok(1)).unwrap();
    assert_eq!(cache.settle_next().await, Some(false));
    assert_eq!(subscription.status().data(), Some(&2));
    assert_eq!(cache.settle_next().await, None);
  }

  #[tokio::test]
  async fn test_invalidate_drops_unsubscribed_entries() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    fetcher.expect_call().send(Ok(1)).unwrap();

    let subscription = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    cache.settle_next().await;
    cache.release(subscription);

    assert_eq!(cache.invalidate(&CacheTag::all(Endpoint::Videos)), 1);
    assert!(!cache.contains(&videos_key()));
    assert_eq!(fetcher.calls(), 1);

    // Next query fetches lazily
    fetcher.expect_call().send(Ok(2)).unwrap();
    let subscription = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    assert_eq!(fetcher.calls(), 2);
    cache.settle_next().await;
    assert_eq!(subscription.status().data(), Some(&2));
  }

  #[tokio::test]
  async fn test_invalidate_only_hits_matching_tags() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    fetcher.expect_call().send(Ok(7)).unwrap();
    fetcher.expect_call().send(Ok(8)).unwrap();

    let seven = CacheKey::detail(Endpoint::Videos, 7);
    let eight = CacheKey::detail(Endpoint::Videos, 8);
    let _a = cache.query(
      seven.clone(),
      vec![CacheTag::item(Endpoint::Videos, 7)],
      fetcher.fetcher(),
    );
    let _b = cache.query(
      eight.clone(),
      vec![CacheTag::item(Endpoint::Videos, 8)],
      fetcher.fetcher(),
    );
    cache.settle_next().await;
    cache.settle_next().await;

    fetcher.expect_call().send(Ok(70)).unwrap();
    assert_eq!(cache.invalidate(&CacheTag::item(Endpoint::Videos, 7)), 1);
    assert!(cache.snapshot(&seven).unwrap().status.is_pending());
    assert_eq!(cache.snapshot(&eight).unwrap().status.data(), Some(&8));
    assert_eq!(cache.invalidate(&CacheTag::all(Endpoint::Groups)), 0);
  }

  #[tokio::test]
  async fn test_rejected_entry_is_reused_until_explicit_retry() {
    let mut cache = QueryCache::new("groups", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    fetcher
      .expect_call()
      .send(Err(ErrorInfo::server("500 Internal Server Error")))
      .unwrap();

    let key = CacheKey::list(Endpoint::Groups, &QueryArgs::new().with("search", "abc"));
    let tags = vec![CacheTag::all(Endpoint::Groups)];

    let first = cache.query(key.clone(), tags.clone(), fetcher.fetcher());
    cache.settle_next().await;
    assert_eq!(
      first.status().error().map(|e| e.kind),
      Some(ErrorKind::ServerError)
    );

    // Identical query attaches to the rejected entry
    let second = cache.query(key.clone(), tags, fetcher.fetcher());
    assert!(second.status().is_rejected());
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(cache.poll(), 0);
    assert_eq!(fetcher.calls(), 1);

    // User action retries
    fetcher.expect_call().send(Ok(3)).unwrap();
    assert!(cache.retry(&key));
    assert_eq!(fetcher.calls(), 2);
    assert!(second.status().is_pending());
    cache.settle_next().await;
    assert_eq!(first.status().data(), Some(&3));

    // Retry is a no-op on a resolved entry
    assert!(!cache.retry(&key));
    assert_eq!(fetcher.calls(), 2);
  }

  #[tokio::test]
  async fn test_unsubscribing_does_not_cancel_fetch() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    let gate = fetcher.expect_call();

    let subscription = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    cache.release(subscription);

    gate.send(Ok(11)).unwrap();
    assert_eq!(cache.settle_next().await, Some(true));
    assert_eq!(
      cache.snapshot(&videos_key()).unwrap().status.data(),
      Some(&11)
    );
  }

  #[tokio::test]
  async fn test_refetch_restarts_from_pending() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    fetcher.expect_call().send(Ok(1)).unwrap();

    let subscription = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    cache.settle_next().await;

    let gate = fetcher.expect_call();
    assert!(cache.refetch(&videos_key()));
    assert!(subscription.status().is_pending());

    gate.send(Ok(2)).unwrap();
    cache.settle_next().await;
    assert_eq!(subscription.status().data(), Some(&2));
    assert!(!cache.refetch(&CacheKey::detail(Endpoint::Videos, 1)));
  }

  #[tokio::test]
  async fn test_refetch_while_pending_shares_the_request() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    let gate = fetcher.expect_call();

    let subscription = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    assert!(!cache.refetch(&videos_key()));
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(cache.in_flight(), 1);

    gate.send(Ok(4)).unwrap();
    assert_eq!(cache.settle_next().await, Some(true));
    assert_eq!(subscription.status().data(), Some(&4));
    assert_eq!(cache.settle_next().await, None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_unused_entries_expire() {
    let options = CacheOptions {
      keep_unused_for: Duration::from_secs(60),
      max_entries: 16,
    };
    let mut cache = QueryCache::new("videos", options);
    let fetcher = GatedFetcher::default();
    fetcher.expect_call().send(Ok(1)).unwrap();

    let subscription = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    cache.settle_next().await;
    cache.release(subscription);

    tokio::time::advance(Duration::from_secs(30)).await;
    cache.poll();
    assert!(cache.contains(&videos_key()));

    tokio::time::advance(Duration::from_secs(31)).await;
    cache.poll();
    assert!(!cache.contains(&videos_key()));
  }

  #[tokio::test(start_paused = true)]
  async fn test_subscribed_entries_never_expire() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    fetcher.expect_call().send(Ok(1)).unwrap();

    let _subscription = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    cache.settle_next().await;

    tokio::time::advance(Duration::from_secs(3600)).await;
    cache.poll();
    assert!(cache.contains(&videos_key()));
  }

  #[tokio::test(start_paused = true)]
  async fn test_pending_entries_survive_eviction() {
    let mut cache = QueryCache::new("videos", CacheOptions::default());
    let fetcher = GatedFetcher::default();
    let _gate = fetcher.expect_call();

    let subscription = cache.query(videos_key(), videos_tags(), fetcher.fetcher());
    cache.release(subscription);

    tokio::time::advance(Duration::from_secs(3600)).await;
    cache.poll();
    assert!(cache.contains(&videos_key()));
  }

  #[tokio::test(start_paused = true)]
  async fn test_capacity_evicts_longest_unused_first() {
    let options = CacheOptions {
      keep_unused_for: Duration::from_secs(3600),
      max_entries: 2,
    };
    let mut cache = QueryCache::new("groups", options);
    let fetcher = GatedFetcher::default();

    let keys: Vec<CacheKey> = (1..=3)
      .map(|page| CacheKey::list(Endpoint::Groups, &QueryArgs::new().with("page", page as u32)))
      .collect();

    for key in &keys {
      fetcher.expect_call().send(Ok(0)).unwrap();
      let subscription = cache.query(key.clone(), Vec::new(), fetcher.fetcher());
      cache.settle_next().await;
      cache.release(subscription);
      tokio::time::advance(Duration::from_secs(1)).await;
    }

    cache.poll();
    assert_eq!(cache.len(), 2);
    assert!(!cache.contains(&keys[0]));
    assert!(cache.contains(&keys[1]));
    assert!(cache.contains(&keys[2]));
  }
}
