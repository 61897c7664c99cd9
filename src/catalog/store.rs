use tracing::debug;

use crate::cache::{CacheKey, CacheOptions, CacheTag, QueryArgs, QueryCache, Subscription};

use super::client::CatalogClient;
use super::resource::Resource;
use super::types::{Award, AwardRecord, Competition, Group, Page, Performance, Tag, Video};

/// List and detail caches of one resource type.
pub struct ResourceCaches<R: Resource> {
  pub list: QueryCache<Page<R>>,
  pub detail: QueryCache<R::Detail>,
}

impl<R: Resource> ResourceCaches<R> {
  fn new(options: CacheOptions) -> Self {
    Self {
      list: QueryCache::new(R::ENDPOINT.key(), options),
      detail: QueryCache::new(R::ENDPOINT.key(), options),
    }
  }
}

/// Operations shared by caches of every value type.
trait AnyCache {
  fn invalidate(&mut self, tag: &CacheTag) -> usize;
  fn poll(&mut self) -> usize;
  fn in_flight(&self) -> usize;
}

impl<V: Send + Sync + 'static> AnyCache for QueryCache<V> {
  fn invalidate(&mut self, tag: &CacheTag) -> usize {
    QueryCache::invalidate(self, tag)
  }

  fn poll(&mut self) -> usize {
    QueryCache::poll(self)
  }

  fn in_flight(&self) -> usize {
    QueryCache::in_flight(self)
  }
}

/// Process-wide owner of every query cache.
///
/// Views get `&mut CacheStore` and subscribe through [`Self::list`] and
/// [`Self::detail`]; the event loop calls [`Self::poll`] on each tick.
pub struct CacheStore {
  client: CatalogClient,
  pub(super) videos: ResourceCaches<Video>,
  pub(super) groups: ResourceCaches<Group>,
  pub(super) competitions: ResourceCaches<Competition>,
  pub(super) performances: ResourceCaches<Performance>,
  pub(super) tags: ResourceCaches<Tag>,
  pub(super) awards: ResourceCaches<Award>,
  pub(super) award_records: ResourceCaches<AwardRecord>,
}

impl CacheStore {
  pub fn new(client: CatalogClient, options: CacheOptions) -> Self {
    Self {
      client,
      videos: ResourceCaches::new(options),
      groups: ResourceCaches::new(options),
      competitions: ResourceCaches::new(options),
      performances: ResourceCaches::new(options),
      tags: ResourceCaches::new(options),
      awards: ResourceCaches::new(options),
      award_records: ResourceCaches::new(options),
    }
  }

  pub fn client(&self) -> &CatalogClient {
    &self.client
  }

  /// Subscribe to one page of `R`'s list endpoint.
  pub fn list<R: Resource>(&mut self, args: &QueryArgs) -> Subscription<Page<R>> {
    let key = CacheKey::list(R::ENDPOINT, args);
    let normalized = args.normalize();
    let client = self.client.clone();

    R::caches(self)
      .list
      .query(key, vec![CacheTag::all(R::ENDPOINT)], move || {
        let client = client.clone();
        let args = normalized.clone();
        async move { client.get_page::<R>(R::ENDPOINT, &args).await }
      })
  }

  /// Subscribe to a single `R` by id.
  pub fn detail<R: Resource>(&mut self, id: u64) -> Subscription<R::Detail> {
    let key = CacheKey::detail(R::ENDPOINT, id);
    let client = self.client.clone();

    R::caches(self)
      .detail
      .query(key, vec![CacheTag::item(R::ENDPOINT, id)], move || {
        let client = client.clone();
        async move { client.get_one::<R::Detail>(R::ENDPOINT, id).await }
      })
  }

  pub fn list_cache<R: Resource>(&mut self) -> &mut QueryCache<Page<R>> {
    &mut R::caches(self).list
  }

  pub fn detail_cache<R: Resource>(&mut self) -> &mut QueryCache<R::Detail> {
    &mut R::caches(self).detail
  }

  /// Invalidate `tag` in every cache. Returns the number of entries hit.
  pub fn invalidate(&mut self, tag: &CacheTag) -> usize {
    let count: usize = self.caches_mut().into_iter().map(|c| c.invalidate(tag)).sum();
    debug!(%tag, count, "store invalidated");
    count
  }

  /// Apply finished fetches in every cache.
  ///
  /// Returns the number of entries that transitioned.
  pub fn poll(&mut self) -> usize {
    self.caches_mut().into_iter().map(|c| c.poll()).sum()
  }

  pub fn in_flight(&mut self) -> usize {
    self.caches_mut().into_iter().map(|c| c.in_flight()).sum()
  }

  fn caches_mut(&mut self) -> [&mut dyn AnyCache; 14] {
    [
      &mut self.videos.list,
      &mut self.videos.detail,
      &mut self.groups.list,
      &mut self.groups.detail,
      &mut self.competitions.list,
      &mut self.competitions.detail,
      &mut self.performances.list,
      &mut self.performances.detail,
      &mut self.tags.list,
      &mut self.tags.detail,
      &mut self.awards.list,
      &mut self.awards.detail,
      &mut self.award_records.list,
      &mut self.award_records.detail,
    ]
  }
}
