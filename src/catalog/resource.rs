use serde::de::DeserializeOwned;

use super::endpoint::Endpoint;
use super::store::{CacheStore, ResourceCaches};
use super::types::{Award, AwardRecord, Competition, Group, Performance, Tag, Video, VideoDetail};

/// An entity type served by one catalog endpoint.
///
/// Ties the list row type to its detail type, its endpoint and the cache
/// pair that holds both inside a [`CacheStore`].
pub trait Resource: DeserializeOwned + Send + Sync + 'static {
  /// Shape returned by `{endpoint}/{id}/`
  type Detail: DeserializeOwned + Send + Sync + 'static;

  const ENDPOINT: Endpoint;

  fn id(&self) -> u64;

  fn caches(store: &mut CacheStore) -> &mut ResourceCaches<Self>;
}

macro_rules! resource {
  ($ty:ty, $detail:ty, $endpoint:expr, $field:ident) => {
    impl Resource for $ty {
      type Detail = $detail;

      const ENDPOINT: Endpoint = $endpoint;

      fn id(&self) -> u64 {
        self.id
      }

      fn caches(store: &mut CacheStore) -> &mut ResourceCaches<Self> {
        &mut store.$field
      }
    }
  };
}

resource!(Video, VideoDetail, Endpoint::Videos, videos);
resource!(Group, Group, Endpoint::Groups, groups);
resource!(Competition, Competition, Endpoint::Competitions, competitions);
resource!(Performance, Performance, Endpoint::Performances, performances);
resource!(Tag, Tag, Endpoint::Tags, tags);
resource!(Award, Award, Endpoint::Awards, awards);
resource!(AwardRecord, AwardRecord, Endpoint::AwardRecords, award_records);
