mod detail;
mod list;

pub use detail::DetailView;
pub use list::ListView;

use crate::catalog::types::{Award, AwardRecord, Competition, Group, Performance, Tag, Video};
use crate::catalog::{CacheStore, Endpoint};
use crate::config::Config;
use crate::route::Route;
use crate::ui::view::View;

/// Build the page for `route`, subscribing it to the store.
///
/// `query` is the address's query string; detail pages ignore it.
pub fn mount(route: Route, query: Option<&str>, config: &Config, store: &mut CacheStore) -> Box<dyn View> {
  match route {
    Route::Home => mount(Route::List(Endpoint::Videos), query, config, store),
    Route::List(endpoint) => {
      let profile = config.profile(endpoint);
      let tags = config.profile(Endpoint::Tags);
      match endpoint {
        Endpoint::Videos => Box::new(ListView::<Video>::new(profile, &tags, query, store)),
        Endpoint::Groups => Box::new(ListView::<Group>::new(profile, &tags, query, store)),
        Endpoint::Competitions => Box::new(ListView::<Competition>::new(profile, &tags, query, store)),
        Endpoint::Performances => Box::new(ListView::<Performance>::new(profile, &tags, query, store)),
        Endpoint::Tags => Box::new(ListView::<Tag>::new(profile, &tags, query, store)),
        Endpoint::Awards => Box::new(ListView::<Award>::new(profile, &tags, query, store)),
        Endpoint::AwardRecords => Box::new(ListView::<AwardRecord>::new(profile, &tags, query, store)),
      }
    }
    Route::Detail(endpoint, id) => match endpoint {
      Endpoint::Videos => Box::new(DetailView::<Video>::new(id, store)),
      Endpoint::Groups => Box::new(DetailView::<Group>::new(id, store)),
      Endpoint::Competitions => Box::new(DetailView::<Competition>::new(id, store)),
      Endpoint::Performances => Box::new(DetailView::<Performance>::new(id, store)),
      Endpoint::Tags => Box::new(DetailView::<Tag>::new(id, store)),
      Endpoint::Awards => Box::new(DetailView::<Award>::new(id, store)),
      Endpoint::AwardRecords => Box::new(DetailView::<AwardRecord>::new(id, store)),
    },
  }
}
