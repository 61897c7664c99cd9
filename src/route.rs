//! Addresses of pages relative to the web root.

use url::Url;

use crate::catalog::Endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  /// `/`, redirected to the videos list
  Home,
  List(Endpoint),
  Detail(Endpoint, u64),
}

impl Route {
  /// Match `url` against the pages below `base`.
  ///
  /// Returns `None` for addresses outside `base` or unknown paths.
  pub fn parse(base: &Url, url: &Url) -> Option<Self> {
    if url.origin() != base.origin() {
      return None;
    }
    let rest = url.path().strip_prefix(base.path())?;
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
      [] => Some(Route::Home),
      [endpoint] => Endpoint::from_key(endpoint).map(Route::List),
      [endpoint, id] => {
        let endpoint = Endpoint::from_key(endpoint)?;
        id.parse().ok().map(|id| Route::Detail(endpoint, id))
      }
      _ => None,
    }
  }

  pub fn path(&self) -> String {
    match self {
      Route::Home => String::new(),
      Route::List(endpoint) => endpoint.key().to_string(),
      Route::Detail(endpoint, id) => format!("{}/{}", endpoint.key(), id),
    }
  }

  /// Address of this page without a query string.
  pub fn to_url(&self, base: &Url) -> Url {
    let mut url = base.clone();
    url.set_path(&format!("{}{}", base.path(), self.path()));
    url.set_query(None);
    url.set_fragment(None);
    url
  }
}

/// Resolve what the user typed into the address bar.
///
/// Absolute URLs are taken as-is, anything else is relative to `base`
/// (a leading `/` is relative to `base` too, not to the host root).
pub fn resolve_location(base: &Url, input: &str) -> Result<Url, url::ParseError> {
  let input = input.trim();
  match Url::parse(input) {
    Ok(url) => Ok(url),
    Err(url::ParseError::RelativeUrlWithoutBase) => base.join(input.trim_start_matches('/')),
    Err(e) => Err(e),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn base() -> Url {
    Url::parse("https://cos.example.com/app/").unwrap()
  }

  #[test]
  fn test_parse_routes() {
    let base = base();
    let at = |path: &str| Route::parse(&base, &base.join(path).unwrap());

    assert_eq!(at(""), Some(Route::Home));
    assert_eq!(at("videos"), Some(Route::List(Endpoint::Videos)));
    assert_eq!(at("videos/?page=2"), Some(Route::List(Endpoint::Videos)));
    assert_eq!(at("groups/17"), Some(Route::Detail(Endpoint::Groups, 17)));
    assert_eq!(at("award-records/2"), Some(Route::Detail(Endpoint::AwardRecords, 2)));
    assert_eq!(at("groups/abc"), None);
    assert_eq!(at("players"), None);
    assert_eq!(at("videos/1/comments"), None);
  }

  #[test]
  fn test_foreign_addresses_do_not_match() {
    let base = base();
    let other_host = Url::parse("https://elsewhere.example.com/app/videos").unwrap();
    let other_root = Url::parse("https://cos.example.com/videos").unwrap();
    assert_eq!(Route::parse(&base, &other_host), None);
    assert_eq!(Route::parse(&base, &other_root), None);
  }

  #[test]
  fn test_to_url_round_trips() {
    let base = base();
    for route in [
      Route::Home,
      Route::List(Endpoint::Competitions),
      Route::Detail(Endpoint::Videos, 12),
    ] {
      let url = route.to_url(&base);
      assert_eq!(Route::parse(&base, &url), Some(route));
    }
    assert_eq!(
      Route::Detail(Endpoint::Videos, 12).to_url(&base).as_str(),
      "https://cos.example.com/app/videos/12"
    );
  }

  #[test]
  fn test_resolve_location() {
    let base = base();
    assert_eq!(
      resolve_location(&base, "videos?ordering=title&page=2")
        .unwrap()
        .as_str(),
      "https://cos.example.com/app/videos?ordering=title&page=2"
    );
    assert_eq!(
      resolve_location(&base, "/groups/3").unwrap().as_str(),
      "https://cos.example.com/app/groups/3"
    );
    assert_eq!(
      resolve_location(&base, "https://cos.example.com/app/tags")
        .unwrap()
        .as_str(),
      "https://cos.example.com/app/tags"
    );
  }
}
