use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use url::form_urlencoded;

use crate::cache::QueryArgs;

use super::profile::ListProfile;

/// Largest `page_size` accepted from an address
const MAX_PAGE_SIZE: u32 = 100;

/// In-memory filter, sort and pagination state of a list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
  pub search: Option<String>,
  pub tags: BTreeSet<u64>,
  pub ordering: Option<&'static str>,
  pub year: Option<i32>,
  pub page: u32,
  pub page_size: u32,
}

impl FilterState {
  pub fn defaults(profile: &ListProfile) -> Self {
    Self {
      search: None,
      tags: BTreeSet::new(),
      ordering: profile.default_ordering,
      year: None,
      page: 1,
      page_size: profile.page_size,
    }
  }

  /// Read state from a query string (with or without the leading `?`).
  ///
  /// Never fails: unknown keys and fields the page does not recognize are
  /// ignored, malformed values fall back to their defaults, and only the
  /// first occurrence of a repeated key counts.
  pub fn parse(profile: &ListProfile, query: &str) -> Self {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut state = Self::defaults(profile);
    let mut seen = BTreeSet::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
      if !seen.insert(key.clone()) {
        continue;
      }

      match key.as_ref() {
        "search" if profile.search => {
          state.search = Some(value.into_owned()).filter(|s| !s.trim().is_empty());
        }
        "tags" if profile.tags => {
          state.tags = parse_tags(&value);
        }
        "ordering" if !profile.orderings.is_empty() => match profile.ordering(&value) {
          Some(ordering) => state.ordering = Some(ordering),
          None => debug!(%value, "unknown ordering, using default"),
        },
        "year" if profile.year => match value.parse::<i32>() {
          Ok(year) if year > 0 => state.year = Some(year),
          _ => debug!(%value, "invalid year ignored"),
        },
        "page" => match value.parse::<u32>() {
          Ok(page) if page >= 1 => state.page = page,
          _ => debug!(%value, "invalid page, using 1"),
        },
        "page_size" => match value.parse::<u32>() {
          Ok(size) if (1..=MAX_PAGE_SIZE).contains(&size) => state.page_size = size,
          _ => debug!(%value, "invalid page_size, using default"),
        },
        _ => {}
      }
    }

    state
  }

  /// Query string for the address bar (no leading `?`).
  ///
  /// Keys are alphabetical and fields equal to their default are omitted,
  /// so the default state serializes to an empty string.
  pub fn serialize(&self, profile: &ListProfile) -> String {
    let mut fields: BTreeMap<&str, String> = BTreeMap::new();

    if let Some(search) = &self.search {
      fields.insert("search", form_urlencoded::byte_serialize(search.as_bytes()).collect());
    }
    if !self.tags.is_empty() {
      let tags: Vec<String> = self.tags.iter().map(u64::to_string).collect();
      fields.insert("tags", tags.join(","));
    }
    if self.ordering != profile.default_ordering {
      if let Some(ordering) = self.ordering {
        fields.insert("ordering", ordering.to_string());
      }
    }
    if let Some(year) = self.year {
      fields.insert("year", year.to_string());
    }
    if self.page != 1 {
      fields.insert("page", self.page.to_string());
    }
    if self.page_size != profile.page_size {
      fields.insert("page_size", self.page_size.to_string());
    }

    fields
      .into_iter()
      .map(|(key, value)| format!("{}={}", key, value))
      .collect::<Vec<_>>()
      .join("&")
  }

  /// Arguments for the list request this state describes.
  pub fn to_query_args(&self) -> QueryArgs {
    let mut args = QueryArgs::new()
      .with("page", self.page)
      .with("page_size", self.page_size);

    if let Some(search) = &self.search {
      args.set("search", search.as_str());
    }
    if !self.tags.is_empty() {
      args.set("tags", self.tags.iter().map(|&t| t as i64).collect::<Vec<i64>>());
    }
    if let Some(ordering) = self.ordering {
      args.set("ordering", ordering);
    }
    if let Some(year) = self.year {
      args.set("year", year);
    }
    args
  }

  /// Whether any user-facing filter differs from the defaults.
  pub fn is_filtered(&self, profile: &ListProfile) -> bool {
    self.search.is_some()
      || !self.tags.is_empty()
      || self.year.is_some()
      || self.ordering != profile.default_ordering
  }
}

fn parse_tags(value: &str) -> BTreeSet<u64> {
  value
    .split(',')
    .filter(|item| !item.is_empty())
    .filter_map(|item| match item.trim().parse::<u64>() {
      Ok(id) => Some(id),
      Err(_) => {
        debug!(item, "invalid tag id skipped");
        None
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::ArgValue;
  use crate::catalog::Endpoint;

  fn videos() -> ListProfile {
    ListProfile::for_endpoint(Endpoint::Videos)
  }

  #[test]
  fn test_parse_page_and_ordering() {
    let state = FilterState::parse(&videos(), "page=3&ordering=title");
    assert_eq!(
      state,
      FilterState {
        search: None,
        tags: BTreeSet::new(),
        ordering: Some("title"),
        year: None,
        page: 3,
        page_size: 20,
      }
    );
    assert_eq!(state.serialize(&videos()), "ordering=title&page=3");
  }

  #[test]
  fn test_default_state_serializes_empty() {
    let profile = videos();
    assert_eq!(FilterState::defaults(&profile).serialize(&profile), "");
    assert_eq!(FilterState::parse(&profile, ""), FilterState::defaults(&profile));
    assert_eq!(FilterState::parse(&profile, "?"), FilterState::defaults(&profile));
  }

  #[test]
  fn test_malformed_values_fall_back_to_defaults() {
    let profile = videos();
    let state = FilterState::parse(
      &profile,
      "page=-2&page_size=abc&ordering=-likes&year=soon&tags=4,x,1,,9",
    );
    assert_eq!(state.page, 1);
    assert_eq!(state.page_size, 20);
    assert_eq!(state.ordering, Some("-created_at"));
    assert_eq!(state.year, None);
    assert_eq!(state.tags, BTreeSet::from([1, 4, 9]));
  }

  #[test]
  fn test_unrecognized_fields_are_ignored() {
    let groups = ListProfile::for_endpoint(Endpoint::Groups);
    let state = FilterState::parse(&groups, "tags=1,2&ordering=title&year=2023&utm_source=x");
    assert_eq!(state, FilterState::defaults(&groups));
  }

  #[test]
  fn test_first_occurrence_wins() {
    let state = FilterState::parse(&videos(), "page=2&page=5");
    assert_eq!(state.page, 2);
  }

  #[test]
  fn test_round_trip() {
    let profile = videos();
    let states = [
      FilterState::defaults(&profile),
      FilterState {
        search: Some("hatsune miku & friends".to_string()),
        tags: BTreeSet::from([12, 3]),
        ordering: Some("-view_count"),
        year: Some(2023),
        page: 4,
        page_size: 40,
      },
      FilterState {
        search: Some("100%+".to_string()),
        ..FilterState::defaults(&profile)
      },
    ];

    for state in states {
      let query = state.serialize(&profile);
      assert_eq!(FilterState::parse(&profile, &query), state, "query: {}", query);
    }
  }

  #[test]
  fn test_serialize_is_alphabetical() {
    let profile = videos();
    let state = FilterState {
      search: Some("a b".to_string()),
      tags: BTreeSet::from([7, 2]),
      ordering: Some("title"),
      year: Some(2022),
      page: 2,
      page_size: 10,
    };
    assert_eq!(
      state.serialize(&profile),
      "ordering=title&page=2&page_size=10&search=a+b&tags=2,7&year=2022"
    );
  }

  #[test]
  fn test_query_args_include_paging() {
    let profile = videos();
    let mut state = FilterState::defaults(&profile);
    state.tags.insert(5);

    let args = state.to_query_args();
    assert_eq!(args.get("page"), Some(&ArgValue::Int(1)));
    assert_eq!(args.get("page_size"), Some(&ArgValue::Int(20)));
    assert_eq!(args.get("ordering"), Some(&ArgValue::Text("-created_at".to_string())));
    assert_eq!(args.get("tags"), Some(&ArgValue::List(vec![5])));
    assert_eq!(args.get("search"), None);
  }
}
