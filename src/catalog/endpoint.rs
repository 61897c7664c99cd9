use std::fmt;

/// A named collection on the catalog API.
///
/// The set is closed: every list page, detail page and cache tag refers to
/// one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
  Videos,
  Groups,
  Competitions,
  Performances,
  Tags,
  Awards,
  AwardRecords,
}

impl Endpoint {
  pub const ALL: [Endpoint; 7] = [
    Endpoint::Videos,
    Endpoint::Groups,
    Endpoint::Competitions,
    Endpoint::Performances,
    Endpoint::Tags,
    Endpoint::Awards,
    Endpoint::AwardRecords,
  ];

  /// Stable key, used in routes, config and cache keys
  pub fn key(self) -> &'static str {
    match self {
      Endpoint::Videos => "videos",
      Endpoint::Groups => "groups",
      Endpoint::Competitions => "competitions",
      Endpoint::Performances => "performances",
      Endpoint::Tags => "tags",
      Endpoint::Awards => "awards",
      Endpoint::AwardRecords => "award-records",
    }
  }

  /// Path below the API base URL (without slashes)
  pub fn api_path(self) -> &'static str {
    match self {
      Endpoint::AwardRecords => "awards/award-records",
      other => other.key(),
    }
  }

  /// Human-readable title for page headers
  pub fn title(self) -> &'static str {
    match self {
      Endpoint::Videos => "Videos",
      Endpoint::Groups => "Groups",
      Endpoint::Competitions => "Competitions",
      Endpoint::Performances => "Performances",
      Endpoint::Tags => "Tags",
      Endpoint::Awards => "Awards",
      Endpoint::AwardRecords => "Award Records",
    }
  }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|e| e.key() == key)
  }
}

impl fmt::Display for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}
