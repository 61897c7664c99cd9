use crate::catalog::Endpoint;

/// One choice of the `ordering` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingOption {
  pub value: &'static str,
  pub label: &'static str,
}

const VIDEO_ORDERINGS: &[OrderingOption] = &[
  OrderingOption {
    value: "-created_at",
    label: "Newest",
  },
  OrderingOption {
    value: "-view_count",
    label: "Most viewed",
  },
  OrderingOption {
    value: "-performance_date",
    label: "Latest performance",
  },
  OrderingOption {
    value: "title",
    label: "Title",
  },
];

/// Which filter fields a list page recognizes and what their defaults are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListProfile {
  pub endpoint: Endpoint,
  pub page_size: u32,
  pub default_ordering: Option<&'static str>,
  /// Accepted `ordering` values; empty when the page cannot be sorted
  pub orderings: &'static [OrderingOption],
  pub search: bool,
  pub tags: bool,
  pub year: bool,
}

impl ListProfile {
  pub fn for_endpoint(endpoint: Endpoint) -> Self {
    let base = Self {
      endpoint,
      page_size: 20,
      default_ordering: None,
      orderings: &[],
      search: true,
      tags: false,
      year: false,
    };

    match endpoint {
      Endpoint::Videos => Self {
        default_ordering: Some("-created_at"),
        orderings: VIDEO_ORDERINGS,
        tags: true,
        year: true,
        ..base
      },
      Endpoint::Groups => Self {
        page_size: 12,
        ..base
      },
      Endpoint::Competitions => Self {
        page_size: 12,
        year: true,
        ..base
      },
      Endpoint::Tags => Self {
        page_size: 50,
        ..base
      },
      Endpoint::AwardRecords => Self {
        search: false,
        year: true,
        ..base
      },
      Endpoint::Performances | Endpoint::Awards => base,
    }
  }

  pub fn with_page_size(self, page_size: u32) -> Self {
    Self { page_size, ..self }
  }

  /// The accepted ordering equal to `value`, if any.
  pub fn ordering(&self, value: &str) -> Option<&'static str> {
    self
      .orderings
      .iter()
      .find(|o| o.value == value)
      .map(|o| o.value)
  }

  pub fn ordering_label(&self, value: Option<&str>) -> Option<&'static str> {
    let value = value?;
    self.orderings.iter().find(|o| o.value == value).map(|o| o.label)
  }

  /// The ordering after `current`, wrapping around.
  pub fn next_ordering(&self, current: Option<&str>) -> Option<&'static str> {
    if self.orderings.is_empty() {
      return None;
    }
    let next = current
      .and_then(|c| self.orderings.iter().position(|o| o.value == c))
      .map_or(0, |i| (i + 1) % self.orderings.len());
    Some(self.orderings[next].value)
  }
}
