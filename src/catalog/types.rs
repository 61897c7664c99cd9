//! Serde types matching catalog API responses.
//!
//! Optional fields are tolerated as missing; list endpoints return the
//! nested objects only on detail responses.

use serde::{Deserialize, Serialize};

/// Paginated list envelope returned by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub count: u64,
  pub next: Option<String>,
  pub previous: Option<String>,
  pub results: Vec<T>,
}

impl<T> Page<T> {
  /// Number of pages for the given page size (at least 1).
  pub fn total_pages(&self, page_size: u32) -> u32 {
    if page_size == 0 {
      return 1;
    }
    let pages = self.count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
  }

  pub fn is_empty(&self) -> bool {
    self.results.is_empty()
  }
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
  pub id: u64,
  #[serde(default)]
  pub bv_number: String,
  pub title: String,
  #[serde(default)]
  pub url: String,
  pub thumbnail: Option<String>,
  pub description: Option<String>,
  pub upload_date: Option<String>,
  #[serde(default)]
  pub view_count: u64,
  pub performance_date: Option<String>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

/// Video with its related records, as returned by `videos/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetail {
  #[serde(flatten)]
  pub video: Video,
  #[serde(default)]
  pub groups: Vec<Group>,
  #[serde(default)]
  pub performances: Vec<Performance>,
  #[serde(default)]
  pub tags: Vec<Tag>,
  #[serde(default)]
  pub awards: Vec<AwardRecord>,
  pub average_rating: Option<f64>,
  pub rating_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
  pub id: u64,
  pub name: String,
  pub logo: Option<String>,
  pub founded_date: Option<String>,
  pub description: Option<String>,
  pub website: Option<String>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
  pub id: u64,
  pub title: String,
  pub group_id: Option<u64>,
  pub group: Option<Group>,
  pub original_work: Option<String>,
  pub description: Option<String>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub debut_date: Option<String>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
  pub id: u64,
  pub name: String,
  pub category: Option<String>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
  pub id: u64,
  pub name: String,
  pub year: Option<i32>,
  pub location: Option<String>,
  pub website: Option<String>,
  pub description: Option<String>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Award {
  pub id: u64,
  #[serde(default)]
  pub competition_id: Option<u64>,
  pub competition: Option<Competition>,
  pub name: String,
  pub description: Option<String>,
  pub rank: Option<i32>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardRecord {
  pub id: u64,
  #[serde(default)]
  pub award_id: Option<u64>,
  pub award: Option<Award>,
  pub video_id: Option<u64>,
  pub video: Option<Video>,
  pub performance_id: Option<u64>,
  pub performance: Option<Performance>,
  pub group_id: Option<u64>,
  pub group: Option<Group>,
  pub year: i32,
  pub description: Option<String>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}
