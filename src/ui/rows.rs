//! How each entity is shown in list rows and on detail pages.

use crate::catalog::types::{
  Award, AwardRecord, Competition, Group, Performance, Tag, Video, VideoDetail,
};

/// Two-column text for a list row
pub trait ListRow {
  fn primary(&self) -> String;
  fn secondary(&self) -> String;
}

/// Labelled fields for a detail page
pub trait DetailFields {
  fn heading(&self) -> String;
  fn fields(&self) -> Vec<(&'static str, String)>;
  fn description(&self) -> Option<&str> {
    None
  }
}

fn joined(parts: impl IntoIterator<Item = Option<String>>) -> String {
  parts.into_iter().flatten().collect::<Vec<_>>().join(" · ")
}

fn names<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
  let names: Vec<&str> = items.into_iter().collect();
  if names.is_empty() {
    "-".to_string()
  } else {
    names.join(", ")
  }
}

fn or_dash(value: Option<&str>) -> String {
  value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

impl ListRow for Video {
  fn primary(&self) -> String {
    self.title.clone()
  }

  fn secondary(&self) -> String {
    joined([
      Some(format!("{} views", self.view_count)),
      self.performance_date.clone(),
      Some(self.bv_number.clone()).filter(|bv| !bv.is_empty()),
    ])
  }
}

impl ListRow for Group {
  fn primary(&self) -> String {
    self.name.clone()
  }

  fn secondary(&self) -> String {
    joined([
      self.founded_date.as_ref().map(|d| format!("founded {}", d)),
      self.website.clone(),
    ])
  }
}

impl ListRow for Competition {
  fn primary(&self) -> String {
    self.name.clone()
  }

  fn secondary(&self) -> String {
    joined([self.year.map(|y| y.to_string()), self.location.clone()])
  }
}

impl ListRow for Performance {
  fn primary(&self) -> String {
    self.title.clone()
  }

  fn secondary(&self) -> String {
    joined([
      self.kind.clone(),
      self.original_work.clone(),
      self.group.as_ref().map(|g| g.name.clone()),
    ])
  }
}

impl ListRow for Tag {
  fn primary(&self) -> String {
    self.name.clone()
  }

  fn secondary(&self) -> String {
    self.category.clone().unwrap_or_default()
  }
}

impl ListRow for Award {
  fn primary(&self) -> String {
    self.name.clone()
  }

  fn secondary(&self) -> String {
    joined([
      self.competition.as_ref().map(|c| c.name.clone()),
      self.rank.map(|r| format!("rank {}", r)),
    ])
  }
}

impl ListRow for AwardRecord {
  fn primary(&self) -> String {
    self
      .award
      .as_ref()
      .map_or_else(|| format!("Award record #{}", self.id), |a| a.name.clone())
  }

  fn secondary(&self) -> String {
    joined([
      Some(self.year.to_string()),
      self.video.as_ref().map(|v| v.title.clone()),
      self.group.as_ref().map(|g| g.name.clone()),
    ])
  }
}

impl DetailFields for VideoDetail {
  fn heading(&self) -> String {
    self.video.title.clone()
  }

  fn fields(&self) -> Vec<(&'static str, String)> {
    let video = &self.video;
    let rating = match (self.average_rating, self.rating_count) {
      (Some(avg), Some(n)) => format!("{:.1} ({} ratings)", avg, n),
      (Some(avg), None) => format!("{:.1}", avg),
      _ => "-".to_string(),
    };

    vec![
      ("BV", or_dash(Some(video.bv_number.as_str()))),
      ("Views", video.view_count.to_string()),
      ("Uploaded", or_dash(video.upload_date.as_deref())),
      ("Performed", or_dash(video.performance_date.as_deref())),
      ("Rating", rating),
      ("Groups", names(self.groups.iter().map(|g| g.name.as_str()))),
      (
        "Performances",
        names(self.performances.iter().map(|p| p.title.as_str())),
      ),
      ("Tags", names(self.tags.iter().map(|t| t.name.as_str()))),
      (
        "Awards",
        names(
          self
            .awards
            .iter()
            .filter_map(|r| r.award.as_ref().map(|a| a.name.as_str())),
        ),
      ),
      ("URL", or_dash(Some(video.url.as_str()))),
    ]
  }

  fn description(&self) -> Option<&str> {
    self.video.description.as_deref()
  }
}

impl DetailFields for Group {
  fn heading(&self) -> String {
    self.name.clone()
  }

  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      ("Founded", or_dash(self.founded_date.as_deref())),
      ("Website", or_dash(self.website.as_deref())),
    ]
  }

  fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }
}

impl DetailFields for Competition {
  fn heading(&self) -> String {
    self.name.clone()
  }

  fn fields(&self) -> Vec<(&'static str, String)> {
    let dates = match (&self.start_date, &self.end_date) {
      (Some(start), Some(end)) => format!("{} to {}", start, end),
      (Some(start), None) => start.clone(),
      _ => "-".to_string(),
    };
    vec![
      ("Year", self.year.map_or_else(|| "-".to_string(), |y| y.to_string())),
      ("Location", or_dash(self.location.as_deref())),
      ("Dates", dates),
      ("Website", or_dash(self.website.as_deref())),
    ]
  }

  fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }
}

impl DetailFields for Performance {
  fn heading(&self) -> String {
    self.title.clone()
  }

  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      ("Type", or_dash(self.kind.as_deref())),
      ("Original work", or_dash(self.original_work.as_deref())),
      ("Group", or_dash(self.group.as_ref().map(|g| g.name.as_str()))),
      ("Debut", or_dash(self.debut_date.as_deref())),
    ]
  }

  fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }
}

impl DetailFields for Tag {
  fn heading(&self) -> String {
    self.name.clone()
  }

  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![("Category", or_dash(self.category.as_deref()))]
  }
}

impl DetailFields for Award {
  fn heading(&self) -> String {
    self.name.clone()
  }

  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      (
        "Competition",
        or_dash(self.competition.as_ref().map(|c| c.name.as_str())),
      ),
      ("Rank", self.rank.map_or_else(|| "-".to_string(), |r| r.to_string())),
    ]
  }

  fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }
}

impl DetailFields for AwardRecord {
  fn heading(&self) -> String {
    self.primary()
  }

  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      ("Year", self.year.to_string()),
      ("Video", or_dash(self.video.as_ref().map(|v| v.title.as_str()))),
      (
        "Performance",
        or_dash(self.performance.as_ref().map(|p| p.title.as_str())),
      ),
      ("Group", or_dash(self.group.as_ref().map(|g| g.name.as_str()))),
    ]
  }

  fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }
}
