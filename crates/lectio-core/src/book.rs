//! Catalog books.
//!
//! A book may be saved as an incomplete draft, but it can only be marked
//! published once every catalog field is filled in. Unpublished books never
//! appear in user-facing listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
  Polar,
  Romance,
  Sf,
  Feelgood,
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
  pub book_id:      Uuid,
  pub title:        String,
  pub author:       String,
  pub genre:        Option<Genre>,
  pub summary:      String,
  /// Where the reader fetches the book's content.
  pub content_url:  String,
  pub published_at: Option<DateTime<Utc>>,
  pub published:    bool,
  pub ranking:      Option<i32>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Editable fields of a book, used both for creation and full updates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
  pub title:        String,
  pub author:       String,
  pub genre:        Option<Genre>,
  #[serde(default)]
  pub summary:      String,
  #[serde(default)]
  pub content_url:  String,
  pub published_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub published:    bool,
  pub ranking:      Option<i32>,
}

impl BookDraft {
  /// Names of the fields that still block publication.
  pub fn missing_for_publication(&self) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if self.title.trim().is_empty() {
      missing.push("title");
    }
    if self.author.trim().is_empty() {
      missing.push("author");
    }
    if self.genre.is_none() {
      missing.push("genre");
    }
    if self.summary.trim().is_empty() {
      missing.push("summary");
    }
    if self.content_url.trim().is_empty() {
      missing.push("contentUrl");
    }
    if self.published_at.is_none() {
      missing.push("publishedAt");
    }
    missing
  }

  /// Title and author are always required; everything else only once the
  /// draft is marked published.
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() || self.author.trim().is_empty() {
      return Err(Error::validation("title and author are required"));
    }
    if self.published {
      ensure_publishable(self)?;
    }
    Ok(())
  }
}

fn ensure_publishable(draft: &BookDraft) -> Result<()> {
  let missing = draft.missing_for_publication();
  if missing.is_empty() {
    Ok(())
  } else {
    Err(Error::Validation(format!(
      "cannot publish, missing: {}",
      missing.join(", ")
    )))
  }
}

impl Book {
  /// The editable view of this book.
  pub fn to_draft(&self) -> BookDraft {
    BookDraft {
      title:        self.title.clone(),
      author:       self.author.clone(),
      genre:        self.genre,
      summary:      self.summary.clone(),
      content_url:  self.content_url.clone(),
      published_at: self.published_at,
      published:    self.published,
      ranking:      self.ranking,
    }
  }

  /// The draft that results from flipping the published flag, validated.
  pub fn toggled(&self) -> Result<BookDraft> {
    let mut draft = self.to_draft();
    draft.published = !self.published;
    draft.validate()?;
    Ok(draft)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn complete_draft() -> BookDraft {
    BookDraft {
      title:        "Les Misérables".into(),
      author:       "Victor Hugo".into(),
      genre:        Some(Genre::Romance),
      summary:      "Jean Valjean".into(),
      content_url:  "https://cdn.example.com/miserables.epub".into(),
      published_at: Some(Utc::now()),
      published:    true,
      ranking:      Some(1),
    }
  }

  #[test]
  fn complete_draft_publishes() {
    assert!(complete_draft().validate().is_ok());
  }

  #[test]
  fn incomplete_draft_saves_unpublished() {
    let draft = BookDraft {
      title: "Draft".into(),
      author: "Someone".into(),
      ..BookDraft::default()
    };
    assert!(draft.validate().is_ok());
  }

  #[test]
  fn publishing_lists_missing_fields() {
    let mut draft = complete_draft();
    draft.genre = None;
    draft.content_url = " ".into();
    let err = draft.validate().unwrap_err();
    let Error::Validation(msg) = err else { panic!("unexpected {err:?}") };
    assert!(msg.contains("genre"), "{msg}");
    assert!(msg.contains("contentUrl"), "{msg}");
    assert!(!msg.contains("summary"), "{msg}");
  }

  #[test]
  fn title_and_author_always_required() {
    let draft = BookDraft { title: "Only a title".into(), ..BookDraft::default() };
    assert!(matches!(draft.validate(), Err(Error::Validation(_))));
  }
}
