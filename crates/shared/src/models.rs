use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::dates;

/// Name used when the user does not provide one
pub const ANONYMOUS_NAME: &str = "Anonymous Reader";

/// One article returned by the IBGE news API.
///
/// Equality and hashing only look at `id`: a record fetched again later
/// with refreshed text is still the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(rename = "titulo", default, deserialize_with = "string_or_null")]
    pub title: String,
    #[serde(rename = "introducao", default, deserialize_with = "string_or_null")]
    pub summary: String,
    #[serde(
        rename = "data_publicacao",
        alias = "dataPublicacao",
        default,
        with = "dates::opt_wire_timestamp"
    )]
    pub published_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "string_or_null")]
    pub link: String,
    #[serde(rename = "tipo", default)]
    pub category: Option<String>,
}

impl NewsRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: String::new(),
            published_at: None,
            link: String::new(),
            category: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_published_at(mut self, published_at: Option<NaiveDateTime>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = category.map(str::to_string);
        self
    }
}

impl PartialEq for NewsRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NewsRecord {}

impl Hash for NewsRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for NewsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Summary: {}", self.summary)?;
        writeln!(
            f,
            "Date: {}",
            dates::display_timestamp(self.published_at.as_ref())
        )?;
        writeln!(f, "Link: {}", self.link)?;
        writeln!(f, "Category: {}", self.category.as_deref().unwrap_or("-"))?;
        write!(f, "Source: IBGE")
    }
}

// The API sends numeric ids; saved profiles store them as strings
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

// Upstream items sometimes carry `null` text fields
fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which list a sequence of records belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Favorites,
    Read,
    ReadLater,
    SearchResults,
}

impl ListKind {
    /// Only lists owned by the profile allow removal
    pub fn is_profile_owned(&self) -> bool {
        !matches!(self, ListKind::SearchResults)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListKind::Favorites => "Favorite News",
            ListKind::Read => "Read News",
            ListKind::ReadLater => "Read Later",
            ListKind::SearchResults => "Search Results",
        }
    }
}

/// The local user and their three curated lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "favoritos", default)]
    pub favorites: Vec<NewsRecord>,
    #[serde(rename = "lidas", default)]
    pub read: Vec<NewsRecord>,
    #[serde(rename = "paraLerDepois", default)]
    pub read_later: Vec<NewsRecord>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns `None` for [`ListKind::SearchResults`], which the profile never owns
    pub fn list(&self, kind: ListKind) -> Option<&Vec<NewsRecord>> {
        match kind {
            ListKind::Favorites => Some(&self.favorites),
            ListKind::Read => Some(&self.read),
            ListKind::ReadLater => Some(&self.read_later),
            ListKind::SearchResults => None,
        }
    }

    pub fn list_mut(&mut self, kind: ListKind) -> Option<&mut Vec<NewsRecord>> {
        match kind {
            ListKind::Favorites => Some(&mut self.favorites),
            ListKind::Read => Some(&mut self.read),
            ListKind::ReadLater => Some(&mut self.read_later),
            ListKind::SearchResults => None,
        }
    }

    /// Drop entries whose id already appeared earlier in the same list.
    /// Returns how many were dropped.
    pub fn drop_duplicate_ids(&mut self) -> usize {
        [&mut self.favorites, &mut self.read, &mut self.read_later]
            .into_iter()
            .map(|list| {
                let before = list.len();
                let mut seen = HashSet::new();
                list.retain(|record| seen.insert(record.id.clone()));
                before - list.len()
            })
            .sum()
    }
}
