use std::cmp::Ordering;

use crate::models::{ListKind, NewsRecord, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// Result of resolving a 1-based menu choice against a list
#[derive(Debug, PartialEq, Eq)]
pub enum Selection<'a> {
    Cancel,
    Record(&'a NewsRecord),
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    PublishedDate,
    Category,
    Unsorted,
}

impl SortKey {
    /// Maps the sort menu (1-4). `0` and anything else give `None`.
    pub fn from_menu_choice(choice: u32) -> Option<Self> {
        match choice {
            1 => Some(SortKey::Title),
            2 => Some(SortKey::PublishedDate),
            3 => Some(SortKey::Category),
            4 => Some(SortKey::Unsorted),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Title => "sorted by title",
            SortKey::PublishedDate => "sorted by date",
            SortKey::Category => "sorted by category",
            SortKey::Unsorted => "unsorted",
        }
    }
}

/// Actions offered for a selected record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    AddToFavorites,
    MarkRead,
    AddToReadLater,
    RemoveFromCurrent,
}

impl RecordAction {
    /// `RemoveFromCurrent` (4) is only available on profile-owned lists.
    pub fn from_menu_choice(choice: u32, current: ListKind) -> Option<Self> {
        match choice {
            1 => Some(RecordAction::AddToFavorites),
            2 => Some(RecordAction::MarkRead),
            3 => Some(RecordAction::AddToReadLater),
            4 if current.is_profile_owned() => Some(RecordAction::RemoveFromCurrent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Added(ListKind),
    AlreadyPresent(ListKind),
    Removed(ListKind),
    NotFound(ListKind),
    RemovalNotAllowed,
}

/// Append `record` unless an entry with the same id is already there.
pub fn add_if_absent(list: &mut Vec<NewsRecord>, record: &NewsRecord) -> AddOutcome {
    if list.contains(record) {
        return AddOutcome::AlreadyPresent;
    }
    list.push(record.clone());
    AddOutcome::Added
}

/// Erase the entry sharing `record`'s id, if any.
pub fn remove_by_identity(list: &mut Vec<NewsRecord>, record: &NewsRecord) -> RemoveOutcome {
    match list.iter().position(|r| r == record) {
        Some(idx) => {
            list.remove(idx);
            RemoveOutcome::Removed
        }
        None => RemoveOutcome::NotFound,
    }
}

/// Returns a sorted copy of `list`; the input order is left alone.
///
/// Dates sort newest first and categories ascending, both with missing
/// values placed last. Sorting is stable.
pub fn sorted_view(list: &[NewsRecord], key: SortKey) -> Vec<NewsRecord> {
    let mut view = list.to_vec();
    match key {
        SortKey::Title => view.sort_by(|a, b| a.title.cmp(&b.title)),
        SortKey::PublishedDate => view.sort_by(|a, b| {
            nones_last(a.published_at.as_ref(), b.published_at.as_ref(), |x, y| {
                y.cmp(x)
            })
        }),
        SortKey::Category => view.sort_by(|a, b| {
            nones_last(a.category.as_ref(), b.category.as_ref(), |x, y| x.cmp(y))
        }),
        SortKey::Unsorted => {}
    }
    view
}

fn nones_last<T>(a: Option<&T>, b: Option<&T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `0` always cancels; `1..=len` picks a record.
pub fn select_by_position(list: &[NewsRecord], choice: u32) -> Selection<'_> {
    if choice == 0 {
        return Selection::Cancel;
    }
    match list.get(choice as usize - 1) {
        Some(record) => Selection::Record(record),
        None => Selection::OutOfRange,
    }
}

/// Apply a record action to the profile.
///
/// `current` is the list the record was picked from; it decides which list
/// a removal targets.
pub fn apply_action(
    profile: &mut UserProfile,
    current: ListKind,
    record: &NewsRecord,
    action: RecordAction,
) -> ActionOutcome {
    let target = match action {
        RecordAction::AddToFavorites => ListKind::Favorites,
        RecordAction::MarkRead => ListKind::Read,
        RecordAction::AddToReadLater => ListKind::ReadLater,
        RecordAction::RemoveFromCurrent => current,
    };

    let Some(list) = profile.list_mut(target) else {
        return ActionOutcome::RemovalNotAllowed;
    };

    let outcome = if action == RecordAction::RemoveFromCurrent {
        match remove_by_identity(list, record) {
            RemoveOutcome::Removed => ActionOutcome::Removed(target),
            RemoveOutcome::NotFound => ActionOutcome::NotFound(target),
        }
    } else {
        match add_if_absent(list, record) {
            AddOutcome::Added => ActionOutcome::Added(target),
            AddOutcome::AlreadyPresent => ActionOutcome::AlreadyPresent(target),
        }
    };

    tracing::debug!(id = %record.id, ?action, ?outcome, "Applied record action");
    outcome
}
