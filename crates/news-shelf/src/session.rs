use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use shared::input;
use shared::{
    apply_action, dates, select_by_position, sorted_view, ActionOutcome, ListKind, NewsRecord,
    NewsSource, ProfileStore, RecordAction, SearchQuery, Selection, SortKey, UserProfile,
};
use std::fmt;
use std::io::{BufRead, Write};

/// One interactive run: owns the profile and talks to the user through `input`/`out`.
pub struct Session<S, R, W> {
    source: S,
    store: ProfileStore,
    profile: UserProfile,
    input: R,
    out: W,
    current_year: i32,
}

impl<S, R, W> Session<S, R, W>
where
    S: NewsSource,
    R: BufRead,
    W: Write,
{
    /// Load the saved profile, or walk the user through creating one.
    pub fn start(source: S, store: ProfileStore, input: R, out: W) -> Result<Self> {
        let mut session = Self {
            source,
            store,
            profile: UserProfile::default(),
            input,
            out,
            current_year: Local::now().year(),
        };

        match session.store.load() {
            Some(profile) => {
                session.profile = profile;
                writeln!(session.out, "\nHello, {}!", session.profile.name)?;
            }
            None => {
                writeln!(session.out, "No user found! Let's create a new profile.\n")?;
                let raw = session
                    .prompt("Welcome! Enter your name or nickname: ")?
                    .unwrap_or_default();
                let name = input::display_name_or_default(&raw);
                if raw.trim().is_empty() {
                    writeln!(session.out, "Invalid name. You will be called '{}'.", name)?;
                }
                session.profile = UserProfile::new(name);
                session.save_and_report()?;
                writeln!(
                    session.out,
                    "New user profile created: {}",
                    session.profile.name
                )?;
            }
        }

        Ok(session)
    }

    #[cfg(test)]
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    #[cfg(test)]
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Main menu loop. Returns after "save and exit" or when input runs out.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.out, "\n--- Main Menu ---\n")?;
            writeln!(self.out, "1 - Search news")?;
            writeln!(self.out, "2 - View favorites")?;
            writeln!(self.out, "3 - View read later")?;
            writeln!(self.out, "4 - View read")?;
            writeln!(self.out, "5 - Save and exit\n")?;

            let Some(line) = self.prompt("Choose an option: ")? else {
                tracing::debug!("Input closed, saving and exiting");
                self.save_and_report()?;
                return Ok(());
            };

            match input::parse_choice(&line) {
                Ok(1) => self.search().await?,
                Ok(2) => self.show_list(ListKind::Favorites)?,
                Ok(3) => self.show_list(ListKind::ReadLater)?,
                Ok(4) => self.show_list(ListKind::Read)?,
                Ok(5) => {
                    self.save_and_report()?;
                    writeln!(self.out, "Exiting... See you soon!")?;
                    return Ok(());
                }
                Ok(_) => writeln!(self.out, "\nInvalid option. Please try again.")?,
                Err(e) => writeln!(self.out, "\n{}.", capitalize(&e.to_string()))?,
            }
        }
    }

    async fn search(&mut self) -> Result<()> {
        writeln!(self.out, "\nHow would you like to search the news?\n")?;
        writeln!(self.out, "1 - By term (title, keywords)")?;
        writeln!(self.out, "2 - By date (period)")?;
        writeln!(self.out, "0 - Back\n")?;

        let Some(choice) = self.read_choice("Choose an option: ")? else {
            return Ok(());
        };

        let query = match choice {
            1 => {
                let Some(term) = self.prompt("\nEnter a search term: ")? else {
                    return Ok(());
                };
                SearchQuery::term(&term)
            }
            2 => {
                writeln!(self.out, "\n--- Start date ---")?;
                let Some(start) = self.collect_date()? else {
                    writeln!(self.out, "Start date entry cancelled.")?;
                    return Ok(());
                };
                writeln!(self.out, "\n--- End date ---")?;
                let Some(end) = self.collect_date()? else {
                    writeln!(self.out, "End date entry cancelled.")?;
                    return Ok(());
                };
                SearchQuery::date_range(start, end)
            }
            0 => return Ok(()),
            _ => {
                writeln!(self.out, "Invalid option. Returning to the menu.")?;
                return Ok(());
            }
        };

        let query = match query {
            Ok(query) => query,
            Err(e) => {
                writeln!(self.out)?;
                self.report_error(&e)?;
                return Ok(());
            }
        };

        let fetched = self.source.search(&query).await;
        match fetched {
            Ok(results) if results.is_empty() => {
                writeln!(self.out, "\nNo news found for {}.", query.describe())?;
            }
            Ok(results) => {
                self.browse(&results, ListKind::SearchResults, ListKind::SearchResults.label())?;
            }
            Err(e) => {
                tracing::error!(query = %query.describe(), error = %format!("{:#}", e), "Search failed");
                writeln!(self.out, "\nError fetching news: {:#}", e)?;
                writeln!(self.out, "Please check your connection or try again.")?;
            }
        }

        Ok(())
    }

    /// Ask for year, month and day. `0` (or end of input) cancels.
    fn collect_date(&mut self) -> Result<Option<NaiveDate>> {
        loop {
            let Some(year) = self.read_date_field(" Year (YYYY, 0 to cancel): ")? else {
                return Ok(None);
            };
            let year = match input::validate_year(year, self.current_year) {
                Ok(year) => year,
                Err(e) => {
                    self.report_error(&e)?;
                    continue;
                }
            };

            let Some(month) = self.read_date_field(" Month (1-12): ")? else {
                return Ok(None);
            };
            let month = match input::validate_month(month) {
                Ok(month) => month,
                Err(e) => {
                    self.report_error(&e)?;
                    continue;
                }
            };

            let Some(day) = self.read_date_field(" Day (1-31): ")? else {
                return Ok(None);
            };
            match input::validate_day(year, month, day) {
                Ok(date) => return Ok(Some(date)),
                Err(e) => self.report_error(&e)?,
            }
        }
    }

    fn read_date_field(&mut self, text: &str) -> Result<Option<i32>> {
        loop {
            let Some(line) = self.prompt(text)? else {
                return Ok(None);
            };
            match input::parse_number(&line) {
                Ok(0) => return Ok(None),
                Ok(value) => return Ok(Some(value)),
                Err(e) => self.report_error(&e)?,
            }
        }
    }

    fn show_list(&mut self, kind: ListKind) -> Result<()> {
        writeln!(self.out, "\n--- {} ---", kind.label())?;

        let list = self.profile.list(kind).cloned().unwrap_or_default();
        if list.is_empty() {
            writeln!(self.out, "The list is empty.")?;
            return Ok(());
        }

        writeln!(self.out, "1 - Sort by title (A-Z)")?;
        writeln!(self.out, "2 - Sort by date (newest first)")?;
        writeln!(self.out, "3 - Sort by category")?;
        writeln!(self.out, "4 - Show unsorted")?;
        writeln!(self.out, "0 - Back")?;

        let Some(choice) = self.read_choice("\nChoose an option: ")? else {
            return Ok(());
        };
        if choice == 0 {
            return Ok(());
        }
        let Some(key) = SortKey::from_menu_choice(choice) else {
            writeln!(
                self.out,
                "Invalid sort option. Returning without showing the list."
            )?;
            return Ok(());
        };

        let view = sorted_view(&list, key);
        let title = format!("{} ({})", kind.label(), key.label());
        self.browse(&view, kind, &title)
    }

    /// Numbered listing, record selection and the per-record action menu
    fn browse(&mut self, records: &[NewsRecord], kind: ListKind, title: &str) -> Result<()> {
        writeln!(self.out, "\n--- {} ---", title)?;
        if records.is_empty() {
            writeln!(self.out, "\nNo news available to show.\n")?;
            return Ok(());
        }

        for (i, record) in records.iter().enumerate() {
            writeln!(self.out, "\n[{}] {}", i + 1, record.title)?;
            writeln!(self.out, "    Summary: {}", record.summary)?;
            writeln!(
                self.out,
                "    Date: {}",
                dates::display_timestamp(record.published_at.as_ref())
            )?;
        }

        let Some(choice) = self.read_choice(
            "\nSelect a news item by number for details and options, or 0 to go back: ",
        )?
        else {
            return Ok(());
        };

        let record = match select_by_position(records, choice) {
            Selection::Cancel => return Ok(()),
            Selection::OutOfRange => {
                writeln!(
                    self.out,
                    "Invalid news option. Please select a valid number."
                )?;
                return Ok(());
            }
            Selection::Record(record) => record.clone(),
        };

        writeln!(self.out, "\n--- News Details ---\n")?;
        writeln!(self.out, "{}", record)?;
        writeln!(self.out, "----------------------------------------")?;

        writeln!(self.out, "\nOptions:\n")?;
        writeln!(self.out, "1 - Add to favorites")?;
        writeln!(self.out, "2 - Mark as read")?;
        writeln!(self.out, "3 - Add to read later")?;
        if kind.is_profile_owned() {
            writeln!(self.out, "4 - Remove from current list")?;
        }
        writeln!(self.out, "0 - Back to previous menu")?;

        let Some(choice) = self.read_choice("Choose an action: ")? else {
            return Ok(());
        };
        if choice == 0 {
            return Ok(());
        }
        let Some(action) = RecordAction::from_menu_choice(choice, kind) else {
            writeln!(self.out, "Invalid action.")?;
            return Ok(());
        };

        let outcome = apply_action(&mut self.profile, kind, &record, action);
        writeln!(self.out, "{}", outcome_message(outcome, &record))?;
        Ok(())
    }

    fn save_and_report(&mut self) -> Result<()> {
        match self.store.save(&self.profile) {
            Ok(path) => writeln!(self.out, "User data saved to: {}", path.display())?,
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "Failed to save user profile");
                writeln!(self.out, "Error saving user data: {:#}", e)?;
            }
        }
        Ok(())
    }

    /// Numeric choice for a sub-menu. Bad input is reported and treated as "back".
    fn read_choice(&mut self, text: &str) -> Result<Option<u32>> {
        let Some(line) = self.prompt(text)? else {
            return Ok(None);
        };
        match input::parse_choice(&line) {
            Ok(choice) => Ok(Some(choice)),
            Err(e) => {
                self.report_error(&e)?;
                Ok(None)
            }
        }
    }

    fn report_error(&mut self, e: &impl fmt::Display) -> Result<()> {
        writeln!(self.out, "{}.", capitalize(&e.to_string()))?;
        Ok(())
    }

    /// `None` at end of input
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }
}

fn outcome_message(outcome: ActionOutcome, record: &NewsRecord) -> String {
    match outcome {
        ActionOutcome::Added(ListKind::Favorites) => "News added to favorites.".to_string(),
        ActionOutcome::Added(ListKind::Read) => "News marked as read.".to_string(),
        ActionOutcome::Added(kind) => format!("News added to '{}'.", kind.label()),
        ActionOutcome::AlreadyPresent(ListKind::Favorites) => {
            "News is already in favorites.".to_string()
        }
        ActionOutcome::AlreadyPresent(ListKind::Read) => {
            "News is already marked as read.".to_string()
        }
        ActionOutcome::AlreadyPresent(kind) => format!("News is already in '{}'.", kind.label()),
        ActionOutcome::Removed(kind) => format!(
            "News \"{}\" removed from '{}'.",
            record.title,
            kind.label()
        ),
        ActionOutcome::NotFound(kind) => {
            format!("Error: news not found in '{}'.", kind.label())
        }
        ActionOutcome::RemovalNotAllowed => {
            "Search results cannot be edited. Add the news to one of your lists first.".to_string()
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    #[derive(Default)]
    struct FakeSource {
        results: Vec<NewsRecord>,
        fail: bool,
        queries: Mutex<Vec<SearchQuery>>,
    }

    #[async_trait]
    impl NewsSource for FakeSource {
        async fn search(&self, query: &SearchQuery) -> Result<Vec<NewsRecord>> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                anyhow::bail!("IBGE API returned error: 503 Service Unavailable - down");
            }
            Ok(self.results.clone())
        }
    }

    type TestSession = Session<FakeSource, Cursor<Vec<u8>>, Vec<u8>>;

    fn results() -> Vec<NewsRecord> {
        vec![
            NewsRecord::new("101", "Censo 2022").with_summary("Populacao"),
            NewsRecord::new("102", "Inflacao de maio").with_category(Some("Release")),
        ]
    }

    fn store_in(dir: &TempDir) -> ProfileStore {
        ProfileStore::new(dir.path().join("data").join("usuario.json"))
    }

    async fn run_session(source: FakeSource, store: ProfileStore, script: &str) -> TestSession {
        let input = Cursor::new(script.as_bytes().to_vec());
        let mut session = Session::start(source, store, input, Vec::new())
            .unwrap()
            .with_current_year(2026);
        session.run().await.unwrap();
        session
    }

    fn output(session: &TestSession) -> String {
        String::from_utf8_lossy(&session.out).to_string()
    }

    #[tokio::test]
    async fn test_new_profile_is_created_and_saved() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let session = run_session(FakeSource::default(), store.clone(), "Ana\n5\n").await;

        let text = output(&session);
        assert!(text.contains("No user found!"));
        assert!(text.contains("New user profile created: Ana"));
        let saved = store.try_load().unwrap().unwrap();
        assert_eq!(saved.name, "Ana");
        assert!(saved.favorites.is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_uses_default() {
        let dir = tempdir().unwrap();
        let session = run_session(FakeSource::default(), store_in(&dir), "  \n5\n").await;
        assert_eq!(session.profile().name, shared::models::ANONYMOUS_NAME);
    }

    #[tokio::test]
    async fn test_existing_profile_is_greeted() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&UserProfile::new("Bia")).unwrap();

        let session = run_session(FakeSource::default(), store, "5\n").await;
        assert!(output(&session).contains("Hello, Bia!"));
    }

    #[tokio::test]
    async fn test_search_then_add_to_favorites() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let source = FakeSource {
            results: results(),
            ..Default::default()
        };

        // name, search, by term, term, pick #2, add to favorites, save and exit
        let session = run_session(source, store.clone(), "Ana\n1\n1\ninflacao\n2\n1\n5\n").await;

        assert!(output(&session).contains("News added to favorites."));
        assert_eq!(
            *session.source.queries.lock().unwrap(),
            vec![SearchQuery::Term("inflacao".to_string())]
        );
        let saved = store.try_load().unwrap().unwrap();
        assert_eq!(saved.favorites.len(), 1);
        assert_eq!(saved.favorites[0].id, "102");
    }

    #[tokio::test]
    async fn test_adding_twice_reports_already_present() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            results: results(),
            ..Default::default()
        };
        let script = "Ana\n1\n1\ncenso\n1\n2\n1\n1\ncenso\n1\n2\n5\n";
        let session = run_session(source, store_in(&dir), script).await;

        assert!(output(&session).contains("News marked as read."));
        assert!(output(&session).contains("News is already marked as read."));
        assert_eq!(session.profile().read.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_term_never_reaches_source() {
        let dir = tempdir().unwrap();
        let session =
            run_session(FakeSource::default(), store_in(&dir), "Ana\n1\n1\n   \n5\n").await;

        assert!(output(&session).contains("The search term cannot be empty."));
        assert!(session.source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reversed_date_range_never_reaches_source() {
        let dir = tempdir().unwrap();
        let script = "Ana\n1\n2\n2024\n5\n10\n2024\n5\n1\n5\n";
        let session = run_session(FakeSource::default(), store_in(&dir), script).await;

        assert!(output(&session).contains("cannot be after the end date"));
        assert!(session.source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_date_search_reprompts_invalid_fields() {
        let dir = tempdir().unwrap();
        // 2023-02-30 is rejected, then 2024-05-01 .. 2024-05-10
        let script = "Ana\n1\n2\n2023\n2\n30\n2024\n5\n1\n2024\n5\n10\n5\n";
        let session = run_session(FakeSource::default(), store_in(&dir), script).await;

        let text = output(&session);
        assert!(text.contains("Invalid day, month 2 of 2023 has at most 28 days."));
        assert!(text.contains("No news found for period 2024-05-01 to 2024-05-10."));
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert_eq!(
            *session.source.queries.lock().unwrap(),
            vec![SearchQuery::DateRange { start, end }]
        );
    }

    #[tokio::test]
    async fn test_zero_cancels_date_entry() {
        let dir = tempdir().unwrap();
        let session =
            run_session(FakeSource::default(), store_in(&dir), "Ana\n1\n2\n0\n5\n").await;

        assert!(output(&session).contains("Start date entry cancelled."));
        assert!(session.source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_keeps_session_alive() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            fail: true,
            ..Default::default()
        };
        let session = run_session(source, store_in(&dir), "Ana\n1\n1\ncenso\n4\n5\n").await;

        let text = output(&session);
        assert!(text.contains("Error fetching news"));
        assert!(text.contains("The list is empty."));
        assert!(text.contains("Exiting... See you soon!"));
    }

    #[tokio::test]
    async fn test_remove_not_offered_for_search_results() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            results: results(),
            ..Default::default()
        };
        let session = run_session(source, store_in(&dir), "Ana\n1\n1\ncenso\n1\n4\n5\n").await;

        let text = output(&session);
        assert!(!text.contains("4 - Remove from current list"));
        assert!(text.contains("Invalid action."));
    }

    #[tokio::test]
    async fn test_remove_from_favorites() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let mut profile = UserProfile::new("Ana");
        profile.favorites = results();
        store.save(&profile).unwrap();

        // favorites, unsorted, pick #1, remove
        let session = run_session(FakeSource::default(), store.clone(), "2\n4\n1\n4\n5\n").await;

        assert!(output(&session).contains("News \"Censo 2022\" removed from 'Favorite News'."));
        let saved = store.try_load().unwrap().unwrap();
        let ids: Vec<&str> = saved.favorites.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["102"]);
    }

    #[tokio::test]
    async fn test_sorted_view_keeps_saved_order() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let mut profile = UserProfile::new("Ana");
        profile.read_later = vec![NewsRecord::new("1", "Zebra"), NewsRecord::new("2", "Apple")];
        store.save(&profile).unwrap();

        // read later, sort by title, back out of the listing
        let session = run_session(FakeSource::default(), store, "3\n1\n0\n5\n").await;

        let text = output(&session);
        let apple = text.find("[1] Apple").unwrap();
        let zebra = text.find("[2] Zebra").unwrap();
        assert!(apple < zebra);
        let ids: Vec<&str> = session
            .profile()
            .read_later
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_out_of_range_selection() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            results: results(),
            ..Default::default()
        };
        let session = run_session(source, store_in(&dir), "Ana\n1\n1\ncenso\n7\n5\n").await;
        assert!(output(&session).contains("Invalid news option."));
    }

    #[tokio::test]
    async fn test_invalid_main_menu_input() {
        let dir = tempdir().unwrap();
        let session = run_session(FakeSource::default(), store_in(&dir), "Ana\nabc\n9\n5\n").await;

        let text = output(&session);
        assert!(text.contains("Invalid input, please enter a number."));
        assert!(text.contains("Invalid option. Please try again."));
    }

    #[tokio::test]
    async fn test_end_of_input_saves() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let source = FakeSource {
            results: results(),
            ..Default::default()
        };
        run_session(source, store.clone(), "Ana\n1\n1\ncenso\n1\n3\n").await;

        let saved = store.try_load().unwrap().unwrap();
        assert_eq!(saved.read_later.len(), 1);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("invalid month"), "Invalid month");
        assert_eq!(capitalize(""), "");
    }
}
