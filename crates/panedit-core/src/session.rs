//! Session orchestration.
//!
//! ## Learning: The Facade Pattern
//!
//! `Session` is the one type an embedder talks to. It owns the editing
//! [`State`], the [`Keymap`] that turns keys into commands, the prompt that
//! collects typed text, and the [`DirectorySource`] panes are loaded from.
//! After every command it compares the state with what it was before and
//! reports the difference on the [`EventBus`].

use std::path::{Path, PathBuf};

use panedit_buffer::{DirBuffer, Origin};
use tokio::sync::broadcast;

use crate::aggregate::{ChangeSet, aggregate_changes};
use crate::command::Command;
use crate::config::Config;
use crate::event::{EditorEvent, EventBus};
use crate::keymap::{KeyContext, KeyPress, Keymap, KeymapResult, parse_key_script};
use crate::prompt::{Prompt, PromptAction, PromptKind};
use crate::source::DirectorySource;
use crate::state::{Mode, State};
use crate::{CoreError, CoreResult};

/// An editing session over one or more directory panes.
///
/// Owned by a single thread; observers follow along through
/// [`Session::subscribe`].
pub struct Session {
    /// Editing state
    state: State,

    /// Session configuration
    config: Config,

    /// Key bindings
    keymap: Keymap,

    /// Event bus for notifications
    event_bus: EventBus,

    /// Where listings come from
    source: Box<dyn DirectorySource>,

    /// Open insert or search prompt
    prompt: Option<Prompt>,
}

impl Session {
    /// Creates a session with the default configuration.
    pub fn new(source: impl DirectorySource + 'static) -> Self {
        Self::with_config(Config::default(), source)
    }

    /// Creates a session with custom configuration.
    pub fn with_config(config: Config, source: impl DirectorySource + 'static) -> Self {
        let keymap = Keymap::from_config(&config);
        Self {
            state: State::with_buffer_config(config.buffer_config()),
            config,
            keymap,
            event_bus: EventBus::new(),
            source: Box::new(source),
            prompt: None,
        }
    }

    // ==================== Accessors ====================

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Direct access for embedders driving the state without keys.
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn keymap_mut(&mut self) -> &mut Keymap {
        &mut self.keymap
    }

    /// The open insert or search prompt.
    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.event_bus.subscribe()
    }

    /// The active pane.
    pub fn active_buffer(&self) -> CoreResult<&DirBuffer> {
        self.state.active_buffer().ok_or(CoreError::NoActiveBuffer)
    }

    // ==================== Panes ====================

    /// Opens a pane for `path`, or focuses it if already open.
    pub fn open_directory(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        if self.state.buffers().contains(path) {
            return self.execute(Command::FocusBuffer(path.to_path_buf()));
        }
        if self.state.mode() == Mode::Insert {
            tracing::debug!("open ignored in insert mode");
            return Ok(());
        }

        let entries = self.source.list(path)?;
        tracing::info!(path = %path.display(), entries = entries.len(), "opened directory");
        self.state.open_buffer(path, entries.into_iter().map(Origin::from));
        self.emit(EditorEvent::BufferOpened(path.to_path_buf()));
        Ok(())
    }

    /// Closes the pane for `path`, discarding its edits.
    pub fn close_directory(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let mode = self.state.mode();
        self.state.close_buffer(path)?;
        if mode != self.state.mode() {
            self.prompt = None;
            self.emit(EditorEvent::ModeChanged(self.state.mode()));
        }
        self.emit(EditorEvent::BufferClosed(path.to_path_buf()));
        Ok(())
    }

    /// Lists `path` again. An untouched pane shows the fresh listing; an
    /// edited one keeps its lines and is diffed against the new listing.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        if !self.state.buffers().contains(path) {
            return Err(CoreError::BufferNotFound(path.to_path_buf()));
        }
        if self
            .state
            .insert_session()
            .is_some_and(|session| session.directory.as_path() == path)
        {
            tracing::debug!(path = %path.display(), "reload deferred until insert ends");
            return Ok(());
        }
        let entries = self.source.list(path)?;
        self.state
            .reload_buffer(path, entries.into_iter().map(Origin::from))?;
        self.emit(EditorEvent::BufferReloaded(path.to_path_buf()));
        Ok(())
    }

    /// Reloads every open pane, typically after a plan was applied.
    pub fn reload_all(&mut self) -> CoreResult<()> {
        let paths: Vec<PathBuf> = self.state.buffers().order().to_vec();
        for path in paths {
            self.reload(&path)?;
        }
        Ok(())
    }

    // ==================== Commands ====================

    /// Executes one command and reports what changed.
    pub fn execute(&mut self, command: Command) -> CoreResult<()> {
        if command == Command::StartSearch {
            self.open_search_prompt();
            return Ok(());
        }

        let mode = self.state.mode();
        let revisions = self.revisions();

        self.state.execute(command)?;

        for (path, revision) in self.revisions() {
            let changed = revisions
                .iter()
                .find(|(before, _)| *before == path)
                .is_none_or(|(_, before)| *before != revision);
            if changed {
                self.emit(EditorEvent::BufferChanged(path));
            }
        }

        let new_mode = self.state.mode();
        if new_mode != mode {
            self.emit(EditorEvent::ModeChanged(new_mode));
            match new_mode {
                Mode::Insert => self.open_insert_prompt(),
                Mode::Normal => self.prompt = None,
            }
        }
        Ok(())
    }

    /// Feeds one key press.
    ///
    /// While a prompt is open the key edits the prompt; otherwise it goes
    /// through the keymap.
    pub fn handle_key(&mut self, key: KeyPress) -> CoreResult<()> {
        if self.prompt.is_none() && self.state.mode() == Mode::Insert {
            self.open_insert_prompt();
        }
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }

        match self.keymap.process(key, KeyContext::from(&self.state)) {
            KeymapResult::Match(command) => self.execute(command),
            KeymapResult::Pending => Ok(()),
            KeymapResult::NoMatch => {
                tracing::debug!(%key, "unbound key");
                // An unbound key abandons partial input
                self.state.esc(None, None);
                Ok(())
            }
        }
    }

    /// Feeds a key script such as `"dd"`, `"cwnew<Esc>"` or `"yyjp"`.
    pub fn run_script(&mut self, script: &str) -> CoreResult<()> {
        for key in parse_key_script(script)? {
            self.handle_key(key)?;
        }
        Ok(())
    }

    fn handle_prompt_key(&mut self, key: KeyPress) -> CoreResult<()> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Ok(());
        };
        let action = prompt.editor.handle(key);
        let kind = prompt.kind;
        let text = prompt.editor.text().to_string();
        let column = prompt.editor.cursor();

        match (kind, action) {
            (_, PromptAction::Ignored) => Ok(()),
            (PromptKind::Insert, PromptAction::Edited) => Ok(()),
            (PromptKind::Insert, PromptAction::Submit | PromptAction::Cancel) => {
                self.prompt = None;
                self.execute(Command::Escape {
                    text: Some(text),
                    column: Some(column),
                })
            }
            (PromptKind::Search, PromptAction::Edited) => self.execute(Command::SetFuzzyQuery(text)),
            (PromptKind::Search, PromptAction::Submit) => {
                self.prompt = None;
                self.execute(Command::SetFuzzyQuery(text))?;
                self.execute(Command::CommitFuzzyQuery)
            }
            (PromptKind::Search, PromptAction::Cancel) => {
                self.prompt = None;
                self.execute(Command::ClearFuzzy)
            }
        }
    }

    fn open_insert_prompt(&mut self) {
        let Some(session) = self.state.insert_session() else {
            return;
        };
        let Some(buffer) = self.state.buffer(&session.directory) else {
            return;
        };
        let text = buffer.line_text(session.line).unwrap_or_default();
        let column = buffer.cursor().column;
        self.prompt = Some(Prompt::new(PromptKind::Insert, text, column));
    }

    fn open_search_prompt(&mut self) {
        if self.state.mode() == Mode::Insert {
            return;
        }
        let Some(buffer) = self.state.active_buffer() else {
            return;
        };
        let query = buffer.fuzzy().query().to_string();
        let column = query.len();
        self.prompt = Some(Prompt::new(PromptKind::Search, query, column));
    }

    // ==================== Plan ====================

    /// Computes the change plan for all panes.
    pub fn plan(&self) -> ChangeSet {
        let changes = aggregate_changes(&self.state);
        self.emit(EditorEvent::PlanReady(changes.len()));
        changes
    }

    /// Computes the change plan and checks it can be applied.
    pub fn save(&self) -> CoreResult<ChangeSet> {
        let changes = self.plan();
        changes.validate()?;
        Ok(changes)
    }

    // ==================== Events ====================

    fn revisions(&self) -> Vec<(PathBuf, u64)> {
        self.state
            .buffers()
            .iter()
            .map(|buffer| (buffer.path().to_path_buf(), buffer.revision()))
            .collect()
    }

    fn emit(&self, event: EditorEvent) {
        self.event_bus.emit(event);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Change;
    use crate::source::{DirEntry, MemorySource};
    use std::sync::{Arc, Mutex};

    fn source() -> MemorySource {
        MemorySource::new()
            .with("/a", [DirEntry::file("one.txt"), DirEntry::file("two.txt")])
            .with("/b", [DirEntry::directory("sub")])
    }

    fn session() -> Session {
        let mut session = Session::new(source());
        session.open_directory("/a").unwrap();
        session
    }

    fn names(session: &Session) -> Vec<String> {
        session
            .active_buffer()
            .unwrap()
            .items()
            .iter()
            .map(|item| item.text().to_string())
            .collect()
    }

    #[test]
    fn test_open_directory() {
        let session = session();
        assert_eq!(names(&session), ["one.txt", "two.txt"]);
        assert!(session.plan().is_empty());
    }

    #[test]
    fn test_open_missing_directory() {
        let mut session = session();
        assert!(matches!(
            session.open_directory("/missing"),
            Err(CoreError::DirectoryUnavailable(_))
        ));
        assert_eq!(session.state().active_path(), Some(Path::new("/a")));
    }

    #[test]
    fn test_delete_line_by_keys() {
        let mut session = session();
        session.run_script("dd").unwrap();
        assert_eq!(names(&session), ["two.txt"]);

        let plan = session.plan();
        assert_eq!(plan.len(), 1);
        assert!(matches!(&plan.changes()[0], Change::Remove { item, .. } if item.name == "one.txt"));
    }

    #[test]
    fn test_insert_prompt_renames() {
        let mut session = session();
        session.run_script("A.bak<Esc>").unwrap();
        assert_eq!(session.state().mode(), Mode::Normal);
        assert!(session.prompt().is_none());
        assert_eq!(names(&session), ["one.txt.bak", "two.txt"]);

        let plan = session.save().unwrap();
        assert!(matches!(
            &plan.changes()[0],
            Change::Rename { new_name, .. } if new_name == "one.txt.bak"
        ));

        // One undo step for the whole insert
        session.run_script("u").unwrap();
        assert_eq!(names(&session), ["one.txt", "two.txt"]);
    }

    #[test]
    fn test_change_stem_then_backspace() {
        let mut session = session();
        session.run_script("cinthrx<BS>ee<Esc>").unwrap();
        assert_eq!(names(&session), ["three.txt", "two.txt"]);
    }

    #[test]
    fn test_open_line_adds_entry() {
        let mut session = session();
        session.run_script("Gonew.txt<Esc>").unwrap();
        assert_eq!(names(&session), ["one.txt", "two.txt", "new.txt"]);

        let plan = session.plan();
        assert_eq!(plan.len(), 1);
        assert!(matches!(&plan.changes()[0], Change::Add { name, .. } if name == "new.txt"));
    }

    #[test]
    fn test_move_between_panes() {
        let mut session = session();
        session.open_directory("/b").unwrap();
        session.run_script("<S-Tab>ddp").unwrap();
        assert_eq!(session.state().active_path(), Some(Path::new("/a")));

        session.run_script("<Tab>p").unwrap();
        let plan = session.plan();
        // Pasted twice: once back home, once in /b
        assert_eq!(plan.len(), 1);
        assert!(matches!(&plan.changes()[0], Change::Copy { new_directory, .. } if new_directory == Path::new("/b")));
    }

    #[test]
    fn test_search_prompt() {
        let mut session = session();
        session.run_script("/two<CR>").unwrap();
        assert!(session.prompt().is_none());
        let buffer = session.active_buffer().unwrap();
        assert_eq!(buffer.fuzzy().query(), "two");
        assert_eq!(buffer.fuzzy_history(), ["two"]);
        assert_eq!(buffer.cursor().line, 1);
    }

    #[test]
    fn test_search_prompt_cancel() {
        let mut session = session();
        session.run_script("/tw<Esc>").unwrap();
        assert_eq!(session.active_buffer().unwrap().fuzzy().query(), "");
    }

    #[test]
    fn test_unbound_key_drops_pending_input() {
        let mut session = session();
        session.run_script("2dQ").unwrap();
        assert!(session.state().pending_operator().is_none());
        assert_eq!(session.state().count(), None);
    }

    /// A source the test can change after the session took it.
    struct Shared(Arc<Mutex<MemorySource>>);

    impl DirectorySource for Shared {
        fn list(&self, path: &Path) -> CoreResult<Vec<DirEntry>> {
            self.0.lock().unwrap().list(path)
        }
    }

    #[test]
    fn test_reload() {
        let disk = Arc::new(Mutex::new(source()));
        let mut session = Session::new(Shared(Arc::clone(&disk)));
        session.open_directory("/a").unwrap();
        session.run_script("ddu").unwrap();
        assert!(session.state().has_next());

        disk.lock().unwrap().insert("/a", [DirEntry::file("three.txt")]);
        session.reload("/a").unwrap();
        assert_eq!(names(&session), ["three.txt"]);
        assert!(!session.state().has_next());
        assert!(matches!(session.reload("/zzz"), Err(CoreError::BufferNotFound(_))));
    }

    #[test]
    fn test_reload_keeps_edits() {
        let disk = Arc::new(Mutex::new(source()));
        let mut session = Session::new(Shared(Arc::clone(&disk)));
        session.open_directory("/a").unwrap();
        session.run_script("dd").unwrap();

        // one.txt was removed on disk meanwhile
        disk.lock().unwrap().insert("/a", [DirEntry::file("two.txt")]);
        session.reload("/a").unwrap();
        assert_eq!(names(&session), ["two.txt"]);
        assert!(session.plan().is_empty());
    }

    #[test]
    fn test_reload_during_insert_is_ignored() {
        let disk = Arc::new(Mutex::new(source()));
        let mut session = Session::new(Shared(Arc::clone(&disk)));
        session.open_directory("/a").unwrap();
        session.run_script("A").unwrap();

        disk.lock().unwrap().insert(
            "/a",
            [
                DirEntry::file("new.txt"),
                DirEntry::file("one.txt"),
                DirEntry::file("two.txt"),
            ],
        );
        session.reload("/a").unwrap();
        session.run_script("x<Esc>").unwrap();
        assert_eq!(names(&session), ["one.txtx", "two.txt"]);

        let plan = session.plan();
        assert_eq!(plan.len(), 1);
        assert!(matches!(
            &plan.changes()[0],
            Change::Rename { item, new_name, .. } if item.name == "one.txt" && new_name == "one.txtx"
        ));

        session.run_script("u").unwrap();
        assert_eq!(names(&session), ["one.txt", "two.txt"]);
    }

    #[test]
    fn test_close_directory_in_insert_mode() {
        let mut session = session();
        session.run_script("o").unwrap();
        assert_eq!(session.state().mode(), Mode::Insert);
        session.close_directory("/a").unwrap();
        assert_eq!(session.state().mode(), Mode::Normal);
        assert!(session.prompt().is_none());
        assert!(session.plan().is_empty());
    }

    #[test]
    fn test_save_reports_collisions() {
        let mut session = session();
        session.run_script("ox<Esc>ox<Esc>").unwrap();
        assert_eq!(session.plan().conflicts().len(), 1);
        assert!(matches!(session.save(), Err(CoreError::DestinationCollision(_))));
    }

    #[tokio::test]
    async fn test_events() {
        let mut session = Session::new(source());
        let mut rx = session.subscribe();

        session.open_directory("/a").unwrap();
        session.run_script("ddo").unwrap();
        session.plan();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            [
                EditorEvent::BufferOpened(PathBuf::from("/a")),
                EditorEvent::BufferChanged(PathBuf::from("/a")),
                EditorEvent::BufferChanged(PathBuf::from("/a")),
                EditorEvent::ModeChanged(Mode::Insert),
                EditorEvent::PlanReady(1),
            ]
        );
    }
}
