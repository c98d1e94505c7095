use std::cell::Cell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::error;

use crate::backend::StorageBackend;
use crate::board::Board;
use crate::candidate::{Candidate, Stage};
use crate::clock::Clock;
use crate::routing::{available_actions, Action};
use crate::runtime::BoardEvent;
use crate::store::{Store, Subscription};

/// State of the add-candidate form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddForm {
    pub name: String,
    pub role_idx: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Board,
    Adding(AddForm),
    ConfirmDelete { id: String, name: String },
    ConfirmReset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub column: usize,
    pub row: usize,
}

/// Terminal front end over a [`Store`].
///
/// The app never mutates its board directly: every action goes through the
/// store, whose change notification marks the board dirty so it is re-listed
/// before the next draw. Changes from other processes arrive the same way
/// through [`BoardEvent::StorageChanged`].
pub struct App<B: StorageBackend, C: Clock> {
    store: Store<B, C>,
    board: Board,
    dirty: Rc<Cell<bool>>,
    _subscription: Subscription,
    pub selection: Selection,
    pub mode: Mode,
    pub roles: Vec<String>,
    pub default_role: String,
    pub status: Option<String>,
    pub now_ms: i64,
    should_quit: bool,
}

impl<B: StorageBackend, C: Clock> App<B, C> {
    pub fn new(store: Store<B, C>, roles: Vec<String>, default_role: String) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        let subscription = store.subscribe(move |_| flag.set(true));
        let now_ms = store.now_ms();

        let mut app = Self {
            store,
            board: Board::default(),
            dirty,
            _subscription: subscription,
            selection: Selection::default(),
            mode: Mode::Board,
            roles,
            default_role,
            status: None,
            now_ms,
            should_quit: false,
        };
        app.refresh();
        app
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn store(&self) -> &Store<B, C> {
        &self.store
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn selected(&self) -> Option<&Candidate> {
        self.board
            .column(Stage::ALL[self.selection.column])
            .get(self.selection.row)
    }

    pub fn selected_actions(&self) -> Vec<Action> {
        self.selected().map(available_actions).unwrap_or_default()
    }

    /// Re-read the store if a change notification arrived since last time.
    pub fn refresh(&mut self) {
        if !self.dirty.replace(false) {
            return;
        }
        match self.store.list() {
            Ok(candidates) => {
                self.board = Board::from_candidates(candidates);
                self.clamp_selection();
            }
            Err(e) => {
                error!("failed to load candidates: {e}");
                self.status = Some(format!("Could not load board: {e}"));
            }
        }
    }

    pub fn handle_event(&mut self, event: BoardEvent) {
        match event {
            BoardEvent::Key(key) => self.handle_key(key),
            BoardEvent::StorageChanged => self.store.notify_external(),
            BoardEvent::Tick => self.now_ms = self.store.now_ms(),
            BoardEvent::Resize => {}
        }
        self.refresh();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match std::mem::replace(&mut self.mode, Mode::Board) {
            Mode::Board => self.handle_board_key(key),
            Mode::Adding(form) => self.handle_form_key(form, key),
            Mode::ConfirmDelete { id, name } => {
                if key.code == KeyCode::Char('y') && self.run(|store| store.remove(&id)).is_some() {
                    self.status = Some(format!("Removed {name}"));
                }
            }
            Mode::ConfirmReset => {
                if key.code == KeyCode::Char('y') && self.run(|store| store.reset()).is_some() {
                    self.selection = Selection::default();
                    self.status = Some("Board reset".to_string());
                }
            }
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => {
                self.selection.column = self.selection.column.saturating_sub(1);
                self.clamp_selection();
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.selection.column = (self.selection.column + 1).min(Stage::ALL.len() - 1);
                self.clamp_selection();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection.row = self.selection.row.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selection.row += 1;
                self.clamp_selection();
            }
            KeyCode::Enter => self.apply_action(0),
            KeyCode::Char(c @ '1'..='4') => self.apply_action(c as usize - '1' as usize),
            KeyCode::Char('a') => {
                let role_idx = self
                    .roles
                    .iter()
                    .position(|r| *r == self.default_role)
                    .unwrap_or(0);
                self.mode = Mode::Adding(AddForm {
                    name: String::new(),
                    role_idx,
                    error: None,
                });
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(c) = self.selected() {
                    self.mode = Mode::ConfirmDelete {
                        id: c.id.clone(),
                        name: c.name.clone(),
                    };
                }
            }
            KeyCode::Char('R') => self.mode = Mode::ConfirmReset,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, mut form: AddForm, key: KeyEvent) {
        let role_count = self.roles.len().max(1);
        match key.code {
            KeyCode::Esc => return,
            KeyCode::Enter => {
                if form.name.trim().is_empty() {
                    form.error = Some("Name is required".to_string());
                } else {
                    let role = self
                        .roles
                        .get(form.role_idx)
                        .cloned()
                        .unwrap_or_else(|| self.default_role.clone());
                    if let Some(added) = self.run(|store| store.add(&form.name, &role)) {
                        self.status = Some(format!("Checked in {}", added.name));
                        self.refresh();
                        self.select_id(&added.id);
                    }
                    return;
                }
            }
            KeyCode::Backspace => {
                form.name.pop();
            }
            KeyCode::Tab | KeyCode::Down => form.role_idx = (form.role_idx + 1) % role_count,
            KeyCode::BackTab | KeyCode::Up => {
                form.role_idx = (form.role_idx + role_count - 1) % role_count
            }
            KeyCode::Char(_)
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {}
            KeyCode::Char(c) => {
                form.name.push(c);
                form.error = None;
            }
            _ => {}
        }
        self.mode = Mode::Adding(form);
    }

    fn apply_action(&mut self, index: usize) {
        let Some(candidate) = self.selected() else {
            return;
        };
        let Some(action) = available_actions(candidate).get(index).copied() else {
            return;
        };
        let id = candidate.id.clone();
        let name = candidate.name.clone();
        let to = action.target();

        if self.run(|store| store.move_stage(&id, to)).is_some() {
            self.status = Some(format!("{name}: {}", action.label()));
            self.refresh();
            self.select_id(&id);
        }
    }

    /// Run a store operation, turning failures into a status message.
    fn run<T>(
        &mut self,
        op: impl FnOnce(&Store<B, C>) -> crate::error::Result<T>,
    ) -> Option<T> {
        match op(&self.store) {
            Ok(v) => Some(v),
            Err(e) => {
                error!("store operation failed: {e}");
                self.status = Some(format!("Error: {e}"));
                None
            }
        }
    }

    fn select_id(&mut self, id: &str) {
        for (col, (_, cards)) in self.board.columns().enumerate() {
            if let Some(row) = cards.iter().position(|c| c.id == id) {
                self.selection = Selection { column: col, row };
                return;
            }
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.board.count(Stage::ALL[self.selection.column]);
        self.selection.row = self.selection.row.min(len.saturating_sub(1));
    }
}
