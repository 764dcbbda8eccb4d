use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::warn;

use crate::config::{Config, ConfigStore};
use crate::error::{StoreError, WordError};
use crate::runtime::{GameEvent, Ticker};
use crate::session::{EndReason, Quiz, RoundSummary, Transition};
use crate::store::WordStore;
use crate::word::{Word, WordTally};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Words,
    Play,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// What the word list screen shows
#[derive(Debug, Default)]
pub struct WordListState {
    pub words: Vec<Word>,
    pub tally: WordTally,
    pub selected: usize,
    /// Text being typed for a new word, when the add line is open
    pub input: Option<String>,
}

pub struct App<S: WordStore, T: Ticker> {
    pub quiz: Quiz<S, T>,
    pub config: Config,
    pub screen: Screen,
    pub list: WordListState,
    pub status: Option<String>,
    config_store: Box<dyn ConfigStore>,
}

impl<S: WordStore, T: Ticker> App<S, T> {
    /// `round_override` replaces the configured duration for this run only
    pub fn new(
        quiz: Quiz<S, T>,
        config_store: Box<dyn ConfigStore>,
        round_override: Option<u32>,
    ) -> Self {
        let mut config = config_store.load();
        if let Some(secs) = round_override {
            config.round_secs = secs;
            config = config.clamped();
        }

        let mut app = Self {
            quiz,
            config,
            screen: Screen::Home,
            list: WordListState::default(),
            status: None,
            config_store,
        };
        app.refresh_list();
        app
    }

    pub fn last_round(&self) -> Option<RoundSummary> {
        self.quiz.last_round()
    }

    pub fn handle_event(&mut self, event: GameEvent) -> Control {
        match event {
            GameEvent::Tick(epoch) => {
                // a tick queued by a cancelled ticker must not reach the next round
                if epoch == self.quiz.ticker().epoch() {
                    let t = self.quiz.tick();
                    self.on_transition(t);
                }
                Control::Continue
            }
            GameEvent::Resize => Control::Continue,
            GameEvent::Key(key) => self.handle_key(key),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        // some terminals report releases too; one keystroke is one action
        if key.kind != KeyEventKind::Press {
            return Control::Continue;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quiz.dismiss();
            return Control::Quit;
        }

        match self.screen {
            Screen::Home => self.on_home_key(key),
            Screen::Words => self.on_words_key(key),
            Screen::Play => self.on_play_key(key),
        }
    }

    fn on_home_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            KeyCode::Enter | KeyCode::Char('p') => self.start_round(),
            KeyCode::Char('w') => {
                self.status = None;
                self.refresh_list();
                self.screen = Screen::Words;
            }
            KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => {
                self.config.increase_round();
                self.save_config();
            }
            KeyCode::Down | KeyCode::Char('-') => {
                self.config.decrease_round();
                self.save_config();
            }
            _ => {}
        }
        Control::Continue
    }

    fn on_play_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Right | KeyCode::Enter | KeyCode::Char('y') => {
                match self.quiz.advance_correct() {
                    Ok(t) => {
                        self.status = None;
                        self.on_transition(t);
                    }
                    Err(e) => self.report(&e),
                }
            }
            KeyCode::Down | KeyCode::Char(' ') | KeyCode::Char('s') => {
                let t = self.quiz.skip();
                self.on_transition(t);
            }
            KeyCode::Left | KeyCode::Backspace => {
                let t = self.quiz.rewind();
                self.on_transition(t);
            }
            KeyCode::Esc => {
                self.quiz.dismiss();
                self.back_home();
            }
            _ => {}
        }
        Control::Continue
    }

    fn on_words_key(&mut self, key: KeyEvent) -> Control {
        if let Some(input) = self.list.input.as_mut() {
            match key.code {
                KeyCode::Char(c) => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Enter => self.add_word(),
                KeyCode::Esc => self.list.input = None,
                _ => {}
            }
            return Control::Continue;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('b') => self.back_home(),
            KeyCode::Char('a') => self.list.input = Some(String::new()),
            KeyCode::Up | KeyCode::Char('k') => {
                self.list.selected = self.list.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.list.selected + 1 < self.list.words.len() {
                    self.list.selected += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('s') => {
                self.config.sort = self.config.sort.next();
                self.save_config();
                self.refresh_list();
            }
            _ => {}
        }
        Control::Continue
    }

    fn start_round(&mut self) {
        match self.quiz.start(self.config.round_secs) {
            Ok(Transition::Continue) => {
                self.status = None;
                self.screen = Screen::Play;
                self.report_read_error();
            }
            Ok(Transition::Ended(summary)) => {
                self.status = match summary.reason {
                    EndReason::Empty => Some("No unseen words. Add some or un-mark seen ones.".into()),
                    _ => None,
                };
            }
            Ok(Transition::Inactive) => {}
            Err(e) => self.report(&e),
        }
    }

    fn on_transition(&mut self, t: Transition) {
        if let Transition::Ended(_) = t {
            self.back_home();
        }
        self.report_read_error();
    }

    fn report_read_error(&mut self) {
        if let Some(e) = self.quiz.take_read_error() {
            warn!(error = %e, "could not load word");
            self.status = Some(format!("Could not load word: {e}"));
        }
    }

    fn back_home(&mut self) {
        self.screen = Screen::Home;
        self.refresh_list();
    }

    fn add_word(&mut self) {
        let Some(name) = self.list.input.clone() else {
            return;
        };
        match self.quiz.store_mut().create(&name) {
            Ok(_) => {
                self.status = None;
                self.list.input = Some(String::new());
                self.refresh_list();
            }
            // empty names are silently ignored
            Err(StoreError::Validation(WordError::EmptyName)) => {}
            Err(e) => self.report(&e),
        }
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.list.words.get(self.list.selected).map(|w| w.id) else {
            return;
        };
        match self.quiz.store_mut().toggle_seen(id) {
            Ok(_) => self.refresh_list(),
            Err(e) => self.report(&e),
        }
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.list.words.get(self.list.selected).map(|w| w.id) else {
            return;
        };
        match self.quiz.store_mut().delete(id) {
            Ok(()) => self.refresh_list(),
            Err(e) => self.report(&e),
        }
    }

    pub fn refresh_list(&mut self) {
        match self.quiz.store().list() {
            Ok(words) => {
                self.list.tally = WordTally::of(&words);
                self.list.words = self.config.sort.apply(words);
                if self.list.selected >= self.list.words.len() {
                    self.list.selected = self.list.words.len().saturating_sub(1);
                }
            }
            Err(e) => self.report(&e),
        }
    }

    fn save_config(&mut self) {
        if let Err(e) = self.config_store.save(&self.config) {
            warn!(error = %e, "could not save config");
            self.status = Some(format!("Could not save settings: {e}"));
        }
    }

    fn report(&mut self, e: &StoreError) {
        warn!(error = %e, "store operation failed");
        self.status = Some(if e.is_persistence() {
            format!("Could not save: {e}. Try again.")
        } else {
            e.to_string()
        });
    }
}
