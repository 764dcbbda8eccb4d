use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use wordgame::app::{App, Control, Screen};
use wordgame::config::MemoryConfigStore;
use wordgame::runtime::{EventSource, GameEvent, Runner, TestEventSource, ThreadTicker, Ticker};
use wordgame::{EndReason, MemoryWordStore, Quiz};

// Headless integration using the real runtime and ticker thread without a TTY.

fn key(code: KeyCode) -> GameEvent {
    GameEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn drive<T: Ticker>(
    app: &mut App<MemoryWordStore, T>,
    runner: &Runner<TestEventSource>,
    max_steps: u32,
    until: impl Fn(&App<MemoryWordStore, T>) -> bool,
) {
    for _ in 0..max_steps {
        if let Some(event) = runner.step() {
            if app.handle_event(event) == Control::Quit {
                break;
            }
        }
        if until(app) {
            break;
        }
    }
}

#[test]
fn headless_round_times_out_on_real_ticks() {
    let source = TestEventSource::new();
    let tx = source.sender();
    let store = MemoryWordStore::with_words(["cat", "dog"]).unwrap();
    let quiz = Quiz::new(store, ThreadTicker::new(source.sender()));
    let mut app = App::new(quiz, Box::new(MemoryConfigStore::default()), Some(1));
    let runner = Runner::new(source, Duration::from_millis(50));

    tx.send(key(KeyCode::Enter)).unwrap();
    drive(&mut app, &runner, 100, |a| a.last_round().is_some());

    let round = app.last_round().expect("round should have ended");
    assert_eq!(round.reason, EndReason::Timeout);
    assert_eq!(round.score, 0);
    assert_eq!(app.screen, Screen::Home);
    assert!(!app.quiz.ticker().is_running());
}

#[test]
fn headless_round_completes_by_answers() {
    let source = TestEventSource::new();
    let tx = source.sender();
    let store = MemoryWordStore::with_words(["cat", "dog"]).unwrap();
    let quiz = Quiz::new(store, ThreadTicker::new(source.sender()));
    let mut app = App::new(quiz, Box::new(MemoryConfigStore::default()), Some(30));
    let runner = Runner::new(source, Duration::from_millis(5));

    for code in [KeyCode::Enter, KeyCode::Right, KeyCode::Down] {
        tx.send(key(code)).unwrap();
    }
    drive(&mut app, &runner, 100, |a| a.last_round().is_some());

    let round = app.last_round().unwrap();
    assert_eq!(round.reason, EndReason::Exhausted);
    assert_eq!(round.score, 1);
    assert_eq!(app.list.tally.seen, 1);
    assert!(!app.quiz.ticker().is_running());
}

#[test]
fn headless_stale_ticks_do_not_reach_next_round() {
    let source = TestEventSource::new();
    let tx = source.sender();
    let store = MemoryWordStore::with_words(["cat"]).unwrap();
    let quiz = Quiz::new(store, ThreadTicker::new(source.sender()));
    let mut app = App::new(quiz, Box::new(MemoryConfigStore::default()), Some(30));
    let runner = Runner::new(source, Duration::from_millis(5));

    // a tick from a previous ticker generation sits in the queue
    tx.send(key(KeyCode::Enter)).unwrap();
    drive(&mut app, &runner, 10, |a| a.screen == Screen::Play);
    let stale = app.quiz.ticker().epoch();
    tx.send(key(KeyCode::Esc)).unwrap();
    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(GameEvent::Tick(stale)).unwrap();

    for _ in 0..3 {
        if let Some(event) = runner.step() {
            app.handle_event(event);
        }
    }

    assert_eq!(app.screen, Screen::Play);
    assert_eq!(app.quiz.remaining(), 30);
    app.quiz.dismiss();
}
