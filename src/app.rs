//! App: terminal init, main loop, tick and key handling.

use crate::GameConfig;
use crate::game::{Game, GameEvent, Phase, PieceSource, RandomSource};
use crate::input::{Action, key_to_action};
use crate::sound::Sound;
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// DAS (Delayed Auto-Shift): delay before movement starts repeating when you hold a key.
const REPEAT_DELAY_MS: u64 = 170;
/// ARR (Auto-Repeat Rate): time between repeated moves while holding. 50 ms ≈ 20 moves/sec.
const REPEAT_INTERVAL_MS: u64 = 50;

/// Event-poll budget per frame (~60 fps render).
const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
}

pub struct App {
    theme: Theme,
    game: Game,
    screen: Screen,
    sound: Sound,
    /// Rows from the latest clear, kept until the flash finishes.
    clear_rows: Vec<usize>,
    /// TachyonFX fade effect for the line-clear flash (created on first draw).
    line_clear_effect: Option<Effect>,
    /// Last time we processed the line-clear effect (for delta).
    line_clear_effect_process_time: Option<Instant>,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
}

impl App {
    pub fn new(config: &GameConfig, theme: Theme) -> Self {
        let source: Box<dyn PieceSource> = match config.seed {
            Some(seed) => Box::new(RandomSource::seeded(seed)),
            None => Box::new(RandomSource::new()),
        };
        let game = Game::new(config.width as usize, config.height as usize, source);
        let screen = if config.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        Self {
            theme,
            game,
            screen,
            sound: Sound::new(config.sound),
            clear_rows: Vec::new(),
            line_clear_effect: None,
            line_clear_effect_process_time: None,
            repeat_state: None,
            last_repeat_fire: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
                PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Attempt to enable enhanced keyboard for Release events
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        if self.screen == Screen::Playing {
            self.game.start();
        }

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.game,
                    &self.theme,
                    f.area(),
                    &self.clear_rows,
                    &mut self.line_clear_effect,
                    &mut self.line_clear_effect_process_time,
                    now,
                )
            })?;

            if self.line_clear_effect.as_ref().is_some_and(|e| e.done()) {
                self.clear_flash();
            }

            // Limit event polling to hit ~60 FPS rendering
            let timeout = Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed());

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        let action = key_to_action(key);

                        // Only process the first Press; a Release of the held
                        // action stops our own repeat.
                        if key.kind != KeyEventKind::Press {
                            if key.kind == KeyEventKind::Release
                                && self.repeat_state.map(|(a, _)| a) == Some(action)
                            {
                                self.repeat_state = None;
                                self.last_repeat_fire = None;
                            }
                            continue;
                        }

                        // Ignore OS auto-repeat while we're repeating it ourselves.
                        if self.repeat_state.map(|(a, _)| a) == Some(action) {
                            continue;
                        }

                        match self.screen {
                            Screen::Menu => match action {
                                Action::Quit => return Ok(()),
                                Action::HardDrop => {
                                    self.game.start();
                                    self.screen = Screen::Playing;
                                }
                                _ => {}
                            },
                            Screen::Playing => {
                                if action == Action::Quit {
                                    return Ok(());
                                }
                                self.handle_playing(action);
                            }
                            Screen::GameOver => match action {
                                Action::Quit => return Ok(()),
                                Action::Restart => self.restart(),
                                _ => {}
                            },
                        }
                    }
                }
            }

            if self.screen == Screen::Playing {
                self.tick_repeat();
            }
            self.game.tick(Instant::now());
            self.drain_events();
        }
    }

    fn handle_playing(&mut self, action: Action) {
        match action {
            Action::Pause => self.game.toggle_pause(),
            Action::Restart => self.restart(),
            Action::HardDrop => {
                self.game.hard_drop();
                self.repeat_state = None;
            }
            Action::MoveLeft | Action::MoveRight | Action::SoftDrop => {
                self.apply_action(action);
                self.repeat_state = Some((action, Instant::now()));
                self.last_repeat_fire = None;
            }
            Action::Rotate => self.apply_action(action),
            Action::Quit | Action::None => {}
        }
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::MoveLeft => {
                self.game.move_left();
            }
            Action::MoveRight => {
                self.game.move_right();
            }
            Action::SoftDrop => {
                self.game.soft_drop();
            }
            Action::Rotate => {
                self.game.rotate();
            }
            _ => {}
        }
    }

    fn tick_repeat(&mut self) {
        let now = Instant::now();
        let Some((action, first)) = self.repeat_state else {
            return;
        };
        if !matches!(
            action,
            Action::MoveLeft | Action::MoveRight | Action::SoftDrop
        ) {
            return;
        }
        if first.elapsed() < Duration::from_millis(REPEAT_DELAY_MS) {
            return;
        }
        let next =
            self.last_repeat_fire.unwrap_or(first) + Duration::from_millis(REPEAT_INTERVAL_MS);
        if now >= next {
            self.apply_action(action);
            self.last_repeat_fire = Some(now);
        }
    }

    /// Route drained engine events to sound and the line-clear flash, and
    /// follow the phase onto the game-over screen.
    fn drain_events(&mut self) {
        for event in self.game.take_events() {
            self.sound.handle(&event);
            match event {
                GameEvent::LinesCleared { rows, .. } => {
                    self.clear_rows = rows;
                    self.line_clear_effect = None;
                    self.line_clear_effect_process_time = None;
                }
                GameEvent::GameOver => {
                    self.repeat_state = None;
                    self.screen = Screen::GameOver;
                }
                _ => {}
            }
        }
        // Phase may already be terminal when starting with a blocked board.
        if self.screen == Screen::Playing && self.game.phase == Phase::GameOver {
            self.screen = Screen::GameOver;
        }
    }

    fn restart(&mut self) {
        self.game.restart();
        self.screen = Screen::Playing;
        self.clear_flash();
        self.repeat_state = None;
        self.last_repeat_fire = None;
    }

    fn clear_flash(&mut self) {
        self.clear_rows.clear();
        self.line_clear_effect = None;
        self.line_clear_effect_process_time = None;
    }
}
