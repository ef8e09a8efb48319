//! App: terminal init, frame loop, tick scheduling and input handling.

use crate::GameConfig;
use crate::assets::OverlayArt;
use crate::game::{Field, GameState, LockOutcome};
use crate::input::{Action, key_to_action, mouse_to_action};
use crate::motion::SpeedSetting;
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Paces frames and only asks for a motion tick while the session is running.
#[derive(Debug, Clone, Copy)]
pub struct FrameScheduler {
    interval: Duration,
    next_frame: Instant,
}

impl FrameScheduler {
    pub fn new(frame_rate: f64, now: Instant) -> Self {
        let interval = Duration::from_secs_f64(1.0 / frame_rate);
        Self {
            interval,
            next_frame: now + interval,
        }
    }

    /// How long input polling may block before the next frame is due.
    pub fn timeout(&self, now: Instant) -> Duration {
        self.next_frame.saturating_duration_since(now)
    }

    /// True when a frame is due and the game is still running. A due frame always moves the
    /// deadline forward; frames missed while the terminal was slow are dropped, not replayed.
    pub fn poll_tick(&mut self, now: Instant, running: bool) -> bool {
        if now < self.next_frame {
            return false;
        }
        self.next_frame = now + self.interval;
        running
    }
}

/// Run every step even when an earlier one fails; report the first failure.
fn run_all_steps<const N: usize>(
    steps: [&mut dyn FnMut() -> std::io::Result<()>; N],
) -> std::io::Result<()> {
    let mut first = Ok(());
    for step in steps {
        let outcome = step();
        if first.is_ok() {
            first = outcome;
        }
    }
    first
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    art: OverlayArt,
    state: GameState,
    /// Current position of the external speed control.
    speed_setting: SpeedSetting,
    scheduler: FrameScheduler,
    /// TachyonFX fade for the game-over overlay (created on the first game-over frame).
    overlay_effect: Option<Effect>,
    /// Last time we processed the overlay effect (for delta).
    overlay_process_time: Option<Instant>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, art: OverlayArt) -> Result<Self> {
        config.validate()?;
        let speed_setting = config.speed;
        let state = GameState::new(Field::from(&config), speed_setting);
        let scheduler = FrameScheduler::new(config.frame_rate, Instant::now());
        Ok(Self {
            config,
            theme,
            art,
            state,
            speed_setting,
            scheduler,
            overlay_effect: None,
            overlay_process_time: None,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        tracing::info!(
            cols = self.config.cols,
            rows = self.config.rows,
            speed = %self.speed_setting,
            "session started"
        );
        let result = self.run_loop(&mut terminal);

        // Restore
        let restored = run_all_steps([
            &mut || terminal.show_cursor(),
            &mut || execute!(std::io::stdout(), DisableMouseCapture),
            &mut || execute!(std::io::stdout(), LeaveAlternateScreen),
            &mut disable_raw_mode,
        ]);

        if let Err(ref err) = result {
            tracing::error!(%err, "game loop failed");
        }
        if let Err(ref err) = restored {
            tracing::error!(%err, "terminal restore failed");
        }
        result?;
        restored?;
        Ok(())
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    &self.state,
                    &self.theme,
                    &self.art,
                    self.speed_setting,
                    f.area(),
                    &mut self.overlay_effect,
                    &mut self.overlay_process_time,
                    now,
                    self.config.no_animation,
                );
            })?;

            // Input is drained and applied in full before the tick below, so a lock never
            // interleaves with motion.
            if event::poll(self.scheduler.timeout(Instant::now()))? {
                while event::poll(Duration::ZERO)? {
                    let action = match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => key_to_action(key),
                        Event::Mouse(mouse) => mouse_to_action(mouse),
                        _ => Action::None,
                    };
                    if self.apply_action(action).is_break() {
                        tracing::info!("quit");
                        return Ok(());
                    }
                }
            }

            if self.scheduler.poll_tick(Instant::now(), self.state.is_running()) {
                self.state.tick();
            }
        }
    }

    fn apply_action(&mut self, action: Action) -> ControlFlow<()> {
        match action {
            Action::Quit => return ControlFlow::Break(()),
            Action::Lock if self.state.is_running() => self.lock(),
            Action::Lock => self.restart(),
            Action::SpeedUp => self.change_speed(self.speed_setting.faster()),
            Action::SpeedDown => self.change_speed(self.speed_setting.slower()),
            Action::None => {}
        }
        ControlFlow::Continue(())
    }

    fn lock(&mut self) {
        let Some(outcome) = self.state.lock() else {
            return;
        };
        let top = *self.state.stack.top();
        match outcome {
            LockOutcome::Placed { span } => {
                tracing::debug!(width = span, row = top.row, speed = self.state.speed, "block placed");
            }
            LockOutcome::CriticalOverlap => {
                tracing::debug!(row = top.row, col = top.col_start, "one-column overlap");
            }
            LockOutcome::Missed => {
                tracing::info!(height = self.state.stack.len() - 1, "missed the stack, game over");
            }
            LockOutcome::Won => {
                tracing::info!(blocks = self.state.stack.len(), "reached the top, game won");
            }
        }
    }

    fn restart(&mut self) {
        self.state.restart(self.speed_setting);
        self.overlay_effect = None;
        self.overlay_process_time = None;
        tracing::info!(speed = self.state.speed, "restarted");
    }

    /// Speed control moved; applies from the next tick.
    fn change_speed(&mut self, setting: SpeedSetting) {
        if setting == self.speed_setting {
            return;
        }
        self.speed_setting = setting;
        self.state.set_speed(setting);
        tracing::debug!(setting = %setting, speed = self.state.speed, "speed changed");
    }
}
