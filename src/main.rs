mod alerts;
mod cli;
mod config;
mod export;
mod settings;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{cursor, execute, terminal};
use num_traits::{FromPrimitive, ToPrimitive};

use clock_core::{ChessClock, DelayType, Side, TickOutcome, Ticker, MAX_TICK_MS, PRESETS};

use crate::alerts::{fire_alert, AlertConfig};
use crate::cli::Cli;
use crate::config::{AppSettings, FileSettings};
use crate::settings::SettingsForm;

// Non-printing keys are forwarded as private characters
const KEY_F1: char = '\u{0011}';
const KEY_F2: char = '\u{0012}';
const KEY_F3: char = '\u{0013}';
const KEY_F4: char = '\u{0014}';
const KEY_ESC: char = '\u{001b}';
const KEY_BACKSPACE: char = '\u{0008}';
const KEY_UP: char = '↑';
const KEY_DOWN: char = '↓';

#[derive(Debug, num_derive::FromPrimitive, num_derive::ToPrimitive)]
enum AppOp {
    Redraw = 0,
    Rawkeys,
    Pump,
    Quit,
}

#[derive(Debug, num_derive::FromPrimitive, num_derive::ToPrimitive)]
enum PumpOp {
    Start = 0,
    Stop,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Scalar {
    id: usize,
    arg1: usize,
    arg2: usize,
}

fn scalar<T: ToPrimitive>(op: T, arg1: usize, arg2: usize) -> Scalar {
    Scalar {
        id: op.to_usize().unwrap_or(usize::MAX),
        arg1,
        arg2,
    }
}

/// Drives the clock from the pump thread. Every start opens a new epoch;
/// pump messages from an older epoch are dropped by the app.
struct PumpTicker {
    conn: Sender<Scalar>,
    epoch: usize,
    running: bool,
}

impl PumpTicker {
    fn new(conn: Sender<Scalar>) -> Self {
        Self {
            conn,
            epoch: 0,
            running: false,
        }
    }

    fn epoch(&self) -> usize {
        self.epoch
    }

    fn quit(&self) {
        self.conn.send(scalar(PumpOp::Quit, 0, 0)).ok();
    }
}

impl Ticker for PumpTicker {
    fn start(&mut self, period_ms: u64) {
        self.epoch = self.epoch.wrapping_add(1);
        self.running = true;
        if self
            .conn
            .send(scalar(PumpOp::Start, period_ms as usize, self.epoch))
            .is_err()
        {
            log::error!("pump is gone, clock will not tick");
        }
    }

    fn cancel(&mut self) {
        if self.running {
            self.running = false;
            self.conn.send(scalar(PumpOp::Stop, 0, 0)).ok();
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum AppMode {
    Clock,
    PresetSelect,
    Settings,
}

struct ClockApp<W: Write> {
    out: W,
    size: ui::Size,
    clock: ChessClock<PumpTicker>,
    alert_config: AlertConfig,
    export_dir: PathBuf,

    mode: AppMode,
    preset_cursor: usize,
    settings: Option<SettingsForm>,
    status: Option<String>,
    // Tenths last put on screen, to skip redundant redraws while ticking
    last_frame: Option<(u64, u64, u64)>,

    // Menu overlay state
    menu_visible: bool,
    menu_cursor: usize,
    help_visible: bool,
    confirm_exit: bool,
    quit: bool,
}

impl<W: Write> ClockApp<W> {
    fn new(settings: AppSettings, ticker: PumpTicker, out: W, size: ui::Size) -> Result<Self> {
        let clock = ChessClock::new(settings.clock, ticker).context("invalid clock configuration")?;
        Ok(Self {
            out,
            size,
            clock,
            alert_config: settings.alerts,
            export_dir: settings.export_dir,
            mode: AppMode::Clock,
            preset_cursor: 0,
            settings: None,
            status: None,
            last_frame: None,
            menu_visible: false,
            menu_cursor: 0,
            help_visible: false,
            confirm_exit: false,
            quit: false,
        })
    }

    fn redraw(&mut self) {
        let result = if self.help_visible {
            let help = self.help_text();
            ui::draw_help(&mut self.out, self.size, help)
        } else if self.confirm_exit {
            ui::draw_confirm_exit(&mut self.out)
        } else if self.menu_visible {
            let items = self.menu_items();
            ui::draw_menu(&mut self.out, self.size, items, self.menu_cursor)
        } else {
            match self.mode {
                AppMode::Clock => {
                    self.last_frame = Some(self.frame_key());
                    ui::draw_clock(&mut self.out, self.size, self.clock.state(), self.status.as_deref())
                }
                AppMode::PresetSelect => ui::draw_presets(&mut self.out, self.size, self.preset_cursor),
                AppMode::Settings => match &self.settings {
                    Some(form) => ui::draw_settings(&mut self.out, self.size, form),
                    None => Ok(()),
                },
            }
        };
        if let Err(e) = result {
            log::error!("redraw failed: {}", e);
        }
    }

    fn frame_key(&self) -> (u64, u64, u64) {
        let state = self.clock.state();
        let delay = state.current.map(|side| state.delay_spent(side) / 100).unwrap_or(0);
        (
            state.remaining(Side::White) / 100,
            state.remaining(Side::Black) / 100,
            delay,
        )
    }

    fn handle_pump(&mut self, epoch: usize) {
        if epoch != self.clock.ticker().epoch() {
            log::trace!("dropping tick from stale epoch {}", epoch);
            return;
        }
        match self.clock.tick() {
            TickOutcome::Timeout(side) => {
                log::info!("{} flagged after {} moves", side, self.clock.state().move_count);
                let msg = format!("{} ran out of time!", side.label());
                self.status = fire_alert(&self.alert_config, &mut self.out, &msg);
                self.redraw();
            }
            TickOutcome::Running(_) => {
                if self.mode == AppMode::Clock
                    && !self.menu_visible
                    && !self.help_visible
                    && !self.confirm_exit
                    && self.last_frame != Some(self.frame_key())
                {
                    self.redraw();
                }
            }
            TickOutcome::Idle => {}
        }
    }

    fn handle_key(&mut self, key: char) {
        // While typing into a settings field every printable key is text
        let editing = self.mode == AppMode::Settings
            && self.settings.as_ref().map_or(false, |f| f.editing.is_some());

        // F-keys always processed first
        match key {
            KEY_F1 => { self.toggle_menu(); return; }
            KEY_F4 => { self.handle_f4(); return; }
            KEY_F2 if !editing => { self.handle_f2(); return; }
            KEY_F3 if !editing => { self.handle_f3(); return; }
            _ => {}
        }

        // If help screen is showing, any key dismisses it
        if self.help_visible {
            self.help_visible = false;
            self.redraw();
            return;
        }

        if self.confirm_exit {
            match key {
                'y' => {
                    self.clock.pause();
                    self.confirm_exit = false;
                    self.quit = true;
                }
                'n' | KEY_ESC => {
                    self.confirm_exit = false;
                    self.redraw();
                }
                _ => {}
            }
            return;
        }

        // If menu is open, handle menu navigation only
        if self.menu_visible {
            match key {
                KEY_UP | 'k' => {
                    if self.menu_cursor > 0 {
                        self.menu_cursor -= 1;
                        self.redraw();
                    }
                }
                KEY_DOWN | 'j' => {
                    if self.menu_cursor + 1 < self.menu_items().len() {
                        self.menu_cursor += 1;
                        self.redraw();
                    }
                }
                '\r' | '\n' => self.menu_select_item(),
                KEY_ESC => self.toggle_menu(),
                _ => {}
            }
            return;
        }

        match self.mode {
            AppMode::Clock => self.handle_key_clock(key),
            AppMode::PresetSelect => self.handle_key_presets(key),
            AppMode::Settings => self.handle_key_settings(key),
        }
    }

    fn menu_items(&self) -> &'static [&'static str] {
        match self.mode {
            AppMode::Clock => &["Help", "Pause/Resume", "Reset", "Export", "Time controls", "Settings"],
            AppMode::PresetSelect => &["Help", "Back"],
            AppMode::Settings => &["Help", "Apply", "Discard"],
        }
    }

    fn toggle_menu(&mut self) {
        if self.help_visible {
            self.help_visible = false;
            self.redraw();
            return;
        }
        if self.confirm_exit {
            return;
        }
        self.menu_visible = !self.menu_visible;
        self.menu_cursor = 0;
        self.redraw();
    }

    fn menu_select_item(&mut self) {
        self.menu_visible = false;

        match (self.mode, self.menu_cursor) {
            (_, 0) => self.help_visible = true,
            (AppMode::Clock, 1) => self.toggle_pause(),
            (AppMode::Clock, 2) => self.reset_clock(),
            (AppMode::Clock, 3) => self.export(),
            (AppMode::Clock, 4) => self.open_presets(),
            (AppMode::Clock, 5) => self.open_settings(),
            (AppMode::PresetSelect, 1) => self.mode = AppMode::Clock,
            (AppMode::Settings, 1) => self.apply_settings(),
            (AppMode::Settings, 2) => self.discard_settings(),
            _ => {}
        }
        self.redraw();
    }

    fn handle_f2(&mut self) {
        if self.help_visible { self.help_visible = false; self.redraw(); return; }
        if self.confirm_exit { return; }
        self.menu_visible = false;
        // F2 = Pause/Resume (same as 'p')
        if self.mode == AppMode::Clock {
            self.toggle_pause();
        }
        self.redraw();
    }

    fn handle_f3(&mut self) {
        if self.help_visible { self.help_visible = false; self.redraw(); return; }
        if self.confirm_exit { return; }
        self.menu_visible = false;
        // F3 = Reset (same as 'r')
        if self.mode == AppMode::Clock {
            self.reset_clock();
        }
        self.redraw();
    }

    fn handle_f4(&mut self) {
        // F4 closes help/menu/confirm first
        if self.help_visible {
            self.help_visible = false;
            self.redraw();
            return;
        }
        if self.menu_visible {
            self.menu_visible = false;
            self.redraw();
            return;
        }
        if self.confirm_exit {
            self.confirm_exit = false;
            self.redraw();
            return;
        }
        // F4 = Back/Quit
        match self.mode {
            AppMode::Clock => self.request_quit(),
            AppMode::PresetSelect => {
                self.mode = AppMode::Clock;
                self.redraw();
            }
            AppMode::Settings => {
                self.discard_settings();
                self.redraw();
            }
        }
    }

    fn help_text(&self) -> &'static str {
        match self.mode {
            AppMode::Clock => {
                "CHESS CLOCK HELP\n\n\
                 F1     Menu\n\
                 F2     Pause/Resume\n\
                 F3     Reset\n\
                 F4     Quit\n\n\
                 z      White's button\n\
                 m      Black's button\n\
                 Space  Button of the side to move\n\
                 p      Pause/Resume\n\
                 r      Reset\n\
                 e      Export clock.pgn\n\
                 t      Time controls\n\
                 s      Settings\n\
                 q      Quit"
            }
            AppMode::PresetSelect => {
                "TIME CONTROLS HELP\n\n\
                 F1     Menu\n\
                 F4     Back\n\n\
                 Up/Dn  Move cursor\n\
                 Enter  Apply to both sides\n\
                 q      Back"
            }
            AppMode::Settings => {
                "SETTINGS HELP\n\n\
                 F1     Menu\n\
                 F4     Discard\n\n\
                 Up/Dn  Move cursor\n\
                 Enter  Edit or toggle\n\
                 Esc    Cancel edit\n\
                 a      Apply and reset clock\n\
                 q      Discard"
            }
        }
    }

    /// A player's button: ends that player's turn and starts the opponent.
    fn press_button(&mut self, side: Side) {
        if self.clock.press(side.opponent()) {
            log::debug!("{} pressed, move {}", side, self.clock.state().move_count + 1);
            self.status = None;
        }
        self.redraw();
    }

    fn toggle_pause(&mut self) {
        let state = self.clock.state();
        if state.running {
            self.clock.pause();
            log::info!("clock paused");
        } else if state.is_paused() {
            self.clock.resume();
            log::info!("clock resumed");
        }
    }

    fn reset_clock(&mut self) {
        self.clock.reset();
        self.status = None;
        log::info!("clock reset");
    }

    fn export(&mut self) {
        match export::write_export(&self.export_dir, self.clock.state()) {
            Ok(path) => self.status = Some(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("{:#}", e);
                self.status = Some(format!("Export failed: {:#}", e));
            }
        }
    }

    fn request_quit(&mut self) {
        if self.clock.state().running {
            self.confirm_exit = true;
            self.redraw();
        } else {
            self.quit = true;
        }
    }

    fn open_presets(&mut self) {
        self.clock.pause();
        self.mode = AppMode::PresetSelect;
    }

    fn open_settings(&mut self) {
        self.clock.pause();
        self.settings = Some(SettingsForm::from_config(self.clock.config(), &self.alert_config));
        self.mode = AppMode::Settings;
    }

    fn apply_settings(&mut self) {
        let form = match &mut self.settings {
            Some(form) => form,
            None => return,
        };
        let tick_ms = self.clock.config().tick_ms;
        let config = match form.build(tick_ms) {
            Ok(config) => config,
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };
        let alerts = form.alerts();
        if let Err(e) = self.clock.configure(config) {
            form.error = Some(e.to_string());
            return;
        }
        log::info!("configuration applied: {:?}", config);
        self.alert_config = alerts;
        self.settings = None;
        self.status = Some("Settings applied".to_string());
        self.mode = AppMode::Clock;
    }

    fn discard_settings(&mut self) {
        self.settings = None;
        self.mode = AppMode::Clock;
    }

    fn apply_preset(&mut self, index: usize) {
        let preset = match PRESETS.get(index) {
            Some(preset) => preset,
            None => return,
        };
        let mut form = SettingsForm::from_config(self.clock.config(), &self.alert_config);
        form.apply_preset(preset.time_control);
        let mut config = match form.build(self.clock.config().tick_ms) {
            Ok(config) => config,
            Err(e) => {
                log::error!("preset {} rejected: {}", preset.time_control, e);
                return;
            }
        };
        if config.delay_type == DelayType::None && preset.time_control.increment_sec > 0 {
            config.delay_type = DelayType::Fischer;
        }
        match self.clock.configure(config) {
            Ok(()) => {
                self.status = Some(format!(
                    "{} {}",
                    preset.category.label(),
                    preset.time_control
                ));
                self.mode = AppMode::Clock;
            }
            Err(e) => log::error!("preset {} rejected: {}", preset.time_control, e),
        }
    }

    fn handle_key_clock(&mut self, key: char) {
        match key {
            'z' | 'Z' => self.press_button(Side::White),
            'm' | 'M' => self.press_button(Side::Black),
            ' ' => {
                let state = self.clock.state();
                let (paused, current) = (state.is_paused(), state.current);
                if paused {
                    self.clock.resume();
                    self.redraw();
                } else {
                    match current {
                        Some(side) => self.press_button(side),
                        None => self.press_button(Side::Black),
                    }
                }
            }
            'p' => {
                self.toggle_pause();
                self.redraw();
            }
            'r' => {
                self.reset_clock();
                self.redraw();
            }
            'e' => {
                self.export();
                self.redraw();
            }
            't' => {
                self.open_presets();
                self.redraw();
            }
            's' => {
                self.open_settings();
                self.redraw();
            }
            '?' => {
                self.help_visible = true;
                self.redraw();
            }
            'q' | KEY_ESC => self.request_quit(),
            _ => {}
        }
    }

    fn handle_key_presets(&mut self, key: char) {
        match key {
            KEY_UP | 'k' => {
                if self.preset_cursor > 0 {
                    self.preset_cursor -= 1;
                    self.redraw();
                }
            }
            KEY_DOWN | 'j' => {
                if self.preset_cursor + 1 < PRESETS.len() {
                    self.preset_cursor += 1;
                    self.redraw();
                }
            }
            '\r' | '\n' => {
                self.apply_preset(self.preset_cursor);
                self.redraw();
            }
            'q' | KEY_ESC => {
                self.mode = AppMode::Clock;
                self.redraw();
            }
            _ => {}
        }
    }

    fn handle_key_settings(&mut self, key: char) {
        let form = match &mut self.settings {
            Some(form) => form,
            None => return,
        };

        if form.editing.is_some() {
            match key {
                '\r' | '\n' => form.activate(),
                KEY_ESC => form.cancel_edit(),
                KEY_BACKSPACE | '\u{007f}' => form.backspace(),
                KEY_UP | KEY_DOWN => {}
                c => form.input_char(c),
            }
            self.redraw();
            return;
        }

        match key {
            KEY_UP | 'k' => form.move_up(),
            KEY_DOWN | 'j' => form.move_down(),
            '\r' | '\n' => form.activate(),
            'a' => self.apply_settings(),
            'q' | KEY_ESC => self.discard_settings(),
            _ => return,
        }
        self.redraw();
    }

    fn shutdown(&mut self) {
        self.clock.pause();
        self.clock.ticker().quit();
    }
}

fn pump_thread(control: Receiver<Scalar>, main_conn: Sender<Scalar>) {
    let mut interval = Duration::from_millis(clock_core::TICK_MS);
    let mut epoch = 0usize;
    let mut running = false;
    let mut deadline = Instant::now();

    loop {
        // Wait for the next deadline or a control message, whichever is first
        let received = if running {
            let now = Instant::now();
            if deadline <= now {
                // Fixed deadlines, so wakeup lateness does not accumulate
                deadline += interval;
                if main_conn.send(scalar(AppOp::Pump, epoch, 0)).is_err() {
                    return;
                }
                continue;
            }
            match control.recv_timeout(deadline - now) {
                Ok(msg) => msg,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        } else {
            match control.recv() {
                Ok(msg) => msg,
                Err(_) => return,
            }
        };

        match FromPrimitive::from_usize(received.id) {
            Some(PumpOp::Start) => {
                let period = (received.arg1 as u64).clamp(1, MAX_TICK_MS);
                interval = Duration::from_millis(period);
                epoch = received.arg2;
                running = true;
                deadline = Instant::now() + interval;
            }
            Some(PumpOp::Stop) => running = false,
            Some(PumpOp::Quit) => return,
            None => log::error!("unknown pump opcode: {:?}", received),
        }
    }
}

fn key_to_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) => Some(c),
        KeyCode::Enter => Some('\r'),
        KeyCode::Up => Some(KEY_UP),
        KeyCode::Down => Some(KEY_DOWN),
        KeyCode::Esc => Some(KEY_ESC),
        KeyCode::Backspace => Some(KEY_BACKSPACE),
        KeyCode::F(1) => Some(KEY_F1),
        KeyCode::F(2) => Some(KEY_F2),
        KeyCode::F(3) => Some(KEY_F3),
        KeyCode::F(4) => Some(KEY_F4),
        _ => None,
    }
}

fn key_thread(main_conn: Sender<Scalar>) {
    loop {
        let msg = match event::read() {
            Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    scalar(AppOp::Quit, 0, 0)
                } else {
                    match key_to_char(&key) {
                        Some(c) => scalar(AppOp::Rawkeys, c as usize, 0),
                        None => continue,
                    }
                }
            }
            Ok(Event::Resize(w, h)) => scalar(AppOp::Redraw, w as usize, h as usize),
            Ok(_) => continue,
            Err(e) => {
                log::error!("input error: {}", e);
                scalar(AppOp::Quit, 0, 0)
            }
        };
        let quitting = msg.id == AppOp::Quit as usize;
        if main_conn.send(msg).is_err() || quitting {
            return;
        }
    }
}

/// Raw mode and alternate screen for the lifetime of the value.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("can't enable raw mode")?;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)
            .context("can't enter alternate screen")?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let file = match &cli.config {
        Some(path) => config::load_file(path)?,
        None => FileSettings::default(),
    };
    let settings = config::resolve(&cli, file)?;
    log::info!(
        "starting clock: white {} black {} delay {} {}s",
        settings.clock.white.time_control,
        settings.clock.black.time_control,
        settings.clock.delay_type,
        settings.clock.delay_seconds
    );

    let (main_tx, main_rx) = mpsc::channel();
    let (pump_tx, pump_rx) = mpsc::channel();

    // Create pump thread
    let pump_main = main_tx.clone();
    thread::spawn(move || pump_thread(pump_rx, pump_main));

    let _terminal = TerminalGuard::enter()?;
    let key_main = main_tx.clone();
    thread::spawn(move || key_thread(key_main));

    let size = terminal::size().context("can't read terminal size")?;
    let mut app = ClockApp::new(settings, PumpTicker::new(pump_tx), io::stdout(), size)?;
    app.redraw();

    while !app.quit {
        let msg = match main_rx.recv() {
            Ok(msg) => msg,
            Err(_) => break,
        };
        match FromPrimitive::from_usize(msg.id) {
            Some(AppOp::Redraw) => {
                if msg.arg1 > 0 && msg.arg2 > 0 {
                    app.size = (msg.arg1 as u16, msg.arg2 as u16);
                }
                app.redraw();
            }
            Some(AppOp::Rawkeys) => {
                if let Some(key) = char::from_u32(msg.arg1 as u32) {
                    app.handle_key(key);
                }
            }
            Some(AppOp::Pump) => app.handle_pump(msg.arg1),
            Some(AppOp::Quit) => break,
            None => log::error!("unknown opcode: {:?}", msg),
        }
    }

    // Clean up
    app.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clock_core::{ClockConfig, TimeControl};

    fn app_with(config: ClockConfig) -> (ClockApp<Vec<u8>>, Receiver<Scalar>) {
        let (tx, rx) = mpsc::channel();
        let settings = AppSettings {
            clock: config,
            alerts: AlertConfig::default(),
            export_dir: std::env::temp_dir(),
        };
        let app = ClockApp::new(settings, PumpTicker::new(tx), Vec::new(), (80, 24)).unwrap();
        (app, rx)
    }

    fn app() -> (ClockApp<Vec<u8>>, Receiver<Scalar>) {
        app_with(ClockConfig::uniform(TimeControl::new(1, 0)))
    }

    fn keys(app: &mut ClockApp<Vec<u8>>, keys: &str) {
        for key in keys.chars() {
            app.handle_key(key);
        }
    }

    #[test]
    fn test_space_starts_white_and_pump() {
        let (mut app, rx) = app();
        keys(&mut app, " ");
        assert_eq!(app.clock.state().current, Some(Side::White));
        let sent: Vec<Scalar> = rx.try_iter().collect();
        assert_eq!(sent.last(), Some(&scalar(PumpOp::Start, 10, 1)));
    }

    #[test]
    fn test_buttons_hand_over_turn() {
        let (mut app, _rx) = app();
        keys(&mut app, "m");
        assert_eq!(app.clock.state().current, Some(Side::White));
        keys(&mut app, "m");
        // Black's button does nothing while White is to move
        assert_eq!(app.clock.state().current, Some(Side::White));
        keys(&mut app, "z");
        assert_eq!(app.clock.state().current, Some(Side::Black));
        keys(&mut app, " ");
        assert_eq!(app.clock.state().current, Some(Side::White));
        assert_eq!(app.clock.state().move_count, 1);
    }

    #[test]
    fn test_stale_pump_ignored() {
        let (mut app, _rx) = app();
        keys(&mut app, " ");
        let first_epoch = app.clock.ticker().epoch();
        keys(&mut app, "z");
        app.handle_pump(first_epoch);
        assert_eq!(app.clock.state().remaining(Side::Black), 60_000);
        app.handle_pump(app.clock.ticker().epoch());
        assert_eq!(app.clock.state().remaining(Side::Black), 59_990);
    }

    #[test]
    fn test_pause_toggle() {
        let (mut app, rx) = app();
        keys(&mut app, " p");
        assert!(app.clock.state().is_paused());
        assert_eq!(rx.try_iter().last(), Some(scalar(PumpOp::Stop, 0, 0)));
        keys(&mut app, "p");
        assert!(app.clock.state().running);
        assert_eq!(app.clock.state().current, Some(Side::White));
    }

    #[test]
    fn test_timeout_alerts() {
        let (mut app, _rx) = app();
        keys(&mut app, " ");
        let epoch = app.clock.ticker().epoch();
        for _ in 0..6_000 {
            app.handle_pump(epoch);
        }
        assert_eq!(app.clock.state().timeout_side, Some(Side::White));
        assert_eq!(app.status.as_deref(), Some("White ran out of time!"));
        assert!(app.out.contains(&0x07));
    }

    #[test]
    fn test_quit_confirms_while_running() {
        let (mut app, _rx) = app();
        keys(&mut app, " q");
        assert!(app.confirm_exit);
        assert!(!app.quit);
        keys(&mut app, "n");
        assert!(!app.confirm_exit);
        keys(&mut app, "qy");
        assert!(app.quit);
    }

    #[test]
    fn test_quit_immediately_when_idle() {
        let (mut app, _rx) = app();
        keys(&mut app, "q");
        assert!(app.quit);
    }

    #[test]
    fn test_settings_apply_validates() {
        let (mut app, _rx) = app();
        keys(&mut app, " s");
        assert_eq!(app.mode, AppMode::Settings);
        assert!(app.clock.state().is_paused());

        // Delay seconds row: type an invalid value, then apply
        app.handle_key(KEY_DOWN);
        for _ in 0..4 {
            app.handle_key(KEY_DOWN);
        }
        keys(&mut app, "\r");
        app.handle_key(KEY_BACKSPACE);
        keys(&mut app, "x\ra");
        assert_eq!(app.mode, AppMode::Settings);
        assert!(app.settings.as_ref().and_then(|f| f.error.as_ref()).is_some());

        keys(&mut app, "\r");
        app.handle_key(KEY_BACKSPACE);
        keys(&mut app, "3\r");
        // Delay type row
        app.handle_key(KEY_UP);
        keys(&mut app, "\ra");
        assert_eq!(app.mode, AppMode::Clock);
        let state = app.clock.state();
        assert_eq!(state.delay_type, DelayType::Bronstein);
        assert_eq!(state.delay_seconds, 3);
        assert_eq!(state.current, None);
    }

    #[test]
    fn test_settings_typing_q_does_not_leave() {
        let (mut app, _rx) = app();
        keys(&mut app, "s\rq");
        assert_eq!(app.mode, AppMode::Settings);
        assert_eq!(
            app.settings.as_ref().and_then(|f| f.editing.clone()).as_deref(),
            Some("1+0q")
        );
        app.handle_key(KEY_ESC);
        keys(&mut app, "q");
        assert_eq!(app.mode, AppMode::Clock);
        assert!(app.settings.is_none());
    }

    #[test]
    fn test_preset_applies_fischer() {
        let (mut app, _rx) = app();
        keys(&mut app, "t");
        assert_eq!(app.mode, AppMode::PresetSelect);
        for _ in 0..4 {
            app.handle_key(KEY_DOWN);
        }
        keys(&mut app, "\r");
        assert_eq!(app.mode, AppMode::Clock);
        let config = app.clock.config();
        assert_eq!(config.white.time_control.to_string(), "3+2");
        assert_eq!(config.black.increment_sec, 2);
        assert_eq!(config.delay_type, DelayType::Fischer);
        assert_eq!(app.clock.state().remaining(Side::Black), 180_000);
    }

    #[test]
    fn test_menu_reset() {
        let (mut app, _rx) = app();
        keys(&mut app, " ");
        let epoch = app.clock.ticker().epoch();
        app.handle_pump(epoch);
        app.handle_key(KEY_F1);
        assert!(app.menu_visible);
        app.handle_key(KEY_DOWN);
        app.handle_key(KEY_DOWN);
        keys(&mut app, "\r");
        assert!(!app.menu_visible);
        assert_eq!(app.clock.state().remaining(Side::White), 60_000);
        assert!(!app.clock.state().running);
    }

    #[test]
    fn test_export_writes_file() {
        let dir = std::env::temp_dir().join(format!("chess-clock-app-{}", std::process::id()));
        let (mut app, _rx) = app();
        app.export_dir = dir.clone();
        keys(&mut app, "e");
        let text = std::fs::read_to_string(dir.join("clock.pgn")).unwrap();
        assert!(text.starts_with("[TimeControl \"1+0\"]"));
        assert!(app.status.as_deref().unwrap_or("").starts_with("Saved"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_pump_sees_quit_during_long_period() {
        let (control_tx, control_rx) = mpsc::channel();
        let (main_tx, main_rx) = mpsc::channel();
        let handle = thread::spawn(move || pump_thread(control_rx, main_tx));

        control_tx.send(scalar(PumpOp::Start, 5, 7)).unwrap();
        let tick = main_rx.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(tick, scalar(AppOp::Pump, 7, 0));

        // An out-of-range period is clamped and Quit still lands mid-period
        control_tx.send(scalar(PumpOp::Start, usize::MAX, 8)).unwrap();
        control_tx.send(scalar(PumpOp::Quit, 0, 0)).unwrap();
        let begin = Instant::now();
        loop {
            match main_rx.recv_timeout(Duration::from_millis(500)) {
                Ok(msg) => assert_eq!(msg.id, AppOp::Pump as usize),
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => panic!("pump did not quit"),
            }
        }
        assert!(begin.elapsed() < Duration::from_millis(500));
        handle.join().unwrap();
    }
}
