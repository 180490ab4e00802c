use clock_core::{parse_seconds, ClockConfig, ClockError, DelayType, SideConfig, TimeControl};

use crate::alerts::AlertConfig;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Field {
    WhiteTimeControl,
    BlackTimeControl,
    WhiteIncrement,
    BlackIncrement,
    DelayType,
    DelaySeconds,
    Bell,
    Notification,
}

pub const FIELDS: [Field; 8] = [
    Field::WhiteTimeControl,
    Field::BlackTimeControl,
    Field::WhiteIncrement,
    Field::BlackIncrement,
    Field::DelayType,
    Field::DelaySeconds,
    Field::Bell,
    Field::Notification,
];

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::WhiteTimeControl => "White time",
            Field::BlackTimeControl => "Black time",
            Field::WhiteIncrement => "White increment (s)",
            Field::BlackIncrement => "Black increment (s)",
            Field::DelayType => "Delay type",
            Field::DelaySeconds => "Delay (s)",
            Field::Bell => "Timeout bell",
            Field::Notification => "Timeout notice",
        }
    }

    fn is_text(self) -> bool {
        !matches!(self, Field::DelayType | Field::Bell | Field::Notification)
    }
}

/// Editable copy of the clock configuration. Text fields stay as typed until
/// `build` validates them.
pub struct SettingsForm {
    pub cursor: usize,
    pub editing: Option<String>,
    pub error: Option<String>,
    white: String,
    black: String,
    white_increment: String,
    black_increment: String,
    delay_type: DelayType,
    delay_seconds: String,
    alerts: AlertConfig,
}

impl SettingsForm {
    pub fn from_config(config: &ClockConfig, alerts: &AlertConfig) -> Self {
        Self {
            cursor: 0,
            editing: None,
            error: None,
            white: config.white.time_control.to_string(),
            black: config.black.time_control.to_string(),
            white_increment: config.white.increment_sec.to_string(),
            black_increment: config.black.increment_sec.to_string(),
            delay_type: config.delay_type,
            delay_seconds: config.delay_seconds.to_string(),
            alerts: *alerts,
        }
    }

    pub fn selected(&self) -> Field {
        FIELDS[self.cursor]
    }

    pub fn value(&self, field: Field) -> String {
        match field {
            Field::WhiteTimeControl => self.white.clone(),
            Field::BlackTimeControl => self.black.clone(),
            Field::WhiteIncrement => self.white_increment.clone(),
            Field::BlackIncrement => self.black_increment.clone(),
            Field::DelayType => self.delay_type.to_string(),
            Field::DelaySeconds => self.delay_seconds.clone(),
            Field::Bell => on_off(self.alerts.bell).to_string(),
            Field::Notification => on_off(self.alerts.notification).to_string(),
        }
    }

    pub fn move_up(&mut self) {
        if self.editing.is_none() && self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.editing.is_none() && self.cursor + 1 < FIELDS.len() {
            self.cursor += 1;
        }
    }

    /// Enter on the selected row: toggles choice fields, starts or commits
    /// editing on text fields.
    pub fn activate(&mut self) {
        if self.editing.is_some() {
            self.commit_edit();
            return;
        }
        let field = self.selected();
        match field {
            Field::DelayType => self.delay_type = self.delay_type.cycle(),
            Field::Bell => self.alerts.bell = !self.alerts.bell,
            Field::Notification => self.alerts.notification = !self.alerts.notification,
            _ if field.is_text() => self.editing = Some(self.value(field)),
            _ => {}
        }
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(buf) = &mut self.editing {
            if buf.len() < 12 && !c.is_control() {
                buf.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buf) = &mut self.editing {
            buf.pop();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    fn commit_edit(&mut self) {
        let text = match self.editing.take() {
            Some(text) => text.trim().to_string(),
            None => return,
        };
        self.error = None;
        match self.selected() {
            Field::WhiteTimeControl => {
                if let Ok(tc) = TimeControl::parse(&text) {
                    self.white_increment = tc.increment_sec.to_string();
                }
                self.white = text;
            }
            Field::BlackTimeControl => {
                if let Ok(tc) = TimeControl::parse(&text) {
                    self.black_increment = tc.increment_sec.to_string();
                }
                self.black = text;
            }
            Field::WhiteIncrement => self.white_increment = text,
            Field::BlackIncrement => self.black_increment = text,
            Field::DelaySeconds => self.delay_seconds = text,
            _ => {}
        }
    }

    /// Put both sides on the same time control, increments from the token.
    pub fn apply_preset(&mut self, time_control: TimeControl) {
        let token = time_control.to_string();
        let increment = time_control.increment_sec.to_string();
        self.white = token.clone();
        self.black = token;
        self.white_increment = increment.clone();
        self.black_increment = increment;
        self.error = None;
    }

    pub fn alerts(&self) -> AlertConfig {
        self.alerts
    }

    pub fn build(&self, tick_ms: u64) -> Result<ClockConfig, ClockError> {
        let config = ClockConfig {
            white: SideConfig {
                time_control: TimeControl::parse(&self.white)?,
                increment_sec: parse_seconds(&self.white_increment)?,
            },
            black: SideConfig {
                time_control: TimeControl::parse(&self.black)?,
                increment_sec: parse_seconds(&self.black_increment)?,
            },
            delay_type: self.delay_type,
            delay_seconds: parse_seconds(&self.delay_seconds)?,
            tick_ms,
        };
        config.validate()?;
        Ok(config)
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clock_core::TICK_MS;

    fn form() -> SettingsForm {
        SettingsForm::from_config(&ClockConfig::default(), &AlertConfig::default())
    }

    fn type_text(form: &mut SettingsForm, text: &str) {
        for c in text.chars() {
            form.input_char(c);
        }
    }

    fn replace_selected(form: &mut SettingsForm, text: &str) {
        form.activate();
        while form.editing.as_deref().map_or(false, |b| !b.is_empty()) {
            form.backspace();
        }
        type_text(form, text);
        form.activate();
    }

    #[test]
    fn test_round_trip_unchanged() {
        assert_eq!(form().build(TICK_MS).unwrap(), ClockConfig::default());
    }

    #[test]
    fn test_edit_token_updates_increment() {
        let mut f = form();
        replace_selected(&mut f, "15+10");
        assert_eq!(f.value(Field::WhiteTimeControl), "15+10");
        assert_eq!(f.value(Field::WhiteIncrement), "10");
        let config = f.build(TICK_MS).unwrap();
        assert_eq!(config.white.time_control.start_ms(), 900_000);
        assert_eq!(config.black.time_control.start_ms(), 600_000);
    }

    #[test]
    fn test_invalid_field_reported_on_build() {
        let mut f = form();
        f.cursor = 5;
        replace_selected(&mut f, "-2");
        assert_eq!(
            f.build(TICK_MS),
            Err(ClockError::InvalidNumber("-2".into()))
        );
    }

    #[test]
    fn test_cancel_edit_keeps_value() {
        let mut f = form();
        f.activate();
        type_text(&mut f, "99");
        f.cancel_edit();
        assert_eq!(f.value(Field::WhiteTimeControl), "10+0");
        assert!(f.editing.is_none());
    }

    #[test]
    fn test_cursor_locked_while_editing() {
        let mut f = form();
        f.activate();
        f.move_down();
        assert_eq!(f.cursor, 0);
        f.cancel_edit();
        f.move_down();
        assert_eq!(f.selected(), Field::BlackTimeControl);
    }

    #[test]
    fn test_toggle_fields() {
        let mut f = form();
        f.cursor = 4;
        f.activate();
        assert_eq!(f.value(Field::DelayType), "bronstein");
        f.cursor = 6;
        f.activate();
        assert!(!f.alerts().bell);
        assert!(f.editing.is_none());
    }

    #[test]
    fn test_apply_preset() {
        let mut f = form();
        f.apply_preset(TimeControl::new(3, 2));
        let config = f.build(TICK_MS).unwrap();
        assert_eq!(config.white, config.black);
        assert_eq!(config.black.increment_sec, 2);
    }
}
