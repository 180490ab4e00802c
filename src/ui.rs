use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{Clear, ClearType},
};

use clock_core::{format_clock, ClockState, DelayType, Side, PRESETS};

use crate::settings::{SettingsForm, FIELDS};

pub type Size = (u16, u16);

fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))
}

fn text<W: Write>(out: &mut W, x: u16, y: u16, s: &str) -> io::Result<()> {
    queue!(out, MoveTo(x, y), Print(s))
}

fn bold<W: Write>(out: &mut W, x: u16, y: u16, s: &str) -> io::Result<()> {
    queue!(
        out,
        MoveTo(x, y),
        SetAttribute(Attribute::Bold),
        Print(s),
        SetAttribute(Attribute::Reset)
    )
}

fn footer<W: Write>(out: &mut W, size: Size, s: &str) -> io::Result<()> {
    text(out, 2, size.1.saturating_sub(2), s)
}

pub fn draw_menu<W: Write>(out: &mut W, size: Size, items: &[&str], cursor: usize) -> io::Result<()> {
    clear_screen(out)?;
    bold(out, 2, 1, "MENU")?;

    for (i, item) in items.iter().enumerate() {
        let marker = if i == cursor { "> " } else { "  " };
        text(out, 3, 3 + i as u16, &format!("{}{}", marker, item))?;
    }

    footer(out, size, "arrows=select  ENTER=open  F4=close")?;
    out.flush()
}

pub fn draw_help<W: Write>(out: &mut W, size: Size, help_text: &str) -> io::Result<()> {
    clear_screen(out)?;

    for (i, line) in help_text.lines().enumerate() {
        let y = 1 + i as u16;
        if y + 3 > size.1 {
            break;
        }
        if i == 0 {
            bold(out, 2, y, line)?;
        } else {
            text(out, 2, y, line)?;
        }
    }

    footer(out, size, "Press any key to close")?;
    out.flush()
}

pub fn draw_confirm_exit<W: Write>(out: &mut W) -> io::Result<()> {
    clear_screen(out)?;
    bold(out, 2, 2, "Clock Running")?;
    text(out, 2, 4, "A clock is still running.")?;
    text(out, 2, 5, "Quit anyway?")?;
    text(out, 4, 7, "y = Stop & quit")?;
    text(out, 4, 8, "n = Cancel")?;
    text(out, 4, 9, "F4 = Cancel")?;
    out.flush()
}

fn side_panel<W: Write>(out: &mut W, x: u16, side: Side, state: &ClockState) -> io::Result<()> {
    let active = state.current == Some(side);
    let flagged = state.timeout_side == Some(side);
    let marker = if active { ">" } else { " " };

    bold(out, x, 3, &format!("{} {}", marker, side.label().to_uppercase()))?;
    let time = format_clock(state.remaining(side));
    if active || flagged {
        bold(out, x + 2, 5, &time)?;
    } else {
        text(out, x + 2, 5, &time)?;
    }
    text(out, x + 2, 7, &format!("{}", state.time_control[side]))?;

    if flagged {
        bold(out, x + 2, 9, "FLAG")?;
    } else if active && state.delay_type == DelayType::Bronstein {
        let left = (state.delay_seconds as u64 * 1000).saturating_sub(state.delay_spent(side));
        if left > 0 {
            text(out, x + 2, 9, &format!("delay {}", format_clock(left)))?;
        }
    }
    Ok(())
}

pub fn draw_clock<W: Write>(
    out: &mut W,
    size: Size,
    state: &ClockState,
    status: Option<&str>,
) -> io::Result<()> {
    clear_screen(out)?;

    let delay = match state.delay_type {
        DelayType::None => "no delay".to_string(),
        DelayType::Bronstein => format!("bronstein {}s", state.delay_seconds),
        DelayType::Fischer => format!(
            "fischer +{}s/+{}s",
            state.increment_sec[Side::White],
            state.increment_sec[Side::Black]
        ),
    };
    bold(out, 2, 1, &format!("CHESS CLOCK  [{}]  move {}", delay, state.move_count + 1))?;

    let half = size.0 / 2;
    side_panel(out, 4, Side::White, state)?;
    side_panel(out, half.max(24), Side::Black, state)?;

    let banner = if let Some(side) = state.timeout_side {
        Some(format!("{} ran out of time. Press r to reset.", side.label()))
    } else if state.is_paused() {
        Some("PAUSED - p to resume".to_string())
    } else if state.current.is_none() {
        Some("Press SPACE to start White's clock".to_string())
    } else {
        None
    };
    if let Some(banner) = banner {
        bold(out, 2, 11, &banner)?;
    }
    if let Some(status) = status {
        text(out, 2, 13, status)?;
    }

    footer(out, size, "z/m=press  SPACE=switch  p=pause  r=reset  e=export  F1=menu")?;
    out.flush()
}

pub fn draw_presets<W: Write>(out: &mut W, size: Size, cursor: usize) -> io::Result<()> {
    clear_screen(out)?;
    bold(out, 2, 1, "TIME CONTROLS")?;

    let mut y = 3u16;
    let mut category = None;
    for (i, preset) in PRESETS.iter().enumerate() {
        if category != Some(preset.category) {
            category = Some(preset.category);
            if i > 0 {
                y += 1;
            }
            bold(out, 3, y, preset.category.label())?;
            y += 1;
        }
        if y + 3 > size.1 {
            break;
        }
        let marker = if i == cursor { "> " } else { "  " };
        text(out, 5, y, &format!("{}{}", marker, preset.time_control))?;
        y += 1;
    }

    footer(out, size, "arrows=select  ENTER=apply  q=back")?;
    out.flush()
}

pub fn draw_settings<W: Write>(out: &mut W, size: Size, form: &SettingsForm) -> io::Result<()> {
    clear_screen(out)?;
    bold(out, 2, 1, "SETTINGS")?;

    for (i, field) in FIELDS.iter().enumerate() {
        let y = 3 + i as u16;
        let selected = i == form.cursor;
        let marker = if selected { "> " } else { "  " };
        let value = match (&form.editing, selected) {
            (Some(buf), true) => format!("[{}_]", buf),
            _ => form.value(*field),
        };
        text(out, 3, y, &format!("{}{:<22}{}", marker, field.label(), value))?;
    }

    if let Some(err) = &form.error {
        bold(out, 2, 4 + FIELDS.len() as u16, &format!("! {}", err))?;
    }

    let hint = if form.editing.is_some() {
        "type value  ENTER=keep  ESC=cancel"
    } else {
        "arrows=select  ENTER=edit/toggle  a=apply  q=discard"
    };
    footer(out, size, hint)?;
    out.flush()
}
