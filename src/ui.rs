use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, AppState},
    clock::Clock,
    form::{FormRow, SettingsForm},
    projection::{format_clock, Projection},
    sequencer::{self, Phase},
    session::RunState,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const LABEL_WIDTH: usize = 26;

pub fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Idle => Color::Gray,
        Phase::Warmup => Color::Yellow,
        Phase::Work => Color::Red,
        Phase::Rest1 => Color::Green,
        Phase::Rest2 => Color::Cyan,
        Phase::Cooldown => Color::Blue,
        Phase::Done => Color::Magenta,
    }
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state() {
            AppState::Settings => render_settings(&self.form, area, buf),
            AppState::Timer => render_timer(&self.projection(), area, buf),
        }
    }
}

pub fn render_settings(form: &SettingsForm, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let error_style = Style::default().fg(Color::Red);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),                        // title
            Constraint::Length(FormRow::ALL.len() as u16), // rows
            Constraint::Length(1),                        // padding
            Constraint::Length(1),                        // summary
            Constraint::Min(0),                           // errors
            Constraint::Length(1),                        // legend
        ])
        .split(area);

    Paragraph::new(Span::styled("interval timer", bold_style))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let lines: Vec<Line> = FormRow::ALL
        .iter()
        .map(|&row| {
            let label = row.label();
            let pad = " ".repeat(LABEL_WIDTH.saturating_sub(label.width()));
            let selected = form.selected() == row;
            let marker = if selected { "› " } else { "  " };

            let mut value_style = bold_style;
            if form.error_for(row).is_some() {
                value_style = value_style.fg(Color::Red);
            }
            if selected {
                value_style = value_style.add_modifier(Modifier::REVERSED);
            }

            let value = form.display_value(row);
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{label}{pad}"), dim_style),
                Span::styled(format!(" {value} "), value_style),
            ])
        })
        .collect();
    Paragraph::new(lines).render(chunks[1], buf);

    let summary = match form.raw().parse() {
        Ok(cfg) => format!(
            "{} rounds · total {}",
            cfg.total_rounds(),
            format_clock(sequencer::total_duration_secs(&cfg))
        ),
        Err(_) => "fix the highlighted settings to start".to_string(),
    };
    Paragraph::new(Span::styled(summary, italic_style))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    let errors: Vec<Line> = form
        .errors()
        .iter()
        .map(|e| Line::from(Span::styled(e.to_string(), error_style)))
        .collect();
    Paragraph::new(errors)
        .wrap(Wrap { trim: true })
        .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "↑/↓ select · digits edit · (space) toggle · (enter) start · (esc)ape",
        italic_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);
}

pub fn render_timer(p: &Projection, area: Rect, buf: &mut Buffer) {
    let color = phase_color(p.phase);
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let phase_style = bold_style.fg(color);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),    // top padding
            Constraint::Length(1), // phase
            Constraint::Length(1), // clock
            Constraint::Length(1), // round
            Constraint::Length(1), // padding
            Constraint::Length(1), // progress
            Constraint::Length(1), // next
            Constraint::Length(1), // workout remaining
            Constraint::Min(0),    // bottom padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let phase_text = match p.run_state {
        RunState::Paused => format!("{} · PAUSED", p.phase_label.to_uppercase()),
        _ => p.phase_label.to_uppercase(),
    };
    Paragraph::new(Span::styled(phase_text, phase_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(p.remaining.clone(), bold_style))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let round = if p.current_round == 0 {
        format!("{} rounds", p.total_rounds)
    } else {
        format!("round {}/{}", p.current_round, p.total_rounds)
    };
    Paragraph::new(Span::styled(round, dim_style))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio(p.progress_fraction)
        .label(String::new())
        .use_unicode(true)
        .render(chunks[5], buf);

    Paragraph::new(Span::styled(p.next_phase_description.clone(), italic_style))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

    Paragraph::new(Span::styled(
        format!("{} left in workout", p.workout_remaining),
        dim_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[7], buf);

    let legend = match (p.phase, p.run_state) {
        (Phase::Done, _) => "(r)eset / (esc)ape",
        (_, RunState::Paused) => "(space) resume / (r)eset / (esc)ape",
        _ => "(space) pause / (r)eset / (esc)ape",
    };
    Paragraph::new(Span::styled(legend, italic_style)).render(chunks[9], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{MemoryConfigStore, RawConfig};
    use crate::cue::NullCueEmitter;

    fn screen_text<C: Clock>(app: &App<C>) -> String {
        let mut buf = Buffer::empty(Rect::new(0, 0, 80, 30));
        app.render(buf.area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    fn app(raw: RawConfig) -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let app = App::new(
            raw,
            clock.clone(),
            Box::new(NullCueEmitter),
            Box::new(MemoryConfigStore::new()),
        );
        (app, clock)
    }

    #[test]
    fn settings_screen_lists_fields_and_total() {
        let (app, _clock) = app(RawConfig::default());
        let text = screen_text(&app);
        assert!(text.contains("Warm-up (s)"));
        assert!(text.contains("Long rest every N rounds"));
        // 10 warm-up + 8 x 20 work + 7 x 10 rest
        assert!(text.contains("8 rounds · total 04:00"));
    }

    #[test]
    fn settings_screen_shows_validation_errors() {
        let (mut app, _clock) = app(RawConfig {
            total_rounds: "0".into(),
            ..RawConfig::default()
        });
        assert!(app.start().is_err());
        let text = screen_text(&app);
        assert!(text.contains("rounds must be between 1 and 999"));
        assert!(text.contains("fix the highlighted settings"));
    }

    #[test]
    fn timer_screen_shows_projection() {
        let (mut app, clock) = app(RawConfig::default());
        app.start().unwrap();
        clock.advance_ms(3_500);
        app.on_tick();

        let text = screen_text(&app);
        assert!(text.contains("WARM-UP"));
        assert!(text.contains("00:07"));
        assert!(text.contains("Next: Work · round 1/8"));
        assert!(text.contains("(space) pause"));
    }

    #[test]
    fn paused_timer_is_labelled() {
        let (mut app, _clock) = app(RawConfig::default());
        app.start().unwrap();
        app.toggle_pause();
        let text = screen_text(&app);
        assert!(text.contains("WARM-UP · PAUSED"));
        assert!(text.contains("(space) resume"));
    }
}
