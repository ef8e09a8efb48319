//! Layout and drawing: playfield grid, blocks, sidebar and the win/lose overlay.

use crate::assets::OverlayArt;
use crate::game::{Block, Field, GameState, Status};
use crate::motion::SpeedSetting;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{self, Borders, Clear, Gauge, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Terminal cells per grid column. Wide enough that sub-column motion shows.
pub const CELL_WIDTH: u16 = 4;
/// Terminal lines per grid row.
pub const CELL_HEIGHT: u16 = 1;

const SIDEBAR_WIDTH: u16 = 22;
/// Overlay fade-in (TachyonFX).
const OVERLAY_FADE_MS: u32 = 400;
/// Glyph stroked over every cell's left edge; the grid sits on top of blocks.
const GRID_MARK: &str = "▏";

pub const WIN_MESSAGE: &str = "YOU WIN!";
pub const LOSE_MESSAGE: &str = "GAME OVER";
pub const RESTART_HINT: &str = "Press Space or Click to Restart";

/// Board size in terminal cells (no border).
pub fn board_size(field: &Field) -> (u16, u16) {
    (field.cols * CELL_WIDTH, field.rows * CELL_HEIGHT)
}

/// Board plus border.
fn playfield_outer_size(field: &Field) -> (u16, u16) {
    let (w, h) = board_size(field);
    (w + 2, h + 2)
}

/// Smallest terminal that fits the playfield and sidebar.
pub fn min_terminal_size(field: &Field) -> (u16, u16) {
    let (pw, ph) = playfield_outer_size(field);
    (pw + SIDEBAR_WIDTH, ph)
}

/// Terminal rect a block covers inside `board`, or `None` when it is off the field.
///
/// Pure function of the block's grid coordinates; fractional columns round to the
/// nearest terminal cell.
pub fn block_rect(block: &Block, board: Rect) -> Option<Rect> {
    let row = u16::try_from(block.row).ok()?;
    let y = row.checked_mul(CELL_HEIGHT)?;
    if y >= board.height {
        return None;
    }
    let x = (block.col_start.max(0.0) * f64::from(CELL_WIDTH)).round() as u16;
    if x >= board.width {
        return None;
    }
    let width = (block.col_span * CELL_WIDTH).min(board.width - x);
    if width == 0 {
        return None;
    }
    Some(Rect {
        x: board.x + x,
        y: board.y + y,
        width,
        height: CELL_HEIGHT.min(board.height - y),
    })
}

/// Draw one frame. The state is only read.
///
/// At game over the overlay fades in via `overlay_effect` unless `no_animation`;
/// `overlay_process_time` tracks the effect's last frame for its delta.
pub fn draw(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    art: &OverlayArt,
    speed: SpeedSetting,
    area: Rect,
    overlay_effect: &mut Option<Effect>,
    overlay_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
) {
    let (need_w, need_h) = min_terminal_size(&state.field);
    if area.width < need_w || area.height < need_h {
        draw_too_small(frame, theme, area, need_w, need_h);
        return;
    }

    let playfield_area = draw_game(frame, state, theme, speed, area);

    if state.game_over() {
        let popup = draw_overlay(frame, state, theme, art, playfield_area);
        if !no_animation {
            apply_overlay_effect(frame, theme, popup, overlay_effect, overlay_process_time, now);
        }
    }
}

fn draw_too_small(frame: &mut Frame, theme: &Theme, area: Rect, need_w: u16, need_h: u16) {
    let lines = vec![
        Line::from(Span::styled(" Terminal too small ", Style::default().fg(theme.title).bold())),
        Line::from(Span::styled(
            format!(" need {}×{}, have {}×{} ", need_w, need_h, area.width, area.height),
            Style::default().fg(theme.text),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(area, frame.buffer_mut());
}

/// Draw playfield + sidebar centred in `area`. Returns the playfield rect.
fn draw_game(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    speed: SpeedSetting,
    area: Rect,
) -> Rect {
    let (pw, ph) = playfield_outer_size(&state.field);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);

    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);

    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert_chunks[1]);
    let (playfield_area, sidebar_area) = (inner[0], inner[1]);

    draw_playfield(frame, state, theme, playfield_area);
    draw_sidebar(frame, state, theme, speed, sidebar_area);
    playfield_area
}

fn draw_playfield(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let block = widgets::Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.grid).bg(theme.bg))
        .title(Span::styled(" Stacker ", Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let (bw, bh) = board_size(&state.field);
    let board = Rect {
        x: inner.x,
        y: inner.y,
        width: bw.min(inner.width),
        height: bh.min(inner.height),
    };

    let buf = frame.buffer_mut();
    for y in board.top()..board.bottom() {
        for x in board.left()..board.right() {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.bg));
        }
    }

    for placed in state.stack.iter() {
        fill_block(buf, placed, board, theme.stack);
    }
    fill_block(buf, &state.current, board, theme.active);

    for y in board.top()..board.bottom() {
        for col in 0..state.field.cols {
            let x = board.x + col * CELL_WIDTH;
            if x < board.right() {
                buf[(x, y)].set_symbol(GRID_MARK).set_fg(theme.grid);
            }
        }
    }
}

fn fill_block(buf: &mut ratatui::buffer::Buffer, block: &Block, board: Rect, color: Color) {
    let Some(r) = block_rect(block, board) else {
        return;
    };
    for y in r.top()..r.bottom() {
        for x in r.left()..r.right() {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(color));
        }
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    speed: SpeedSetting,
    area: Rect,
) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.text);
    let border_style = Style::default().fg(theme.grid).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Stats (border + height, span, status)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Speed (border + label + gauge)
            Constraint::Length(1), // gap
            Constraint::Length(5), // Keys
        ])
        .split(area);

    // --- Stats ---
    let stats_block = widgets::Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let placed = state.stack.len().saturating_sub(1);
    let status = match state.status() {
        Status::Running => "playing",
        Status::Won => "won",
        Status::Lost => "lost",
    };
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Height: ", title_style),
            Span::styled(format!("{}/{}", placed, state.field.rows.saturating_sub(1)), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Span: ", title_style),
            Span::styled(state.current.col_span.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Status: ", title_style),
            Span::styled(status, fg_style),
        ]),
    ];
    Paragraph::new(stats_lines).render(stats_inner, frame.buffer_mut());

    // --- Speed ---
    let speed_block = widgets::Block::default().borders(Borders::ALL).border_style(border_style);
    let speed_inner = speed_block.inner(chunks[2]);
    speed_block.render(chunks[2], frame.buffer_mut());
    let speed_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(speed_inner);
    Paragraph::new(Line::from(vec![
        Span::styled("Speed ", title_style),
        Span::styled(speed.to_string(), fg_style),
    ]))
    .render(speed_layout[0], frame.buffer_mut());
    let ratio = ((speed.value() - SpeedSetting::MIN) / (SpeedSetting::MAX - SpeedSetting::MIN))
        .clamp(0.0, 1.0);
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(theme.active).bg(theme.bg))
        .render(speed_layout[1], frame.buffer_mut());

    // --- Keys ---
    let keys_block = widgets::Block::default().borders(Borders::ALL).border_style(border_style);
    let keys_inner = keys_block.inner(chunks[4]);
    keys_block.render(chunks[4], frame.buffer_mut());
    let key_style = Style::default().fg(theme.active);
    let keys = vec![
        Line::from(vec![Span::styled("SPACE ", key_style), Span::styled("drop", fg_style)]),
        Line::from(vec![Span::styled("+/-   ", key_style), Span::styled("speed", fg_style)]),
        Line::from(vec![Span::styled("Q     ", key_style), Span::styled("quit", fg_style)]),
    ];
    Paragraph::new(keys).render(keys_inner, frame.buffer_mut());
}

/// Win/lose popup centred over the playfield. Returns the popup rect.
fn draw_overlay(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    art: &OverlayArt,
    over: Rect,
) -> Rect {
    let win = state.win();
    let message = if win { WIN_MESSAGE } else { LOSE_MESSAGE };
    let message_style = if win {
        Style::default().fg(Color::Black).bg(theme.title).bold()
    } else {
        Style::default().fg(theme.text).bg(theme.stack).bold()
    };

    let mut lines: Vec<Line> = vec![Line::from("")];
    if let Some(banner) = art.for_outcome(win) {
        lines.extend(
            banner
                .iter()
                .map(|l| Line::from(Span::styled(l.clone(), Style::default().fg(theme.title)))),
        );
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(format!(" {message} "), message_style)));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(RESTART_HINT, Style::default().fg(theme.text))));
    lines.push(Line::from(""));

    let content_w = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
    let popup_w = (content_w + 4).min(frame.area().width);
    let popup_h = (lines.len() as u16 + 2).min(frame.area().height);
    let popup = Rect {
        x: (over.x + over.width / 2).saturating_sub(popup_w / 2),
        y: (over.y + over.height / 2).saturating_sub(popup_h / 2),
        width: popup_w,
        height: popup_h,
    }
    .intersection(frame.area());

    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            widgets::Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.grid).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
    popup
}

/// Create or advance the overlay fade-in (TachyonFX: fade from background over ~400 ms).
fn apply_overlay_effect(
    frame: &mut Frame,
    theme: &Theme,
    popup: Rect,
    overlay_effect: &mut Option<Effect>,
    overlay_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = overlay_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *overlay_process_time = Some(now);

    let effect = overlay_effect.get_or_insert_with(|| {
        fx::fade_from(theme.bg, theme.bg, (OVERLAY_FADE_MS, Interpolation::QuadOut))
    });
    frame.render_effect(effect, popup, TfxDuration::from_millis(delta_ms));
}
