//! Layout and drawing: menu, playfield, ghost piece, next preview, stats, overlays.

use crate::app::Screen;
use crate::game::{Cell, Game, Phase, PieceKind};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each board cell is two terminal columns wide so cells render square-ish.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;

const SIDEBAR_WIDTH: u16 = 20;

/// Duration of the line-clear row flash in ms.
const LINE_CLEAR_FADE_MS: u32 = 400;

/// Playfield size in terminal cells (border + grid) for given board dimensions.
fn playfield_pixel_size(width: u16, height: u16) -> (u16, u16) {
    (width * CELL_WIDTH + 2, height * CELL_HEIGHT + 2)
}

/// Playfield inner rect (board only, no border); matches draw_game layout.
fn playfield_board_rect(area: Rect, game: &Game) -> Rect {
    let (pw, ph) = playfield_pixel_size(game.board.width as u16, game.board.height as u16);
    let total_w = pw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    let outer = Rect {
        x,
        y,
        width: pw.min(area.width),
        height: ph.min(area.height),
    };
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (game.board.width as u16 * CELL_WIDTH).min(outer.width.saturating_sub(2)),
        height: (game.board.height as u16 * CELL_HEIGHT).min(outer.height.saturating_sub(2)),
    }
}

/// Build set of buffer (x, y) positions covered by the cleared rows.
fn clearing_buffer_positions(board_rect: Rect, rows: &[usize]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &row in rows {
        let by = board_rect.y + (row as u16) * CELL_HEIGHT;
        if by >= board_rect.y + board_rect.height {
            continue;
        }
        for bx in board_rect.x..board_rect.x + board_rect.width {
            set.insert((bx, by));
        }
    }
    set
}

/// Create or update the line-clear flash and process it (fade the cleared rows
/// back to the board background).
fn apply_line_clear_effect(
    frame: &mut Frame,
    game: &Game,
    theme: &Theme,
    area: Rect,
    clear_rows: &[usize],
    line_clear_effect: &mut Option<Effect>,
    line_clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let board_rect = playfield_board_rect(area, game);
    let delta = line_clear_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *line_clear_process_time = Some(now);

    if line_clear_effect.is_none() {
        let clearing_set = clearing_buffer_positions(board_rect, clear_rows);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            clearing_set.contains(&(pos.x, pos.y))
        }));
        let bg = theme.bg;
        let effect = fx::fade_to(bg, bg, (LINE_CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board_rect);
        *line_clear_effect = Some(effect);
    }

    if let Some(effect) = line_clear_effect {
        frame.render_effect(effect, board_rect, tfx_delta);
    }
}

/// Draw current screen (menu, game, game over). During a line-clear flash the
/// fade effect is updated in place via `line_clear_effect` / `line_clear_process_time`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    game: &Game,
    theme: &Theme,
    area: Rect,
    clear_rows: &[usize],
    line_clear_effect: &mut Option<Effect>,
    line_clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    match screen {
        Screen::Menu => draw_menu(frame, theme, area),
        Screen::Playing => {
            draw_game(frame, game, theme, area);
            if game.phase == Phase::Paused {
                draw_pause_overlay(frame, theme, area);
            }
            if !clear_rows.is_empty() {
                apply_line_clear_effect(
                    frame,
                    game,
                    theme,
                    area,
                    clear_rows,
                    line_clear_effect,
                    line_clear_process_time,
                    now,
                );
            }
        }
        Screen::GameOver => {
            draw_game(frame, game, theme, area);
            draw_game_over(frame, game, theme, area);
        }
    }
}

fn draw_menu(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 46u16;
    let popup_h = 14u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    let title = Line::from(vec![
        Span::styled(" Tetrix ", Style::default().fg(theme.title).bold()),
        Span::styled(" tui ", Style::default().fg(theme.main_fg).bold()),
    ]);

    let key_style = Style::default().fg(theme.piece[3]);
    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ←/→ h/l ", key_style),
            Span::from("Move    "),
            Span::styled(" ↑ k ", key_style),
            Span::from("Rotate"),
        ]),
        Line::from(vec![
            Span::styled(" ↓ j ", key_style),
            Span::from("Soft drop    "),
            Span::styled(" Space ", key_style),
            Span::from("Hard drop"),
        ]),
        Line::from(vec![
            Span::styled(" P ", key_style),
            Span::from("Pause    "),
            Span::styled(" R ", key_style),
            Span::from("Restart"),
        ]),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            " Press ENTER to start ",
            Style::default().fg(Color::Black).bg(theme.title).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Q — quit ",
            Style::default().fg(theme.inactive_fg),
        )),
    ];

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) {
    let popup_w = 30u16;
    let popup_h = 10u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", game.score),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Level: {} ", game.level),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Lines: {} ", game.lines_cleared),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R — Restart    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(
                " Tetrixtui ",
                Style::default().fg(theme.title),
            )),
    );
    p.render(popup, frame.buffer_mut());
}

/// Draw game: playfield + sidebar; use full area and center the board.
fn draw_game(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) {
    let (pw, ph) = playfield_pixel_size(game.board.width as u16, game.board.height as u16);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);

    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);

    let (playfield_area, sidebar_area) = {
        let inner = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
            .split(vert[1]);
        (inner[0], inner[1])
    };

    draw_playfield(frame, game, theme, playfield_area);
    draw_sidebar(frame, game, theme, sidebar_area);
}

fn draw_playfield(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(
            " Tetrixtui ",
            Style::default().fg(theme.title),
        ));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let board_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: (game.board.width as u16 * CELL_WIDTH).min(inner.width),
        height: (game.board.height as u16 * CELL_HEIGHT).min(inner.height),
    };

    // Locked cells and background.
    for y in 0..game.board.height {
        for x in 0..game.board.width {
            let color = match game.board.cell(x, y) {
                Cell::Locked(i) => theme.piece_color(i),
                Cell::Empty => theme.bg,
            };
            put_cell(frame, board_rect, x as i32, y as i32, color);
        }
    }

    // Ghost piece, dimmed, under the active piece.
    if game.phase == Phase::Running || game.phase == Phase::Paused {
        if let (Some(piece), Some(ghost_y)) = (&game.piece, game.drop_target()) {
            if ghost_y != piece.y {
                for (sx, sy) in piece.shape.filled() {
                    put_cell(
                        frame,
                        board_rect,
                        piece.x + sx as i32,
                        ghost_y + sy as i32,
                        theme.inactive_fg,
                    );
                }
            }
        }
    }

    // Active piece on top.
    if let Some(piece) = &game.piece {
        let color = theme.piece_color(piece.kind.color_index());
        for (sx, sy) in piece.shape.filled() {
            put_cell(
                frame,
                board_rect,
                piece.x + sx as i32,
                piece.y + sy as i32,
                color,
            );
        }
    }
}

/// Paint one board cell (two terminal columns). Off-board cells are skipped,
/// which hides the above-top part of a freshly spawned piece.
fn put_cell(frame: &mut Frame, board_rect: Rect, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 {
        return;
    }
    let rx = board_rect.x + (x as u16) * CELL_WIDTH;
    let ry = board_rect.y + (y as u16) * CELL_HEIGHT;
    if rx + CELL_WIDTH > board_rect.x + board_rect.width || ry >= board_rect.y + board_rect.height {
        return;
    }
    let style = Style::default().fg(color).bg(color);
    frame.buffer_mut().set_string(rx, ry, "██", style);
}

fn draw_sidebar(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    // Free-floating sections with their own borders; vertical layout with gaps
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Next (border + title + preview)
            Constraint::Length(1), // gap
            Constraint::Length(5), // Stats (border + score, level, lines)
            Constraint::Length(1), // gap
            Constraint::Length(7), // Keys
        ])
        .split(area);

    // --- Next (own border) ---
    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    let next_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(4)])
        .split(next_inner);
    Paragraph::new(Line::from(Span::styled("Next", title_style)))
        .render(next_layout[0], frame.buffer_mut());
    draw_next_preview(frame, game.next, theme, next_layout[1]);

    // --- Stats (own border): Score, Level, Lines ---
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(game.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Level: ", title_style),
            Span::styled(game.level.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Lines: ", title_style),
            Span::styled(game.lines_cleared.to_string(), fg_style),
        ]),
    ];
    Paragraph::new(ratatui::text::Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    // --- Keys (own border) ---
    let keys_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let keys_inner = keys_block.inner(chunks[4]);
    keys_block.render(chunks[4], frame.buffer_mut());
    let help_style = Style::default().fg(theme.inactive_fg);
    let keys_lines = vec![
        Line::from(Span::styled("←/→  move", help_style)),
        Line::from(Span::styled("↑    rotate", help_style)),
        Line::from(Span::styled("↓    soft drop", help_style)),
        Line::from(Span::styled("␣    hard drop", help_style)),
        Line::from(Span::styled("p/q  pause/quit", help_style)),
    ];
    Paragraph::new(ratatui::text::Text::from(keys_lines)).render(keys_inner, frame.buffer_mut());
}

/// Draw the queued piece as a small block preview (actual shape).
fn draw_next_preview(frame: &mut Frame, kind: PieceKind, theme: &Theme, area: Rect) {
    let color = theme.piece_color(kind.color_index());
    let shape = kind.shape();
    let min_x = shape.filled().map(|(x, _)| x).min().unwrap_or(0);
    let max_x = shape.filled().map(|(x, _)| x).max().unwrap_or(0);
    let min_y = shape.filled().map(|(_, y)| y).min().unwrap_or(0);
    let max_y = shape.filled().map(|(_, y)| y).max().unwrap_or(0);

    let bw = (max_x - min_x + 1) as u16;
    let bh = (max_y - min_y + 1) as u16;
    let off_x = area.width.saturating_sub(bw * CELL_WIDTH) / 2;
    let off_y = area.height.saturating_sub(bh * CELL_HEIGHT) / 2;

    let style = Style::default().fg(color).bg(color);
    for (sx, sy) in shape.filled() {
        let rx = area.x + off_x + ((sx - min_x) as u16) * CELL_WIDTH;
        let ry = area.y + off_y + ((sy - min_y) as u16) * CELL_HEIGHT;
        if rx + CELL_WIDTH <= area.x + area.width && ry < area.y + area.height {
            frame.buffer_mut().set_string(rx, ry, "██", style);
        }
    }
}
