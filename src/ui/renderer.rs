/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The scene is continuous (812×612 units by default), so every frame it is
/// projected onto the largest terminal area that keeps its aspect ratio,
/// assuming a terminal cell is twice as tall as it is wide.
///
/// Screen layout:
///   row 0          HUD (money, pause / gamepad indicators)
///   rows 1..=N     scene viewport (centered horizontally)
///   row N+1        message bar
///   row N+2        key help

use std::io::{self, BufWriter, Write};
use std::ops::Range;

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableFocusChange, EnableFocusChange, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Facing, PlayerStatus};
use crate::domain::geometry::{Rect, SceneBounds};
use crate::sim::world::WorldState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// On VTE-based terminals the inter-row gap pixels use the background
    /// color from the last Clear. Using the same RGB for `Clear` and every
    /// cell keeps those gaps invisible.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Replace the background of an existing cell, keeping its glyph.
    fn set_bg(&mut self, x: usize, y: usize, bg: Color) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x].bg = Cell::norm_bg(bg);
        }
    }

    fn fill_row(&mut self, y: usize, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', fg, bg));
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    /// Write a string centered within columns `[x0, x0 + width)`.
    fn put_centered(&mut self, x0: usize, width: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        self.put_str(x0 + width.saturating_sub(len) / 2, y, s, fg, bg);
    }
}

// ── Viewport: scene space → terminal grid ──

/// Where the scene lands on screen and how many scene units one cell covers.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Viewport {
    col0: usize,
    row0: usize,
    cols: usize,
    rows: usize,
    unit_w: f64,
    unit_h: f64,
}

impl Viewport {
    /// Fit the scene into `avail_cols × avail_rows` starting at `row0`,
    /// keeping the scene's aspect ratio with 1:2 cells.
    fn fit(scene: &SceneBounds, term_w: usize, row0: usize, avail_rows: usize) -> Viewport {
        let avail_cols = term_w.max(1);
        let avail_rows = avail_rows.max(1);
        let rows_at_full_width = (avail_cols as f64 * scene.height / (2.0 * scene.width)) as usize;
        let (cols, rows) = if rows_at_full_width <= avail_rows {
            (avail_cols, rows_at_full_width.max(1))
        } else {
            let cols = (avail_rows as f64 * 2.0 * scene.width / scene.height) as usize;
            (cols.clamp(1, avail_cols), avail_rows)
        };
        Viewport {
            col0: (avail_cols - cols) / 2,
            row0,
            cols,
            rows,
            unit_w: scene.width / cols as f64,
            unit_h: scene.height / rows as f64,
        }
    }

    fn col_of(&self, x: f64) -> usize {
        let c = (x / self.unit_w).floor().max(0.0) as usize;
        c.min(self.cols - 1)
    }

    fn row_of(&self, y: f64) -> usize {
        let r = (y / self.unit_h).floor().max(0.0) as usize;
        r.min(self.rows - 1)
    }

    /// Screen columns covered by `[left, right)`; at least one column.
    fn col_span(&self, left: f64, right: f64) -> Range<usize> {
        let start = self.col_of(left);
        let end = ((right / self.unit_w).ceil().max(0.0) as usize).clamp(start + 1, self.cols);
        self.col0 + start..self.col0 + end
    }

    /// Screen rows covered by `[top, bottom)`; at least one row.
    fn row_span(&self, top: f64, bottom: f64) -> Range<usize> {
        let start = self.row_of(top);
        let end = ((bottom / self.unit_h).ceil().max(0.0) as usize).clamp(start + 1, self.rows);
        self.row0 + start..self.row0 + end
    }

    fn rect_cells(&self, r: &Rect) -> (Range<usize>, Range<usize>) {
        (self.col_span(r.x, r.right()), self.row_span(r.y, r.bottom()))
    }
}

/// Money as shown on the HUD: rounded to cents, no trailing zeros.
fn format_money(money: f64) -> String {
    let cents = (money * 100.0).round() / 100.0;
    // Avoid printing "-0" once rounding swallows a tiny negative balance.
    let cents = if cents == 0.0 { 0.0 } else { cents };
    format!("{cents}")
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const SCENE_ROW: usize = 1;
/// Rows below the scene: message bar + help line.
const FOOTER_ROWS: usize = 2;

/// Height of the spike strips along the ceiling and the pit, in scene units.
const SPIKE_STRIP: f64 = 34.0;

// ── Palette ──

const SCENE_BG: Color = Color::Rgb { r: 30, g: 30, b: 46 };
const SHAFT_BG: Color = Color::Rgb { r: 44, g: 44, b: 62 };
const SHAFT_EDGE: Color = Color::Rgb { r: 90, g: 90, b: 110 };
const CAR_FG: Color = Color::Rgb { r: 200, g: 160, b: 80 };
const CAR_BG: Color = Color::Rgb { r: 110, g: 80, b: 30 };
const FLOOR_FG: Color = Color::Rgb { r: 160, g: 120, b: 80 };
const FLOOR_BG: Color = Color::Rgb { r: 90, g: 60, b: 35 };
const SPIKE_FG: Color = Color::Rgb { r: 200, g: 200, b: 210 };
const PLAYER_FG: Color = Color::Rgb { r: 255, g: 230, b: 80 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MONEY_FG: Color = Color::Rgb { r: 255, g: 255, b: 0 };
const DEAD_TINT: Color = Color::Rgb { r: 150, g: 20, b: 20 };
const BROKE_TINT: Color = Color::Rgb { r: 140, g: 125, b: 10 };
const WON_TINT: Color = Color::Rgb { r: 10, g: 110, b: 40 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_status: Option<PlayerStatus>,
    /// Terminal reports key Release events (keyboard enhancement pushed).
    pub key_release: bool,
    /// Shown on the HUD when a gamepad is connected.
    pub gamepad_connected: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_status: None,
            key_release: false,
            gamepad_connected: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableFocusChange,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.key_release = true;
        }
        log::info!("key release events: {}", if self.key_release { "on" } else { "timeout fallback" });

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            DisableFocusChange,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate()?;
        }

        // Overlays come and go with the status: repaint everything.
        let status = world.status();
        if self.last_status != Some(status) {
            self.invalidate()?;
            self.last_status = Some(status);
        }

        let avail_rows = self.term_h.saturating_sub(SCENE_ROW + FOOTER_ROWS);
        let vp = Viewport::fit(&world.scene, self.term_w, SCENE_ROW, avail_rows);

        self.front.clear();
        self.compose_scene(world, &vp);
        match status {
            PlayerStatus::Alive => self.compose_player(world, &vp),
            PlayerStatus::Dead => self.compose_outcome(&vp, DEAD_TINT, &[
                "You died. Somebody else's fault, surely.",
                "",
                "Good thing there's a CONTRACT.",
                "(Or at least you said there was.)",
            ]),
            PlayerStatus::Bankrupt => self.compose_outcome(&vp, BROKE_TINT, &[
                "Out of other people's money?",
                "",
                "Relax, there are always more investors.",
                "Spin them a story about the next contract.",
            ]),
            PlayerStatus::Won => self.compose_outcome(&vp, WON_TINT, &[
                "You made it to the top!",
                "",
                "Nobody up here wants to talk to you, though.",
                "Maybe they need a few more emails?",
            ]),
        }
        if !world.is_running() {
            self.compose_pause_overlay(world, &vp);
        }
        self.compose_hud(world);
        self.compose_footer(world, &vp);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // Do NOT use ResetColor here: the terminal default may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn fill(&mut self, cols: Range<usize>, rows: Range<usize>, cell: Cell) {
        for y in rows {
            for x in cols.clone() {
                self.front.set(x, y, cell);
            }
        }
    }

    /// Background, shafts, cars, floors, spikes, goal marker.
    fn compose_scene(&mut self, w: &WorldState, vp: &Viewport) {
        let all_cols = vp.col0..vp.col0 + vp.cols;
        let all_rows = vp.row0..vp.row0 + vp.rows;
        self.fill(all_cols.clone(), all_rows.clone(), Cell::from_char(' ', Color::White, SCENE_BG));

        for e in &w.elevators {
            let (cols, rows) = vp.rect_cells(&e.shaft);
            self.fill(cols.clone(), rows.clone(), Cell::from_char(' ', Color::White, SHAFT_BG));
            let edge = Cell::from_char('│', SHAFT_EDGE, SHAFT_BG);
            for y in rows {
                self.front.set(cols.start, y, edge);
                self.front.set(cols.end - 1, y, edge);
            }
        }

        for e in &w.elevators {
            let (cols, rows) = vp.rect_cells(&e.car);
            self.fill(cols.clone(), rows.clone(), Cell::from_char('▒', CAR_FG, CAR_BG));
            let rim = Cell::from_char('═', CAR_FG, CAR_BG);
            self.fill(cols.clone(), rows.start..rows.start + 1, rim);
            self.fill(cols, rows.end - 1..rows.end, rim);
        }

        for f in &w.floors {
            let (cols, rows) = vp.rect_cells(&f.rect);
            self.fill(cols, rows, Cell::from_char('▓', FLOOR_FG, FLOOR_BG));
        }

        let width = w.scene.width;
        let height = w.scene.height;
        let ceiling = vp.row_span(0.0, SPIKE_STRIP.min(height));
        self.fill(all_cols.clone(), ceiling.start..ceiling.start + 1, Cell::from_char('▼', SPIKE_FG, SCENE_BG));
        let pit = vp.row_span((height - SPIKE_STRIP).max(0.0), height);
        self.fill(all_cols, pit.end - 1..pit.end, Cell::from_char('▲', SPIKE_FG, SCENE_BG));

        // Goal marker: far end of the goal band, just above its floor line.
        let flag_col = vp.col0 + vp.col_of(width - 1.0);
        let flag_row = vp.row0 + vp.row_of((w.goal.bottom - 1.0).max(0.0));
        self.front.set(flag_col, flag_row, Cell::from_char('⚑', Color::Rgb { r: 80, g: 255, b: 80 }, SCENE_BG));
    }

    fn compose_player(&mut self, w: &WorldState, vp: &Viewport) {
        let p = &w.player;
        let glyph = match (p.facing, p.is_jumping) {
            (Facing::Right, false) => '►',
            (Facing::Left, false) => '◄',
            (Facing::Right, true) => '↗',
            (Facing::Left, true) => '↖',
        };
        let (cols, rows) = vp.rect_cells(&p.rect());
        self.overlay(cols.clone(), rows.start..rows.start + 1, '●', PLAYER_FG);
        self.overlay(cols, rows.start + 1..rows.end, glyph, PLAYER_FG);
    }

    /// Draw `ch` over already composed cells, keeping their background.
    fn overlay(&mut self, cols: Range<usize>, rows: Range<usize>, ch: char, fg: Color) {
        for y in rows {
            for x in cols.clone() {
                let bg = self.front.get(x, y).bg;
                self.front.set(x, y, Cell::from_char(ch, fg, bg));
            }
        }
    }

    /// Tint the scene and print the outcome text with the retry hint.
    fn compose_outcome(&mut self, vp: &Viewport, tint: Color, lines: &[&str]) {
        for y in vp.row0..vp.row0 + vp.rows {
            for x in vp.col0..vp.col0 + vp.cols {
                self.front.set_bg(x, y, tint);
            }
        }

        let top = vp.row0 + vp.rows.saturating_sub(lines.len() + 3) / 2;
        for (i, line) in lines.iter().enumerate() {
            self.front.put_centered(vp.col0, vp.cols, top + i, line, Color::White, tint);
        }
        self.front.put_centered(
            vp.col0, vp.cols, top + lines.len() + 2,
            "Press SPACE to try again", Color::Rgb { r: 255, g: 255, b: 200 }, tint,
        );
    }

    fn compose_pause_overlay(&mut self, w: &WorldState, vp: &Viewport) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let desc = Color::Rgb { r: 180, g: 180, b: 180 };

        let box_w = 30_usize.min(vp.cols);
        let box_h = 5_usize.min(vp.rows);
        let box_x = vp.col0 + (vp.cols - box_w) / 2;
        let box_y = vp.row0 + (vp.rows - box_h) / 2;
        self.fill(box_x..box_x + box_w, box_y..box_y + box_h, Cell::from_char(' ', Color::Reset, dim));

        let (title, hint) = if w.focused {
            ("║  PAUSED  ║", "F1 Resume   Q Quit")
        } else {
            ("║  WINDOW INACTIVE  ║", "Click back in to resume")
        };
        self.front.put_centered(box_x, box_w, box_y + 1, title, hdr, dim);
        self.front.put_centered(box_x, box_w, box_y + 3, hint, desc, dim);
    }

    fn compose_hud(&mut self, w: &WorldState) {
        self.front.fill_row(HUD_ROW, Color::White, HUD_BG);
        let money = format!("OTHER PEOPLE'S MONEY: ${}", format_money(w.player.money));
        self.front.put_centered(0, self.front.width, HUD_ROW, &money, MONEY_FG, HUD_BG);

        let mut flags = String::new();
        if self.gamepad_connected { flags.push_str(" [PAD]"); }
        if w.paused { flags.push_str(" [PAUSED]"); }
        self.front.put_str(0, HUD_ROW, &flags, Color::Rgb { r: 150, g: 150, b: 200 }, HUD_BG);
    }

    fn compose_footer(&mut self, w: &WorldState, vp: &Viewport) {
        let msg_row = vp.row0 + vp.rows;
        if !w.message.is_empty() {
            let bar = Color::Rgb { r: 200, g: 180, b: 50 };
            self.front.fill_row(msg_row, Color::Black, bar);
            self.front.put_str(1, msg_row, &w.message, Color::Black, bar);
        }

        let help = " A/D:Walk  W:Jump  SPACE:Action  F1:Pause  Q:Quit";
        self.front.put_str(0, msg_row + 1, help, Color::DarkGrey, Color::Reset);
    }
}
