//! Game engine: board, pieces, collision, line clears, scoring, progression.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Default playfield size in cells.
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// Gravity interval at level 1.
const BASE_DROP_MS: u64 = 1000;
/// Gravity never drops below this, no matter the level.
const MIN_DROP_MS: u64 = 50;
/// Speed-up per level.
const DROP_STEP_MS: u64 = 50;
/// A level lasts this many cleared lines.
pub const LINES_PER_LEVEL: u32 = 10;

/// Base score per lines-cleared-in-one-lock (index = rows), multiplied by level.
const LINE_SCORES: [u32; 5] = [0, 40, 100, 300, 1200];
/// Points per cell travelled during a hard drop.
const HARD_DROP_POINTS: u32 = 2;

/// Gravity interval for a level: 1000 ms at level 1, −50 ms per level, floor 50 ms.
pub fn drop_interval_for(level: u32) -> Duration {
    let step = DROP_STEP_MS.saturating_mul(u64::from(level.saturating_sub(1)));
    Duration::from_millis(BASE_DROP_MS.saturating_sub(step).max(MIN_DROP_MS))
}

/// Tetromino kinds (I, O, T, S, Z, J, L).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::S, Self::Z, Self::J, Self::L];

    /// Base shape as a square bitmask grid. I sits in a 4×4, O in a 2×2,
    /// the rest in 3×3 grids, so in-place 90° rotation needs no kick tables.
    pub fn shape(&self) -> Shape {
        let rows: &[&[u8]] = match self {
            Self::I => &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::T => &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]],
            Self::J => &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]],
            Self::L => &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]],
        };
        Shape::from_rows(rows)
    }

    /// Colour index 0..7 for theme.piece_color().
    pub fn color_index(&self) -> u8 {
        match self {
            Self::S => 0, // green
            Self::O => 1, // yellow
            Self::Z => 2, // red
            Self::J => 3, // blue
            Self::T => 4, // magenta
            Self::I => 5, // cyan
            Self::L => 6, // orange
        }
    }
}

/// Square occupancy grid of one piece in one orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    cells: Vec<Vec<bool>>,
}

impl Shape {
    fn from_rows(rows: &[&[u8]]) -> Self {
        Self {
            cells: rows
                .iter()
                .map(|row| row.iter().map(|&v| v != 0).collect())
                .collect(),
        }
    }

    /// Grid side length (shapes are always N×N).
    #[inline]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.cells[y][x]
    }

    /// Occupied cells as (x, y) within the grid.
    pub fn filled(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, set)| **set)
                .map(move |(x, _)| (x, y))
        })
    }

    /// Clockwise 90° rotation: rotated[j][N-1-i] = cells[i][j].
    pub fn rotated_cw(&self) -> Self {
        let n = self.size();
        let mut out = vec![vec![false; n]; n];
        for (i, row) in self.cells.iter().enumerate() {
            for (j, &set) in row.iter().enumerate() {
                out[j][n - 1 - i] = set;
            }
        }
        Self { cells: out }
    }
}

/// Single board cell: empty or locked with a colour index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Locked(u8),
}

/// Playfield of locked cells. y=0 is the top row.
#[derive(Debug, Clone)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    rows: Vec<Vec<Cell>>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: vec![vec![Cell::Empty; width]; height],
        }
    }

    /// Cell at (x, y). Out-of-bounds access is a caller bug and panics.
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.rows[y][x]
    }

    /// True if the shape at the given anchor hits a wall, the floor, or a
    /// locked cell. Cells above the top (y < 0) are allowed, so a freshly
    /// spawned piece may hang partly off-screen.
    pub fn collides(&self, shape: &Shape, x: i32, y: i32) -> bool {
        for (sx, sy) in shape.filled() {
            let bx = x + sx as i32;
            let by = y + sy as i32;
            if bx < 0 || bx >= self.width as i32 || by >= self.height as i32 {
                return true;
            }
            if by >= 0 && self.rows[by as usize][bx as usize] != Cell::Empty {
                return true;
            }
        }
        false
    }

    /// Write the shape into the board. Cells still above the top row are
    /// dropped silently; that overflow is what trips game over on the next
    /// spawn.
    pub fn lock(&mut self, shape: &Shape, x: i32, y: i32, color: u8) {
        for (sx, sy) in shape.filled() {
            let bx = x + sx as i32;
            let by = y + sy as i32;
            if by >= 0 && by < self.height as i32 && bx >= 0 && bx < self.width as i32 {
                self.rows[by as usize][bx as usize] = Cell::Locked(color);
            }
        }
    }

    /// Remove every full row, inserting empty rows at the top so everything
    /// above the void shifts down. Scans bottom-to-top and re-checks the same
    /// index after a removal, since the row shifted into place may itself be
    /// full. Returns the count and the row indices where clears happened.
    pub fn clear_full_rows(&mut self) -> (u32, Vec<usize>) {
        let mut cleared = 0u32;
        let mut hit_rows = Vec::new();
        let mut y = self.height;
        while y > 0 {
            y -= 1;
            if self.rows[y].iter().all(|cell| *cell != Cell::Empty) {
                self.rows.remove(y);
                self.rows.insert(0, vec![Cell::Empty; self.width]);
                cleared += 1;
                hit_rows.push(y);
                y += 1;
            }
        }
        (cleared, hit_rows)
    }
}

/// Source of spawned piece kinds. Swappable so tests run deterministic
/// sequences.
pub trait PieceSource {
    fn next(&mut self) -> PieceKind;
}

/// Uniform random kind per spawn (no bag fairness). Seedable for
/// reproducible games.
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceSource for RandomSource {
    fn next(&mut self) -> PieceKind {
        PieceKind::ALL[self.rng.gen_range(0..PieceKind::ALL.len())]
    }
}

/// Fixed cyclic sequence of kinds.
pub struct SequenceSource {
    kinds: Vec<PieceKind>,
    index: usize,
}

impl SequenceSource {
    pub fn new(kinds: Vec<PieceKind>) -> Self {
        Self { kinds, index: 0 }
    }
}

impl PieceSource for SequenceSource {
    fn next(&mut self) -> PieceKind {
        let kind = self.kinds[self.index % self.kinds.len()];
        self.index += 1;
        kind
    }
}

/// Active piece: current (possibly rotated) shape plus top-left anchor in
/// board space.
#[derive(Debug, Clone)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// Spawn position: horizontally centred by shape-grid width, at the top.
    fn spawned(kind: PieceKind, board_width: usize) -> Self {
        let shape = kind.shape();
        let x = (board_width / 2) as i32 - (shape.size() / 2) as i32;
        Self { kind, shape, x, y: 0 }
    }
}

/// Engine notifications, drained by collaborators (sound, fx) after each
/// command or tick. Purely observational; the engine never waits on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    Moved { horizontal: bool },
    Rotated,
    HardDropped { distance: u32 },
    LinesCleared { count: u32, rows: Vec<usize> },
    LevelUp(u32),
    Paused,
    Resumed,
    Restarted,
    GameOver,
}

/// Session progression: NotStarted → Running ⇄ Paused, Running → GameOver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    Paused,
    GameOver,
}

/// One owned game instance; all mutation flows through its command methods.
pub struct Game {
    pub board: Board,
    pub piece: Option<Piece>,
    pub next: PieceKind,
    pub score: u32,
    pub level: u32,
    pub lines_cleared: u32,
    pub phase: Phase,
    drop_interval: Duration,
    drop_timer: Duration,
    last_tick: Option<Instant>,
    source: Box<dyn PieceSource>,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(width: usize, height: usize, mut source: Box<dyn PieceSource>) -> Self {
        let next = source.next();
        Self {
            board: Board::new(width, height),
            piece: None,
            next,
            score: 0,
            level: 1,
            lines_cleared: 0,
            phase: Phase::NotStarted,
            drop_interval: drop_interval_for(1),
            drop_timer: Duration::ZERO,
            last_tick: None,
            source,
            events: Vec::new(),
        }
    }

    /// Current gravity interval (decreases with level, floored at 50 ms).
    pub fn drop_interval(&self) -> Duration {
        self.drop_interval
    }

    /// Take all pending notifications, leaving the queue empty.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin the session: only valid from NotStarted. Spawns the first piece.
    pub fn start(&mut self) {
        if self.phase != Phase::NotStarted {
            return;
        }
        self.phase = Phase::Running;
        self.events.push(GameEvent::Started);
        self.spawn();
    }

    /// Reset everything in memory and begin a fresh session. No-op before
    /// the first start.
    pub fn restart(&mut self) {
        if self.phase == Phase::NotStarted {
            return;
        }
        self.board = Board::new(self.board.width, self.board.height);
        self.score = 0;
        self.level = 1;
        self.lines_cleared = 0;
        self.drop_interval = drop_interval_for(1);
        self.drop_timer = Duration::ZERO;
        self.last_tick = None;
        self.next = self.source.next();
        self.phase = Phase::Running;
        self.events.push(GameEvent::Restarted);
        self.spawn();
    }

    /// Pause/resume. Valid while Running or Paused; ignored otherwise.
    pub fn toggle_pause(&mut self) {
        match self.phase {
            Phase::Running => {
                self.phase = Phase::Paused;
                self.events.push(GameEvent::Paused);
            }
            Phase::Paused => {
                self.phase = Phase::Running;
                self.events.push(GameEvent::Resumed);
            }
            Phase::NotStarted | Phase::GameOver => {}
        }
    }

    pub fn move_left(&mut self) -> bool {
        let moved = self.try_shift(-1, 0);
        if moved {
            self.events.push(GameEvent::Moved { horizontal: true });
        }
        moved
    }

    pub fn move_right(&mut self) -> bool {
        let moved = self.try_shift(1, 0);
        if moved {
            self.events.push(GameEvent::Moved { horizontal: true });
        }
        moved
    }

    /// Manual single-cell drop. Does not lock on failure; gravity handles
    /// lock-in.
    pub fn soft_drop(&mut self) -> bool {
        let moved = self.try_shift(0, 1);
        if moved {
            self.events.push(GameEvent::Moved { horizontal: false });
        }
        moved
    }

    /// Rotate the active piece 90° clockwise. Discarded when the rotated
    /// shape collides at the current anchor (no wall kicks).
    pub fn rotate(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        let Some(piece) = self.piece.as_mut() else {
            return false;
        };
        let rotated = piece.shape.rotated_cw();
        if self.board.collides(&rotated, piece.x, piece.y) {
            return false;
        }
        piece.shape = rotated;
        self.events.push(GameEvent::Rotated);
        true
    }

    /// Fall straight to the lowest legal position (2 points per cell), then
    /// lock immediately. Returns the distance travelled.
    pub fn hard_drop(&mut self) -> u32 {
        if self.phase != Phase::Running {
            return 0;
        }
        let Some(piece) = self.piece.as_mut() else {
            return 0;
        };
        let mut distance = 0u32;
        while !self.board.collides(&piece.shape, piece.x, piece.y + 1) {
            piece.y += 1;
            distance += 1;
        }
        self.score += HARD_DROP_POINTS * distance;
        self.events.push(GameEvent::HardDropped { distance });
        self.lock_in();
        distance
    }

    /// Anchor y of the active piece's resting position (ghost piece).
    pub fn drop_target(&self) -> Option<i32> {
        let piece = self.piece.as_ref()?;
        let mut y = piece.y;
        while !self.board.collides(&piece.shape, piece.x, y + 1) {
            y += 1;
        }
        Some(y)
    }

    /// Advance time. Accumulates the delta since the previous tick into the
    /// gravity timer; once it exceeds the drop interval the piece falls one
    /// cell (or locks). A zero delta never mutates anything.
    pub fn tick(&mut self, now: Instant) {
        let delta = self
            .last_tick
            .map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
        self.last_tick = Some(now);
        if self.phase != Phase::Running {
            return;
        }
        self.drop_timer += delta;
        if self.drop_timer > self.drop_interval {
            if !self.try_shift(0, 1) {
                self.lock_in();
            }
            self.drop_timer = Duration::ZERO;
        }
    }

    fn try_shift(&mut self, dx: i32, dy: i32) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        let Some(piece) = self.piece.as_mut() else {
            return false;
        };
        if self.board.collides(&piece.shape, piece.x + dx, piece.y + dy) {
            return false;
        }
        piece.x += dx;
        piece.y += dy;
        true
    }

    /// Freeze the active piece into the board, clear rows, score, respawn.
    /// Scoring uses the level in effect before this clear's level-up.
    fn lock_in(&mut self) {
        let Some(piece) = self.piece.take() else {
            return;
        };
        self.board
            .lock(&piece.shape, piece.x, piece.y, piece.kind.color_index());
        let (count, rows) = self.board.clear_full_rows();
        if count > 0 {
            self.lines_cleared += count;
            self.score += LINE_SCORES[count.min(4) as usize] * self.level;
            self.events.push(GameEvent::LinesCleared { count, rows });
            let level = self.lines_cleared / LINES_PER_LEVEL + 1;
            if level > self.level {
                self.level = level;
                self.drop_interval = drop_interval_for(level);
                self.events.push(GameEvent::LevelUp(level));
            }
        }
        self.spawn();
    }

    /// Promote the queued kind to the active piece and draw a new "next".
    /// A spawn that collides immediately is the terminal condition: the
    /// piece stays visible but the session flips to GameOver, with score
    /// and level untouched.
    fn spawn(&mut self) {
        let kind = self.next;
        self.next = self.source.next();
        let piece = Piece::spawned(kind, self.board.width);
        let blocked = self.board.collides(&piece.shape, piece.x, piece.y);
        self.piece = Some(piece);
        if blocked {
            self.phase = Phase::GameOver;
            self.events.push(GameEvent::GameOver);
        }
    }
}
