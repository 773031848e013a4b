//! Match detection - runs of three, power-up expansion and shape classification
//!
//! A scan works in four steps:
//!
//! 1. **Color bomb seeding** (only for the scan that directly follows a swap): a swapped
//!    color bomb matches itself plus every piece sharing its partner's tag.
//! 2. **Adjacency**: every piece whose left and right neighbors (or down and up
//!    neighbors) share its tag flags all three. Edge cells only get the checks that fit.
//! 3. **Expansion**: matched bombs pull in more cells (row, column, 3x3). Newly pulled
//!    bombs expand too; the set only grows and is bounded by the board, so it terminates.
//! 4. **Classification** of the set for power-up creation. Pieces pulled in only by
//!    color bomb seeding are not part of any shape.

use arrayvec::ArrayVec;

use crate::grid::Grid;
use crate::types::{Coord, Direction, MatchShape, PowerUp, Tag};

/// The swap that started the current resolution cycle.
///
/// After the swap the primary piece sits at `target` and the partner at `origin`;
/// pieces are tracked by identity because cascades move them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapContext {
    pub origin: Coord,
    pub target: Coord,
    pub primary_id: u32,
    pub partner_id: u32,
    pub swipe_angle: f32,
}

/// Deduplicated matched cells in discovery order, plus their classification
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchSet {
    pub cells: Vec<Coord>,
    pub shape: MatchShape,
    /// Tag of the piece that decided the shape
    pub tag: Option<Tag>,
}

impl MatchSet {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, at: Coord) -> bool {
        self.cells.contains(&at)
    }

    /// Drop a cell from the set. Returns whether it was present.
    pub fn remove(&mut self, at: Coord) -> bool {
        match self.cells.iter().position(|&c| c == at) {
            Some(i) => {
                self.cells.remove(i);
                true
            }
            None => false,
        }
    }
}

/// Collects coordinates once each, in insertion order
struct Collector {
    seen: Vec<bool>,
    cells: Vec<Coord>,
}

impl Collector {
    fn new(grid: &Grid) -> Self {
        Self {
            seen: vec![false; grid.width() * grid.height()],
            cells: Vec::new(),
        }
    }

    fn add(&mut self, grid: &Grid, at: Coord) {
        if grid.piece(at).is_none() {
            return;
        }
        if let Ok(idx) = grid.index(at) {
            if !self.seen[idx] {
                self.seen[idx] = true;
                self.cells.push(at);
            }
        }
    }
}

/// Scan the board, flag matched pieces and return the match set.
///
/// `swap` is only given for the scan right after a player swap; cascade passes scan
/// without it.
pub fn scan(grid: &mut Grid, swap: Option<&SwapContext>) -> MatchSet {
    grid.clear_matched_flags();
    let mut found = Collector::new(grid);

    if let Some(ctx) = swap {
        seed_color_bombs(grid, ctx, &mut found);
    }
    let seeded = found.cells.len();
    let mut in_run = vec![false; found.seen.len()];

    for at in grid.coords() {
        let Some(tag) = grid.piece(at).and_then(|p| p.match_tag()) else {
            continue;
        };
        for (a, b) in straddling_pairs(grid, at) {
            if same_tag(grid, a, tag) && same_tag(grid, b, tag) {
                for c in [at, a, b] {
                    found.add(grid, c);
                    if let Ok(idx) = grid.index(c) {
                        in_run[idx] = true;
                    }
                }
            }
        }
    }

    expand(grid, &mut found);

    for &at in &found.cells {
        if let Some(piece) = grid.piece_mut(at) {
            piece.matched = true;
        }
    }

    let shaped: Vec<Coord> = found
        .cells
        .iter()
        .enumerate()
        .filter(|&(i, &at)| i >= seeded || grid.index(at).is_ok_and(|idx| in_run[idx]))
        .map(|(_, &at)| at)
        .collect();
    let (shape, tag) = classify(grid, &shaped);
    MatchSet {
        cells: found.cells,
        shape,
        tag,
    }
}

fn seed_color_bombs(grid: &Grid, ctx: &SwapContext, found: &mut Collector) {
    let (Some(primary_at), Some(partner_at)) =
        (grid.find_piece(ctx.primary_id), grid.find_piece(ctx.partner_id))
    else {
        return;
    };
    let (Some(primary), Some(partner)) = (grid.piece(primary_at), grid.piece(partner_at)) else {
        return;
    };
    let primary_bomb = primary.power == PowerUp::ColorBomb;
    let partner_bomb = partner.power == PowerUp::ColorBomb;

    let color = match (primary_bomb, partner_bomb) {
        (true, true) => {
            for at in grid.coords() {
                found.add(grid, at);
            }
            return;
        }
        (true, false) => {
            found.add(grid, primary_at);
            partner.tag
        }
        (false, true) => {
            found.add(grid, partner_at);
            primary.tag
        }
        (false, false) => return,
    };
    for at in grid.coords() {
        if grid.piece(at).and_then(|p| p.match_tag()) == Some(color) {
            found.add(grid, at);
        }
    }
}

/// Neighbor pairs that, together with `at`, form a straight line of three.
fn straddling_pairs(grid: &Grid, at: Coord) -> ArrayVec<(Coord, Coord), 2> {
    let mut pairs = ArrayVec::new();
    if at.col > 0 && at.col + 1 < grid.width() {
        pairs.push((
            Coord::new(at.col - 1, at.row),
            Coord::new(at.col + 1, at.row),
        ));
    }
    if at.row > 0 && at.row + 1 < grid.height() {
        pairs.push((
            Coord::new(at.col, at.row - 1),
            Coord::new(at.col, at.row + 1),
        ));
    }
    pairs
}

fn same_tag(grid: &Grid, at: Coord, tag: Tag) -> bool {
    grid.piece(at).and_then(|p| p.match_tag()) == Some(tag)
}

/// Worklist over the set: each matched bomb adds its area, to a fixed point.
fn expand(grid: &Grid, found: &mut Collector) {
    let mut i = 0;
    while i < found.cells.len() {
        let at = found.cells[i];
        i += 1;
        let Some(piece) = grid.piece(at) else {
            continue;
        };
        match piece.power {
            PowerUp::RowBomb => {
                for col in 0..grid.width() {
                    found.add(grid, Coord::new(col, at.row));
                }
            }
            PowerUp::ColumnBomb => {
                for row in 0..grid.height() {
                    found.add(grid, Coord::new(at.col, row));
                }
            }
            PowerUp::AdjacentBomb => {
                for near in neighborhood(grid, at) {
                    found.add(grid, near);
                }
            }
            PowerUp::ColorBomb | PowerUp::None => {}
        }
    }
}

/// The 3x3 block centered on `at`, clipped to the board
pub fn neighborhood(grid: &Grid, at: Coord) -> ArrayVec<Coord, 9> {
    let mut out = ArrayVec::new();
    for col in at.col.saturating_sub(1)..=(at.col + 1) {
        for row in at.row.saturating_sub(1)..=(at.row + 1) {
            let c = Coord::new(col, row);
            if grid.contains(c) {
                out.push(c);
            }
        }
    }
    out
}

/// Classify a set by counting, for each member, the other same-tag members sharing
/// its column and its row. The first member that satisfies a rule decides.
pub fn classify(grid: &Grid, cells: &[Coord]) -> (MatchShape, Option<Tag>) {
    for &at in cells {
        let Some(tag) = grid.piece(at).and_then(|p| p.match_tag()) else {
            continue;
        };
        let mut column = 0usize;
        let mut row = 0usize;
        for &other in cells {
            if other == at || grid.piece(other).and_then(|p| p.match_tag()) != Some(tag) {
                continue;
            }
            if other.col == at.col {
                column += 1;
            }
            if other.row == at.row {
                row += 1;
            }
        }
        if column >= 4 || row >= 4 {
            return (MatchShape::LongLine, Some(tag));
        }
        if column == 2 && row == 2 {
            return (MatchShape::Corner, Some(tag));
        }
        if column == 3 || row == 3 {
            return (MatchShape::Line, Some(tag));
        }
    }
    (MatchShape::None, None)
}

/// Would a piece of `tag` at `at` complete a run of three with the pieces already
/// around it? Checks both sides and the straddling pair on each axis.
pub fn creates_match_at(grid: &Grid, at: Coord, tag: Tag) -> bool {
    let line = |dir: Direction, n: usize| -> Option<Coord> {
        let mut c = at;
        for _ in 0..n {
            c = c.step(dir)?;
        }
        grid.contains(c).then_some(c)
    };
    let is = |c: Option<Coord>| c.is_some_and(|c| same_tag(grid, c, tag));

    for (back, fwd) in [
        (Direction::Left, Direction::Right),
        (Direction::Down, Direction::Up),
    ] {
        if is(line(back, 1)) && is(line(back, 2)) {
            return true;
        }
        if is(line(fwd, 1)) && is(line(fwd, 2)) {
            return true;
        }
        if is(line(back, 1)) && is(line(fwd, 1)) {
            return true;
        }
    }
    false
}

/// Any straight run of three on the board (no flags touched)
pub fn has_any_run(grid: &Grid) -> bool {
    runs_with(grid, None)
}

/// Would exchanging the pieces at `a` and `b` leave a run of three on the board?
/// The grid is not modified.
pub fn swap_makes_run(grid: &Grid, a: Coord, b: Coord) -> bool {
    runs_with(grid, Some((a, b)))
}

fn runs_with(grid: &Grid, swapped: Option<(Coord, Coord)>) -> bool {
    let tag_at = |at: Coord| -> Option<Tag> {
        let src = match swapped {
            Some((a, b)) if at == a => b,
            Some((a, b)) if at == b => a,
            _ => at,
        };
        grid.piece(src).and_then(|p| p.match_tag())
    };
    grid.coords().any(|at| {
        let Some(tag) = tag_at(at) else {
            return false;
        };
        straddling_pairs(grid, at)
            .into_iter()
            .any(|(a, b)| tag_at(a) == Some(tag) && tag_at(b) == Some(tag))
    })
}
