//! Power-up creation from a classified match set
//!
//! At most one piece is upgraded per pass. The upgraded piece leaves the match set and
//! loses its matched flag before the destroy phase, so it survives the pass that
//! created it.

use crate::grid::Grid;
use crate::matcher::{MatchSet, SwapContext};
use crate::types::{Coord, MatchShape, PowerUp, POWER_UP_MIN_MATCH};

/// A power-up granted during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upgrade {
    pub at: Coord,
    pub piece_id: u32,
    pub power: PowerUp,
}

/// Wrap an angle in degrees into (-180, 180].
fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Horizontal swipes: (-45, 45], (135, 180] and [-180, -135).
pub fn is_horizontal_swipe(angle: f32) -> bool {
    let a = normalize_angle(angle);
    (a > -45.0 && a <= 45.0) || a > 135.0 || (a >= -180.0 && a < -135.0)
}

/// Power-up for a shape, if any
pub fn power_for(shape: MatchShape, swipe_angle: f32) -> Option<PowerUp> {
    match shape {
        MatchShape::LongLine => Some(PowerUp::ColorBomb),
        MatchShape::Corner => Some(PowerUp::AdjacentBomb),
        MatchShape::Line if is_horizontal_swipe(swipe_angle) => Some(PowerUp::RowBomb),
        MatchShape::Line => Some(PowerUp::ColumnBomb),
        MatchShape::None => None,
    }
}

/// Upgrade the primary swapped piece, else its partner, when the set is large enough.
///
/// A candidate must still be on the board, be part of the set, carry the set's
/// dominant tag and have no power-up yet.
pub fn classify_and_upgrade(
    grid: &mut Grid,
    set: &mut MatchSet,
    swap: &SwapContext,
) -> Option<Upgrade> {
    if set.len() < POWER_UP_MIN_MATCH {
        return None;
    }
    let power = power_for(set.shape, swap.swipe_angle)?;
    let tag = set.tag?;

    for id in [swap.primary_id, swap.partner_id] {
        let Some(at) = grid.find_piece(id) else {
            continue;
        };
        if !set.contains(at) {
            continue;
        }
        let Some(piece) = grid.piece_mut(at) else {
            continue;
        };
        if !piece.matched || piece.match_tag() != Some(tag) || piece.power.is_some() {
            continue;
        }
        piece.matched = false;
        piece.power = power;
        set.remove(at);
        return Some(Upgrade {
            at,
            piece_id: id,
            power,
        });
    }
    None
}
