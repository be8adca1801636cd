//! Safe teleportation.
//!
//! A spot is safe when a player can stand in it: two breathable blocks (transparent or
//! liquid) on top of a solid one. The search only ever moves vertically, so the column
//! of the requested location is kept.

use crate::host::World;
use crate::types::{Dimension, Location, PlayerId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Highest Y probed in dimensions with a bedrock roof.
pub const NETHER_CEILING: i32 = 125;

/// The lowest Y the downward probe may reach, exclusive.
const FLOOR: i32 = 1;

pub struct SafeSpotLocator {
    world: Arc<dyn World>,
}

impl SafeSpotLocator {
    pub fn new(world: Arc<dyn World>) -> Self {
        Self { world }
    }

    pub fn is_safe(&self, location: &Location) -> bool {
        let pos = location.block();
        let dimension = location.dimension;

        self.world.material_at(dimension, pos).is_passable()
            && self.world.material_at(dimension, pos.above()).is_passable()
            && self.world.material_at(dimension, pos.below()).is_solid()
    }

    /// Probes the column around `origin`, one block up then one block down at each step.
    ///
    /// Returns the first safe location found, or `None` once both directions ran out of
    /// world.
    pub fn find_safe(&self, origin: &Location, search_up: bool, search_down: bool) -> Option<Location> {
        let ceiling = self.ceiling(origin.dimension);
        if ceiling < FLOOR {
            return None;
        }
        let start = origin.block().y.clamp(0, ceiling);

        let mut up = start;
        let mut down = start;
        while (search_down && down >= FLOOR) || (search_up && up <= ceiling) {
            if search_up && up < ceiling && self.is_safe_at(origin, up) {
                return Some(origin.at_height(up));
            }
            // Offset zero was already covered by the upward probe.
            let checked_by_up = search_up && up == down;
            if search_down && down > FLOOR && !checked_by_up && self.is_safe_at(origin, down) {
                return Some(origin.at_height(down));
            }
            up += 1;
            down -= 1;
        }

        None
    }

    /// Teleports a player to `location`, or to the nearest safe spot in its column.
    ///
    /// With `force`, an unsafe location is used as-is when nothing safe was found.
    /// Returns where the player was sent, or `None` if they were not moved.
    pub fn safe_teleport(&self, player: PlayerId, location: Location, force: bool) -> Option<Location> {
        let target = if self.is_safe(&location) {
            location
        } else if let Some(spot) = self.find_safe(&location, true, true) {
            debug!(%player, from = %location, to = %spot, "relocated to safe spot");
            spot
        } else if force {
            warn!(%player, %location, "no safe spot, forcing teleport");
            location
        } else {
            debug!(%player, %location, "no safe spot, teleport cancelled");
            return None;
        };

        if self.world.teleport(player, target) {
            Some(target)
        } else {
            warn!(%player, %target, "host refused teleport");
            None
        }
    }

    fn ceiling(&self, dimension: Dimension) -> i32 {
        if dimension.has_roof() {
            NETHER_CEILING
        } else {
            self.world.max_height(dimension) - 2
        }
    }

    fn is_safe_at(&self, origin: &Location, y: i32) -> bool {
        self.is_safe(&origin.at_height(y))
    }
}
