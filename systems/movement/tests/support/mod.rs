use droidworks_core::{EntityId, Footprint, Location, MovementIntent, Terrain};
use droidworks_system_movement::{Body, Mover};

/// Walled rectangle with optional interior rocks.
pub struct Walled {
    pub width: u32,
    pub height: u32,
    pub rocks: Vec<Location>,
}

impl Walled {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rocks: Vec::new(),
        }
    }
}

impl Terrain for Walled {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_passable(&self, location: Location) -> bool {
        let (Ok(x), Ok(y)) = (u32::try_from(location.x), u32::try_from(location.y)) else {
            return false;
        };
        if x >= self.width || y >= self.height {
            return false;
        }
        let border = x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1;
        !border && !self.rocks.contains(&location)
    }
}

pub fn body(id: &str, x: i32, y: i32) -> Body {
    Body {
        id: EntityId::new(id),
        location: Location::new(x, y),
        footprint: Footprint::UNIT,
    }
}

pub fn mover(body: &Body, priority: i32, dx: i32, dy: i32) -> Mover {
    Mover {
        body: body.clone(),
        priority,
        intent: MovementIntent::unchecked(dx, dy),
    }
}
