/// Position of a fully open curtain.
pub const FULLY_OPEN: i32 = 0;

/// Position of a fully closed curtain.
pub const FULLY_CLOSED: i32 = 100;

/// How targets outside `FULLY_OPEN..=FULLY_CLOSED` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Travel {
    /// Targets are limited to the curtain's range of travel.
    #[default]
    Clamped,
    /// Any target is accepted and the curtain travels past its end stops.
    Unbounded,
}

impl Travel {
    pub fn limit(&self, position: i32) -> i32 {
        match self {
            Travel::Clamped => position.clamp(FULLY_OPEN, FULLY_CLOSED),
            Travel::Unbounded => position,
        }
    }
}

pub fn is_within(position: i32) -> bool {
    (FULLY_OPEN..=FULLY_CLOSED).contains(&position)
}
