/// Turns real time into simulation ticks at a fixed interval.
#[derive(Clone, Copy, Debug)]
pub struct TurnClock {
    seconds_per_turn: f32,
    elapsed: f32,
}

impl TurnClock {
    pub fn new(seconds_per_turn: f32) -> Self {
        Self {
            seconds_per_turn: seconds_per_turn.max(f32::EPSILON),
            elapsed: 0.0,
        }
    }

    pub fn seconds_per_turn(&self) -> f32 {
        self.seconds_per_turn
    }

    /// Adds `dt` seconds. Returns true when a turn is due; at most one turn
    /// fires per call and the remainder carries over.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);
        if self.elapsed < self.seconds_per_turn {
            return false;
        }
        self.elapsed = (self.elapsed - self.seconds_per_turn).min(self.seconds_per_turn);
        true
    }

    /// Progress towards the next turn in `0..1`, for interpolating animations.
    pub fn fraction(&self) -> f32 {
        (self.elapsed / self.seconds_per_turn).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}
