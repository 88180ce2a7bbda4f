//! Race rules and track generation constants.

/// Maximum heading change per tick, in degrees.
pub const MAX_TURN_DEG: f64 = 18.0;

/// Velocity multiplier applied after displacement each tick.
pub const DRAG: f64 = 0.85;

/// A checkpoint counts as passed when the vehicle ends a tick this close to it.
pub const CHECKPOINT_RADIUS: f64 = 600.0;

/// Laps needed to finish a race unless overridden.
pub const DEFAULT_LAP_TARGET: u32 = 3;

/// Offline races give up after this many ticks.
pub const DEFAULT_TURN_CAP: u32 = 10_000;

// --- Track generation ---

pub const MAP_WIDTH: i32 = 16_000;
pub const MAP_HEIGHT: i32 = 9_000;

/// Keep checkpoints this far from the map border.
pub const TRACK_PADDING: i32 = 1_000;

/// Minimum distance between two generated checkpoints.
pub const MIN_CHECKPOINT_SPACING: f64 = 1_200.0;

/// Generated tracks have `[MIN_CHECKPOINTS, MAX_CHECKPOINTS_EXCLUSIVE)` checkpoints.
pub const MIN_CHECKPOINTS: i32 = 5;
pub const MAX_CHECKPOINTS_EXCLUSIVE: i32 = 10;

/// Rejection-sampling attempts per checkpoint before settling for a tighter spot.
pub const PLACEMENT_ATTEMPTS: u32 = 10_000;

// --- State hashing ---

pub const STATE_HASH_SEED: u64 = 17;
pub const STATE_HASH_MULTIPLIER: u64 = 31;
