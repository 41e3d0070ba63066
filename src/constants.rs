// Clue selection constants
pub const CONFIDENCE_COMPLETION_THRESHOLD: u32 = 100;
pub const FALSE_POSITIVE_THRESHOLD: u32 = 80;
pub const SELECTION_SHORTLIST_SIZE: usize = 3;
pub const MAX_SELECTION_ITERATIONS: u32 = 50; // Safety limit

// Need lifecycle constants
pub const MAX_SECONDARY_NEEDS: usize = 2;
pub const SECONDARY_CHANGE_CHANCE: f64 = 0.2;
pub const SECONDARY_REPLACE_CHANCE: f64 = 0.5;

// Toxicity constants
pub const TOXICITY_CAPACITY_MIN: u32 = 80;
pub const TOXICITY_CAPACITY_MAX: u32 = 120;
pub const WEAKNESS_MULTIPLIER: f64 = 1.5;

// Pulse-reading stage thresholds (fraction of toxicity capacity)
pub const TOXICITY_STAGE_FAINT: f64 = 0.25;
pub const TOXICITY_STAGE_ACCUMULATING: f64 = 0.50;
pub const TOXICITY_STAGE_DEEP: f64 = 0.75;

// Satisfaction scoring constants
pub const BENEFIT_MULTIPLIER: f64 = 1.2;
pub const PRIMARY_NEED_WEIGHT: u32 = 2;
pub const SECONDARY_NEED_WEIGHT: u32 = 1;
pub const HIGH_SATISFACTION_RATIO: f64 = 0.8;
pub const LOW_SATISFACTION_RATIO: f64 = 0.4;

// Remedy batch constants
pub const MAX_REMEDIES_PER_TREATMENT: usize = 3;

// Save system constants
pub const SAVE_VERSION_MAGIC: u64 = 0x434C_494E_4943_0000; // "CLINIC\0\0"
pub const SNAPSHOT_VERSION: u32 = 1;
