mod regen;

pub use regen::{
    PoolStatus, RefillPolicy, ResourceState, SpendOutcome, DEFAULT_MAX_COUNT,
    DEFAULT_REGEN_INTERVAL_MS,
};
