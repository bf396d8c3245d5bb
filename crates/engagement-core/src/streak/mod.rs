mod calendar;
mod freeze;
mod milestone;
mod repair;
mod tracker;

pub use calendar::{month_calendar, CalendarDay, DayMark, MonthCalendar};
pub use freeze::FreezePolicy;
pub use milestone::{
    Milestone, MilestoneClaim, MilestoneReward, MilestoneStatus, MilestoneTable, MilestoneView,
};
pub use repair::{repair, repair_status, RepairPayment, RepairPolicy, RepairResult, RepairStatus};
pub use tracker::{StreakEvaluation, StreakOutcome, StreakState, StreakStatus};
