//! Query engine: dispatch, update coalescing, merging and refresh

pub mod batch;
pub mod coalescer;
pub mod dispatcher;
pub mod merge;
pub mod refresher;

pub use batch::{EngineEvent, ResultBatch, RoundCompletion};
pub use coalescer::{CoalescerHandle, FatalHook, UpdateCoalescer};
pub use dispatcher::{ProgressState, QueryDispatcher, ResultsUpdater, RoundHandle};
pub use merge::{
    DisplayEntry, DisplaySnapshot, MergeSettings, ResultMergeEngine, MAX_NATURAL_SCORE,
    RESULT_LIST_MARGIN, TOP_MOST_SCORE,
};
pub use refresher::ResultRefresher;

#[cfg(test)]
mod tests;
