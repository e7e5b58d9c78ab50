//! Timed playback of step producers
//!
//! A step producer ([`StepSource`]) yields [`Step`]s one at a time. The
//! [`StepExecutor`] pulls one step per tick, resolves the comment to show
//! and notifies an [`AnimationObserver`]. The delay between ticks comes from
//! a [`TempoSource`] and is re-read before every step.
//!
//! ```text
//!            load          start              exhausted
//!   Idle ----------> Ready ------> Running -------------> Done
//!    ^                               |  ^
//!    |          clear / error        |  | toggle_pause
//!    +-------------------------------+  v
//!                                  Paused
//! ```

pub mod executor;
pub mod observer;
pub mod step;
pub mod tempo;

pub use executor::{ActiveFunction, AnimationState, StepExecutor, PAUSE_POLL_MS};
pub use observer::{AnimationObserver, NullObserver, PlaybackEvent, StepLog};
pub use step::{PlainSteps, Step, StepSource};
pub use tempo::{FixedTempo, SharedTempo, TempoSource, DEFAULT_STEP_DELAY_MS};
