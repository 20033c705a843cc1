//! multistart — random-restart policy around the simplex optimizer.
//!
//! - [`seeding`]: start-vector samplers (`StartSampler`, `UnimodalStart`).
//! - [`driver`]: the bounded restart loop and its outcome type.

pub mod driver;
pub mod seeding;

pub use self::driver::{MultiStartOptions, MultiStartOutcome, RunSummary, multistart_maximize};
pub use self::seeding::{StartSampler, StartShape, UnimodalStart};
