//! Domain models for StriveX.
//!
//! # Core Concepts
//!
//! ## Persistent Entities
//!
//! - [`HunterProfile`]: Level, XP toward the next level and lifetime XP, plus whatever the
//!   profile-setup flow stored alongside (name, height, weight, ...).
//! - [`WorkoutPlan`]: Which category is trained on each day of the week.
//! - [`Exercise`]: A sets x reps entry inside a category. Categories without user
//!   overrides fall back to the built-in defaults.
//! - [`CompletionRecord`]: Per-day sets of completed exercise instances. Only today's set
//!   decides whether a completion earns full or repeat XP.
//! - [`HydrationState`]: Daily hydration level and the streak that pays out bonus XP.
//!
//! ## Derived Views
//!
//! - [`ProfileView`]: A profile with its rank and level progress.
//! - [`TodaysQuest`]: Today's category with each exercise flagged as done or not.

mod completion;
mod exercise;
mod hydration;
mod plan;
mod profile;

pub use completion::*;
pub use exercise::*;
pub use hydration::*;
pub use plan::*;
pub use profile::*;
