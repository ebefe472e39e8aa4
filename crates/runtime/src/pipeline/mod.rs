//! Save and load pipelines.
//!
//! Each pipeline is a small state machine owned by the save manager worker.
//! The worker asks it for the next storage call with `next_step`, awaits the
//! returned future, and feeds the outcome back with `complete_step`. Only one
//! step is ever in flight, so storage calls happen strictly one after another.
//!
//! ```text
//! save: [ClearingSlot →] SavingFragment(i) → WritingHeader → Done
//! load: ReadingHeader → Enumerating → LoadingFragment(i) → Delivering
//! ```

use std::future::Future;
use std::pin::Pin;

mod listing;
mod load;
mod save;

pub use listing::{read_all_headers, read_header};
pub use load::{LoadOutcome, LoadPipeline, LoadStage, LoadStep};
pub use save::{SavePipeline, SaveStage, SaveStep};

/// A single storage call issued by a pipeline.
pub type StepFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
