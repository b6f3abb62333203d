//! Symbol walk and dead code classification

mod cancel;
mod classify;
mod finding;
mod progress;
mod walker;

pub use cancel::CancelFlag;
pub use classify::{Classifier, Visit};
pub use finding::{Finding, ScanOutcome};
pub use progress::{BarProgress, ScanProgress, SilentProgress};
pub use walker::Scanner;
