//! Turning per-modality predictions into one identity decision.
//!
//! Two steps live here:
//!
//! 1. [`aggregate`]: the gesture classifier answers once per sensor row;
//!    the row labels are majority-voted into a single gesture decision with
//!    a frequency distribution over the identity set.
//! 2. [`fuse`]: the audio decision and the gesture decision are reconciled.
//!    Agreement is final as-is. On disagreement the winner is the identity
//!    with the highest joint probability `audio_dist[u] * gesture_dist[u]`
//!    (the two modalities are conditionally independent given identity:
//!    performing a gesture does not change how someone speaks, and the
//!    classifiers were trained separately).
//!
//! Every argmax here is stable: ascending label order, smallest label wins
//! ties.

mod aggregate;
mod error;
mod fuse;

pub use aggregate::aggregate;
pub use error::FusionError;
pub use fuse::{fuse, DecisionPath, FusionResult};
