//! Identity classifiers behind a uniform prediction contract.
//!
//! Two pretrained models drive identification: a linear scorer over audio
//! feature vectors and a decision-tree ensemble over gesture feature rows.
//! Call sites never see the model internals; they hold an
//! `Arc<dyn `[`Classifier`]`>` loaded once at start-up from a binary
//! artifact and treated as immutable from then on.
//!
//! # Loading
//!
//! ```no_run
//! use fuseid_classifier::ModelSet;
//!
//! let models = ModelSet::load("audio.fuseid".as_ref(), "gesture.fuseid".as_ref())?;
//! let label = models.audio.predict_one(&vec![0.0; models.audio.dimension()])?;
//! # Ok::<(), fuseid_classifier::ModelError>(())
//! ```

mod artifact;
mod error;
mod forest;
mod identity;
mod linear;
mod model;

pub use artifact::{decode_artifact, encode_artifact, load_classifier, ModelArtifact, ModelKind, ModelSet};
pub use error::ModelError;
pub use forest::{ForestModel, Node, Tree};
pub use identity::{IdentityDistribution, IDENTITY_COUNT, IDENTITY_LABELS};
pub use linear::LinearModel;
pub use model::Classifier;
