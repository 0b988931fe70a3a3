// riskgate: policy calibration for risk-based authentication.
//
// This is the library root. `policy` is the decision core (evaluator and
// threshold optimizer); the other modules are the collaborators around it:
// live scoring, artifact persistence, retrain history, terminal output.

pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod policy;
pub mod scoring;
pub mod status;
pub mod store;

pub use error::PolicyError;
