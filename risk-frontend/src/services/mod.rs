pub mod aggregator;
pub mod assessment;
pub mod catalog;
pub mod display;
pub mod metrics;
pub mod validator;

pub use assessment::{assess, AssessmentError};
pub use metrics::{get_metrics, init_metrics};
