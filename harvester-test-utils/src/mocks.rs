//! Mock implementations for testing

mod sink;
mod source;
mod stage;

pub use sink::{Deliveries, Delivery, RecordingSink};
pub use source::ScriptedSource;
pub use stage::FailingStage;
