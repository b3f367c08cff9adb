pub mod decision;

pub use decision::{normalize, ControlState, DecisionEngine, MoveAction};
