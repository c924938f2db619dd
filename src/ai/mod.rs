//! 电脑对手（对战模式）。

pub mod machine;

pub use machine::{MachineMove, MachineOpponent};
