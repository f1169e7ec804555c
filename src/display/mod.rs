//! 展示引擎 - 候选缓冲区、展示状态机与渲染帧

pub mod buffer;
pub mod frame;
pub mod machine;

pub use buffer::NotificationBuffer;
pub use frame::{Frame, ResolvedMedia};
pub use machine::{
    DisplayMachine, DisplayState, DisplayStatus, Effect, Event, MachineConfig,
    DEFAULT_CONFIRMATION_DWELL, DEFAULT_SLOW_PULL_THRESHOLD,
};
