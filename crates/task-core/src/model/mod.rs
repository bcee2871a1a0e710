pub mod id;
pub mod task;

pub use task::{ParseStatusError, Status, Task, TaskUpdate};
