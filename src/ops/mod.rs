pub mod classify;
pub mod search;
pub mod suggest;
pub mod summary;
pub mod task_ops;
