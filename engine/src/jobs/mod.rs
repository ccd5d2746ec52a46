pub mod cancellation;
pub mod main_thread;
pub mod recurring_task;
