pub mod pomodoro;
pub mod scheduler;
