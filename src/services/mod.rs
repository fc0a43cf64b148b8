pub mod calendar;
pub mod history;
pub mod inflight;
pub mod insights;
pub mod quests;
pub mod sentiment;
pub mod session;
