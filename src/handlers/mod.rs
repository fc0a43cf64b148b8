pub mod diaries;
pub mod health;
pub mod insights;
pub mod posts;
pub mod quests;
pub mod shop;
pub mod users;
pub mod ws;
