pub mod diary;
pub mod post;
pub mod quest;
pub mod shop;
pub mod user;
