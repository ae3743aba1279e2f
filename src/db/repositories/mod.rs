pub mod ingredient;
pub mod membership;
pub mod recipe;
pub mod subscription;
pub mod tag;
pub mod user;
