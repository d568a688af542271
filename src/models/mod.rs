pub mod category;
pub mod entry;
pub mod template;
pub mod user;
