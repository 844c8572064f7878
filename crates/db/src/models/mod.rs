pub mod fact;
pub mod post;
pub mod user_setting;
