pub mod dev_token;
pub mod health;
