pub mod login;
pub mod token;
pub mod user;
