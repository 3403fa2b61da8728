pub mod init;
pub mod user;
