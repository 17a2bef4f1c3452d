pub mod cache;
pub mod db;
pub mod memory;
pub mod referraldb;
pub mod userdb;
