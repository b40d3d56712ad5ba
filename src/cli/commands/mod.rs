pub mod db;
pub mod password;
pub mod reset_key;
