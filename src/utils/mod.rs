pub mod db_utils;
pub mod demo_data;
