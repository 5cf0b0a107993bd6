pub mod employee;
pub mod time_record;
