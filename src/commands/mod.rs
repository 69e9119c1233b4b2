pub mod peek;
pub mod scan;
