pub mod admission;
pub mod connections;
pub mod identity;
