pub mod driver;
pub mod mutation;
pub mod proximity;
