pub mod mutation;
pub mod proximity;
pub mod status;
