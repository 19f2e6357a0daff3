pub mod currency;
pub mod kuflow;
