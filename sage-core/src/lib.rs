pub mod constant;
pub mod cv;
pub mod error;
pub mod im;
pub mod pr;
pub mod sg;
pub mod ut;
