pub mod generate;
pub mod load;
pub mod nn;
pub mod preprocess;
