pub mod linear_range;
