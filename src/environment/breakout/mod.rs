pub mod algebra_2d;
pub mod mechanics;
