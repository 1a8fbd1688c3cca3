pub mod istanbul;
pub mod jest;
