pub mod component;
pub mod fip;
pub mod stack;
pub mod trust;
pub mod volume;
