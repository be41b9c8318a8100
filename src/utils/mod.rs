pub mod natural_order;

pub use natural_order::natural_cmp;
