pub mod place_order;

pub use place_order::{PlaceOrder, PlaceOrderError, PlaceOrderInput, PlaceOrderOutput};
