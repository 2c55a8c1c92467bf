pub mod request;
pub mod response;

pub use request::{Method, RpcRequest};
pub use response::{Envelope, ResponseEncoder, RpcResult};
