pub mod requestbody;
pub mod response;

pub use requestbody::RequestBody;
pub use response::Response;
