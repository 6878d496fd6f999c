mod in_memory_test;
mod native;
mod reqwest_transport;
mod rest;

pub use self::in_memory_test::{InMemoryConnector, InMemoryTransport, RecordedFind};
pub use self::native::NativeDriver;
pub use self::reqwest_transport::ReqwestTransport;
pub use self::rest::RestDriver;
