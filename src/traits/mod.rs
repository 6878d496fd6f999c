mod builder;
mod connector;
mod transport;

pub use builder::QueryBuilder;
pub use connector::{NativeConnector, NativeError, NativeRecord, NativeSession};
pub use transport::{Auth, HttpRequest, HttpResponse, HttpTransport, Method};
