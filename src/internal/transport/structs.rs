pub mod http_transport;
pub mod http_transport_config;
pub mod multipart_form;
pub mod transport_error;

pub use http_transport::{HttpTransport, HttpTransportBuilder};
pub use http_transport_config::HttpTransportConfig;
pub use multipart_form::MultipartForm;
pub use transport_error::TransportError;
