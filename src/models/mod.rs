pub mod endpoint;
pub mod envelope;
pub mod result;

pub use endpoint::{EndpointSpec, ExportFormat, HttpMethod, Shape, Surface, XLSX_MIME};
pub use envelope::{Envelope, UNAUTHORIZED};
pub use result::{TestResult, Verdict};
