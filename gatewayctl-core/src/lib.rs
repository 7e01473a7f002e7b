pub mod config;
pub mod error;
pub mod model;

pub use config::GatewayCtlConfig;
pub use error::{CoreError, FieldError};
pub use model::{
    ApiConfiguration, AuditEvent, AuditOperation, AuditStatus, HttpMethod, Operation,
    RecordStatus, StoredRecord, Upstream,
};
