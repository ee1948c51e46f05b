pub mod loaders;
pub mod record;
pub mod signature;

pub use loaders::{load_records, RecordFilter};
pub use record::{Record, RecordSet, RecordSource};
pub use signature::{DetectionResult, ErrorSignature, SignaturePayload};
