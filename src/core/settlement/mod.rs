mod firestore;
mod log_sink;
mod recorder;
mod sink;

pub use firestore::FirestoreSettlementSink;
pub use log_sink::LogSettlementSink;
pub use recorder::SettlementRecorder;
pub use sink::{SettlementError, SettlementSink};
