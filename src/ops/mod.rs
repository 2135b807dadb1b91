//! Run orchestration: reconciliation, the download pipeline, and the
//! top-level sync flow.

pub mod fetch;
pub mod reconcile;
pub mod sync;
