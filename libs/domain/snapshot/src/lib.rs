// [libs/domain/snapshot/src/lib.rs]
//! Usage Snapshot Worker.

pub mod worker;

pub use worker::{SnapshotBatchReport, UsageSnapshotWorker};
