// [libs/infra/db/src/repositories/mod.rs]
pub mod cycle_repository;
pub mod invoice_repository;
pub mod job_lease_repository;
pub mod price_repository;
pub mod rating_result_repository;
pub mod subscription_repository;
pub mod usage_event_repository;

pub use cycle_repository::PgCycleRepository;
pub use invoice_repository::PgInvoiceRepository;
pub use job_lease_repository::PgJobLeaseRepository;
pub use price_repository::{PgMeterRepository, PgPriceRepository};
pub use rating_result_repository::PgRatingResultRepository;
pub use subscription_repository::PgSubscriptionRepository;
pub use usage_event_repository::PgUsageEventRepository;
