pub mod analytics;
pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod receipt;
pub mod snapshot;

pub use analytics::{aggregate, AnalyticsSummary, AnalyticsWindow, BillTotal, SalesHistory};
pub use context::{ContextBundle, RecentBill};
pub use domain::bill::{Bill, BillId, BillItem, NewBill, SaleLine};
pub use domain::billing::{BillingLine, BillingProjection, BillingUpdate, ReplyKind};
pub use domain::inventory::{InventoryItem, ItemId};
pub use domain::owner::OwnerId;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use receipt::{Receipt, ReceiptLine};
pub use snapshot::{build_snapshot, SnapshotItem};
