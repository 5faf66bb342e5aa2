pub mod audit_logs;
pub mod products;
pub mod reviews;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use users::Entity as Users;
