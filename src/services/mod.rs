//! Business logic services layer

pub mod asset_service;
pub mod catalog_service;
pub mod history_service;
pub mod import_service;
pub mod report_service;
pub mod ticket_service;

pub use asset_service::AssetService;
pub use catalog_service::CatalogService;
pub use history_service::HistoryService;
pub use import_service::ImportService;
pub use report_service::ReportService;
pub use ticket_service::TicketService;
