pub mod account_service;
pub mod inventory_service;
pub mod redemption_service;

pub use account_service::AccountService;
pub use inventory_service::InventoryService;
pub use redemption_service::RedemptionService;
