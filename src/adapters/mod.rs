pub mod pdf;
pub mod spreadsheet;
pub mod storage;

pub use storage::LocalStorage;
