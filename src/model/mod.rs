pub mod payload;
pub mod raw;
pub mod row;

pub use payload::{Account, AccountRef, Identity, NamedRef, UpdatePayload};
pub use raw::RawRecord;
pub use row::{CellValue, RowRecord};
