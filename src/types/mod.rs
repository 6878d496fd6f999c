mod record;
mod value;

pub use record::{FieldData, InsertData, Record};
pub use value::{FieldValue, FieldValues};
