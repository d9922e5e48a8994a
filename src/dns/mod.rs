pub mod edns;
pub mod enums;
pub mod header;
pub mod name;
pub mod packet;
pub mod question;
pub mod query;
pub mod records;
pub mod response;

pub use enums::{Opcode, RecordClass, RecordType, ResponseCode};
pub use name::Name;
pub use packet::{Message, RawRecord};
pub use query::Query;
pub use records::{Answer, RecordData, Records};
pub use response::Response;
