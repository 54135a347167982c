mod record;
mod record_type;

pub use record::{
    AddressRecord, CnameRecord, MxRecord, NaptrRecord, NsRecord, PtrRecord, QueryResult,
    SoaRecord, SrvRecord, TxtRecord,
};
pub use record_type::RecordType;
