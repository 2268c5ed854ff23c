// Core modules implementing schema unification, value codecs, and columnar I/O.
pub mod columnar;
pub mod error;
pub mod hex;
pub mod message_type;
pub mod options;
pub mod orc_io;
pub mod parquet_io;
pub mod pipeline;
pub mod row;
pub mod schema;
pub mod sql_scan;
pub mod struct_type;
pub mod temporal;
pub mod value;
