pub mod kind;

pub use tokcas_error::{Error, ErrorKind};
