//! A growable byte buffer and a self-describing value tree.
//!
//! [`ByteBuffer`] is a producer/consumer byte region with a write cursor and a
//! read cursor, typed stores and bounds-checked consumes in either byte order.
//! [`Value`] is a dynamically-typed tree of scalars, strings, byte arrays and
//! ordered maps (which double as arrays). Trees move between forms through
//! three codecs:
//!
//! - [`binary`]: compact tagged encoding into a [`ByteBuffer`], lossless.
//! - [`json`]: text in both directions; numbers read back as
//!   [`Value::Numeric`].
//! - [`xml`]: one-way rendering for inspection.
//!
//! ```rust
//! use iodict::{ByteBuffer, Value};
//!
//! let doc = Value::from_json(r#"{"a":1,"b":[true,null,"x"]}"#).unwrap();
//!
//! let mut buf = ByteBuffer::new();
//! doc.to_binary(&mut buf).unwrap();
//! let back = Value::from_binary(&mut buf).unwrap();
//!
//! assert_eq!(back, doc);
//! assert_eq!(back.to_json(), r#"{"a":1,"b":[true,null,"x"]}"#);
//! ```
//!
//! The crate logs through the [`log`] facade and never installs a logger.

#![allow(missing_docs)]

mod buffer;
mod error;
mod map;
mod options;
mod value;

pub mod binary;
pub mod json;
pub mod xml;

#[cfg(any(test, feature = "serde"))]
mod serde_impl;

#[cfg(test)]
mod tests;

pub use binary::BINARY_FORMAT_VERSION;
pub use buffer::ByteBuffer;
pub use error::{CorruptData, Error, ParseError, Result, SyntaxError};
pub use map::Map;
pub use options::{BinaryOptions, BufferOptions, JsonOptions};
pub use value::{Value, ValueType};
