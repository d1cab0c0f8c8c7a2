//! Turbine Storage Engine
//!
//! This module provides the folder-tree time-series storage functionality:
//!
//! - **types**: Core types (channel suffix table, time parsing, query modes)
//! - **sink**: Blob transport abstraction (local disk and beyond)
//! - **writer**: Block-building writer (zip/gzip, packing, segments, trim)
//! - **reader**: Folder-tree query reader
//! - **channel_map**: Named collection of per-channel results
//! - **channel_data**: One channel's time/byte sample arrays
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   put_data → Block accumulation → flush → zip/folder → BlobSink
//!
//! Read Path:
//!   get_data → scan time-named folders → unzip Blocks → trim window
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use turbine::storage::{Mode, Reader, Writer, WriterConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Write a short i32 series
//!     let mut writer = Writer::new("./data", "demo", WriterConfig::default())?;
//!     for i in 0..10 {
//!         writer.set_time(i as f64);
//!         writer.put_data("count.i32", i)?;
//!     }
//!     writer.close()?;
//!
//!     // Read it back
//!     let reader = Reader::new("./data");
//!     let data = reader.get_data("demo", "count.i32", 0.0, 10.0, Mode::Absolute)?;
//!     println!("got {} samples", data.size());
//!
//!     Ok(())
//! }
//! ```

pub mod channel_data;
pub mod channel_map;
pub mod error;
pub mod reader;
pub mod sink;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use channel_data::ChannelData;
pub use channel_map::ChannelMap;
pub use error::{StorageError, StorageResult};
pub use reader::Reader;
pub use sink::{BlobSink, LocalSink};
pub use types::{ByteOrder, ChannelType, Mode, PutValue, SpacingPolicy};
pub use writer::{Writer, WriterConfig};
