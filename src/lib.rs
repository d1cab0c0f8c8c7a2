//! # Turbine
//!
//! Filesystem-backed time-series storage. Data lives as timestamped
//! folders and files so it can be shared, synced, and inspected with
//! ordinary file tools.
//!
//! ## Features
//!
//! - **Zipped blocks**: each flush packs its samples into one zip archive
//! - **Sample packing**: fixed-width channels concatenate per block
//! - **Ring-buffer retention**: old blocks trimmed on a time horizon
//! - **Pluggable transport**: blocks stream through a `BlobSink`
//!
//! ## Modules
//!
//! - [`storage`]: Writer/Reader pair over the timestamped folder tree
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use turbine::storage::{Mode, Reader, Writer, WriterConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WriterConfig {
//!         packed: true,
//!         auto_flush_ms: 1000,
//!         ..WriterConfig::default()
//!     };
//!     let mut writer = Writer::new("./data", "sensors", config)?;
//!     writer.put_data("temp.f32", 21.5f32)?;
//!     writer.close()?;
//!
//!     let reader = Reader::new("./data");
//!     let temps = reader.get_data("sensors", "temp.f32", 0.0, 60.0, Mode::Newest)?;
//!     println!("latest: {:?}", temps.as_f32());
//!
//!     Ok(())
//! }
//! ```

pub mod storage;

// Re-export top-level types for convenience
pub use storage::{
    BlobSink, ByteOrder, ChannelData, ChannelMap, ChannelType, LocalSink, Mode, PutValue, Reader,
    SpacingPolicy, StorageError, StorageResult, Writer, WriterConfig,
};
