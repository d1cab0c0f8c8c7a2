//! Block-building writer
//!
//! Puts accumulate in memory under a Block opened at the first put time.
//! `flush` closes the Block and hands its bytes to the sink as either a
//! zip archive (optionally gzip-wrapped) or a folder of Point files.
//! Optional features layered on the same path: sample packing, auto-flush
//! on a time interval, auto-segmenting every N blocks, and ring-buffer
//! trim of expired data.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::sink::{BlobSink, LocalSink};
use crate::storage::types::{
    block_time_from_name, ms_to_secs, now_ms, secs_to_ms, ByteOrder, ChannelType, PutValue,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Write as _};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writer options. Defaults: zipped blocks, deflate level 1, streamed
/// (unpacked) points, little-endian, no auto-flush, no segments, no trim.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Pack each Block into a single zip archive
    pub zip: bool,
    /// Gzip-wrap the zip archive (`.zip.gz`); implies `zip`
    pub gzip: bool,
    /// Deflate level 0-9; 0 stores entries uncompressed
    pub compression_level: u32,
    /// Concatenate fixed-width samples per channel per Block
    pub packed: bool,
    /// Byte order for binary sample encoding
    pub byte_order: ByteOrder,
    /// Auto-flush when a put arrives this long after the last flush
    /// (milliseconds, 0 = manual flush only)
    pub auto_flush_ms: i64,
    /// Start a new Segment every this many Blocks (0 = no segments)
    pub blocks_per_segment: u64,
    /// Delete data older than this many seconds at each flush (0 = keep all)
    pub trim_horizon_secs: f64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            zip: true,
            gzip: false,
            compression_level: 1,
            packed: false,
            byte_order: ByteOrder::default(),
            auto_flush_ms: 0,
            blocks_per_segment: 0,
            trim_horizon_secs: 0.0,
        }
    }
}

// per-channel packed-mode accumulation
#[derive(Default)]
struct PackedChannel {
    bytes: Vec<u8>,
    end_time: i64,
}

/// Append-oriented writer for one source
pub struct Writer {
    sink: Box<dyn BlobSink>,
    // set for local sinks, enables ring-buffer trim
    source_dir: Option<PathBuf>,
    source: String,
    config: WriterConfig,

    // pending put time set by set_time, None means wall clock per put
    put_time: Option<i64>,
    // time of the most recent put
    point_time: Option<i64>,
    // open time of the Block under construction
    block_time: Option<i64>,
    prev_block_time: Option<i64>,
    segment_time: Option<i64>,
    block_count: u64,
    last_flush_time: Option<i64>,

    // queued (point_time, channel, bytes) entries for the current Block
    entries: Vec<(i64, String, Vec<u8>)>,
    packed: BTreeMap<String, PackedChannel>,
    closed: bool,
}

impl Writer {
    /// Writer backed by local disk under `root/source`
    pub fn new(
        root: impl Into<PathBuf>,
        source: &str,
        config: WriterConfig,
    ) -> StorageResult<Self> {
        let root = root.into();
        let source_dir = root.join(source);
        let sink = Box::new(LocalSink::new(root));
        Self::build(sink, Some(source_dir), source, config)
    }

    /// Writer over an arbitrary sink (FTP, HTTP, test capture).
    /// Trim needs local storage and is refused here.
    pub fn with_sink(
        sink: Box<dyn BlobSink>,
        source: &str,
        config: WriterConfig,
    ) -> StorageResult<Self> {
        if config.trim_horizon_secs > 0.0 {
            return Err(StorageError::Config(
                "ring-buffer trim requires a local sink".to_string(),
            ));
        }
        Self::build(sink, None, source, config)
    }

    fn build(
        sink: Box<dyn BlobSink>,
        source_dir: Option<PathBuf>,
        source: &str,
        mut config: WriterConfig,
    ) -> StorageResult<Self> {
        if source.is_empty() || source.starts_with('/') || source.contains("..") {
            return Err(StorageError::Config(format!(
                "invalid source name: {:?}",
                source
            )));
        }
        if config.compression_level > 9 {
            return Err(StorageError::Config(format!(
                "compression level {} out of range 0-9",
                config.compression_level
            )));
        }
        if config.gzip || config.packed {
            // both only make sense over zip archives
            config.zip = true;
        }
        Ok(Self {
            sink,
            source_dir,
            source: source.to_string(),
            config,
            put_time: None,
            point_time: None,
            block_time: None,
            prev_block_time: None,
            segment_time: None,
            block_count: 0,
            last_flush_time: None,
            entries: Vec::new(),
            packed: BTreeMap::new(),
            closed: false,
        })
    }

    /// Set the time stamp, in seconds, for subsequent puts
    pub fn set_time(&mut self, secs: f64) {
        self.set_time_ms(secs_to_ms(secs));
    }

    /// Set the time stamp, in epoch milliseconds, for subsequent puts
    pub fn set_time_ms(&mut self, ms: i64) {
        self.put_time = Some(ms);
        if self.block_time.is_none() {
            self.block_time = Some(ms);
        }
    }

    /// Queue one sample on the named channel.
    ///
    /// The channel-name suffix picks the encoding: binary numeric suffixes
    /// take fixed-width words, numeric-string and text channels take
    /// decimal strings, everything else passes bytes through intact. In
    /// packed mode an unsuffixed channel fed a typed numeric gains the
    /// value's suffix; a channel whose suffix contradicts the value type
    /// drops that sample with a warning instead of corrupting the block.
    pub fn put_data(&mut self, name: &str, value: impl Into<PutValue>) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        let value = value.into();

        let time = self.put_time.unwrap_or_else(now_ms);
        match self.last_flush_time {
            None => self.last_flush_time = Some(time),
            Some(last) => {
                if self.config.auto_flush_ms > 0 && time - last >= self.config.auto_flush_ms {
                    debug!(time, "auto-flush");
                    self.flush()?;
                }
            }
        }
        self.point_time = Some(time);
        if self.block_time.is_none() {
            self.block_time = Some(time);
        }

        let (channel, bytes) = match self.encode_value(name, &value) {
            Some(enc) => enc,
            None => return Ok(()), // dropped, already warned
        };

        // fixed-width and numeric-string samples concatenate per channel in
        // packed mode; opaque binary stays one Point per put
        let ctype = ChannelType::from_name(&channel);
        let packable = ctype.word_size() > 1 || ctype.is_numeric_string();
        if self.config.packed && packable {
            let slot = self.packed.entry(channel).or_default();
            slot.bytes.extend_from_slice(&bytes);
            slot.end_time = time;
            return Ok(());
        }

        self.write_point(time, &channel, bytes)
    }

    // Resolve the effective channel name and payload for one put.
    // None means the sample was dropped as unencodable.
    fn encode_value(&self, name: &str, value: &PutValue) -> Option<(String, Vec<u8>)> {
        let ctype = ChannelType::from_name(name);
        match value {
            PutValue::Bytes(b) => Some((name.to_string(), b.clone())),
            PutValue::Text(s) => {
                if self.config.packed && ctype.is_numeric_string() {
                    Some((name.to_string(), format!("{},", s).into_bytes()))
                } else {
                    Some((name.to_string(), s.clone().into_bytes()))
                }
            }
            v => {
                let suffix = v.suffix().unwrap_or_default();
                if name.ends_with(suffix) {
                    // matching suffix: fixed-width binary
                    return Some((name.to_string(), v.encode(self.config.byte_order)?));
                }
                if ctype.is_numeric_string() || ctype == ChannelType::Text {
                    if self.config.packed && !ctype.is_numeric_string() {
                        // packed put on an unsuffixed channel adopts the
                        // value's suffix so samples stay fixed-width
                        let channel = format!("{}{}", name, suffix);
                        return Some((channel, v.encode(self.config.byte_order)?));
                    }
                    let s = v.to_decimal_string()?;
                    if self.config.packed {
                        return Some((name.to_string(), format!("{},", s).into_bytes()));
                    }
                    return Some((name.to_string(), s.into_bytes()));
                }
                // suffix contradicts the value type (e.g. f64 into .i32)
                warn!(channel = name, value = ?v, "value type contradicts channel suffix, dropped");
                None
            }
        }
    }

    // queue one Point, maintaining block/segment bookkeeping
    fn write_point(&mut self, time: i64, name: &str, bytes: Vec<u8>) -> StorageResult<()> {
        let block_time = match self.block_time {
            Some(bt) => bt,
            None => {
                self.block_time = Some(time);
                time
            }
        };
        if time < block_time {
            warn!(time, block_time, channel = name, "point predates its block, dropped");
            return Ok(());
        }

        if self.prev_block_time != Some(block_time) {
            if self.config.blocks_per_segment > 0
                && self.block_count % self.config.blocks_per_segment == 0
            {
                self.segment_time = Some(block_time);
            }
            self.prev_block_time = Some(block_time);
            self.block_count += 1;
        }

        self.entries.push((time, name.to_string(), bytes));
        Ok(())
    }

    /// Close the current Block and write it through the sink.
    /// A flush with nothing queued writes nothing.
    pub fn flush(&mut self) -> StorageResult<()> {
        // drain packed accumulations, stamped with per-channel end times
        let packed = std::mem::take(&mut self.packed);
        for (name, chan) in packed {
            self.write_point(chan.end_time, &name, chan.bytes)?;
        }

        if !self.entries.is_empty() {
            let block_time = self.block_time.unwrap_or(0);
            let base = match self.segment_time {
                Some(seg) => format!("{}/{}/{}", self.source, seg, block_time),
                None => format!("{}/{}", self.source, block_time),
            };
            let entries = std::mem::take(&mut self.entries);

            if self.config.zip {
                let bytes = self.build_zip(&entries)?;
                if self.config.gzip {
                    let mut enc =
                        GzEncoder::new(Vec::new(), Compression::new(self.config.compression_level));
                    enc.write_all(&bytes)?;
                    self.sink.write(&format!("{}.zip.gz", base), &enc.finish()?)?;
                } else {
                    self.sink.write(&format!("{}.zip", base), &bytes)?;
                }
            } else {
                for (time, name, bytes) in &entries {
                    self.sink
                        .write(&format!("{}/{}/{}", base, time, name), bytes)?;
                }
            }
            debug!(block = %base, entries = entries.len(), "flushed block");
        }

        if self.config.trim_horizon_secs > 0.0 {
            if let Some(bt) = self.block_time {
                self.trim_older_than(ms_to_secs(bt) - self.config.trim_horizon_secs)?;
            }
        }

        self.last_flush_time = self.point_time;
        // packed interpolation spans the block open to its end time, so the
        // next block opens where this one ended; streamed blocks open at
        // their next put
        self.block_time = if self.config.packed {
            self.point_time
        } else {
            None
        };
        Ok(())
    }

    /// Flush, then open the next Block at the just-closed Block's end time
    /// even in streamed mode
    pub fn flush_gapless(&mut self) -> StorageResult<()> {
        self.flush()?;
        self.block_time = self.point_time;
        Ok(())
    }

    /// Delete this source's data older than `oldest_secs` (epoch seconds).
    /// Deletion granularity is the Point; emptied folders are pruned.
    pub fn trim_older_than(&mut self, oldest_secs: f64) -> StorageResult<()> {
        let dir = self.source_dir.clone().ok_or_else(|| {
            StorageError::Config("ring-buffer trim requires a local sink".to_string())
        })?;
        if !dir.is_dir() {
            return Ok(());
        }
        let oldest_ms = secs_to_ms(oldest_secs);
        debug!(oldest_ms, "trimming");
        delete_old_times(&dir, oldest_ms)?;
        Ok(())
    }

    /// Flush pending data and refuse further puts
    pub fn close(&mut self) -> StorageResult<()> {
        if self.closed {
            return Ok(());
        }
        self.flush()?;
        self.closed = true;
        Ok(())
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        // no implicit flush: dropping an open writer loses queued data
        if !self.closed && (!self.entries.is_empty() || !self.packed.is_empty()) {
            warn!(
                source = %self.source,
                pending = self.entries.len() + self.packed.len(),
                "writer dropped without close, unflushed data discarded"
            );
        }
    }
}

// Delete files whose nearest time-named path component is older than
// oldest_ms, then prune emptied folders bottom-up.
fn delete_old_times(dir: &Path, oldest_ms: i64) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            delete_old_times(&path, oldest_ms)?;
            if fs::read_dir(&path)?.next().is_none() {
                fs::remove_dir(&path)?;
            }
        } else if let Some(t) = path_time(&path) {
            if t < oldest_ms {
                fs::remove_file(&path)?;
            }
        }
    }
    Ok(())
}

// Time of a file: its own name if time-named, else the nearest
// time-named ancestor folder (channel files inherit their Point time).
fn path_time(path: &Path) -> Option<i64> {
    for part in path.ancestors() {
        if let Some(name) = part.file_name().and_then(|n| n.to_str()) {
            if let Some(t) = block_time_from_name(name) {
                return Some(t);
            }
        }
    }
    None
}

impl Writer {
    fn build_zip(&self, entries: &[(i64, String, Vec<u8>)]) -> StorageResult<Vec<u8>> {
        let mut zw = ZipWriter::new(Cursor::new(Vec::new()));
        let options = if self.config.compression_level == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.config.compression_level as i64))
        };
        for (time, name, bytes) in entries {
            zw.start_file(format!("{}/{}", time, name), options)?;
            zw.write_all(bytes)?;
        }
        let cursor = zw.finish()?;
        Ok(cursor.into_inner())
    }
}
