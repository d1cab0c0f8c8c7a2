//! Folder-tree query reader
//!
//! Reads the block tree the Writer lays down: time-named Segment and
//! Block folders under a source, zip or folder Blocks, Point folders of
//! channel files inside. The reader holds no state between calls; every
//! query re-scans the folder names it needs, so it sees other writers'
//! flushes immediately.
//!
//! Folder names sort numerically, never lexicographically. A gather
//! starts from the last Block at-or-before the window start (that Block
//! can hold packed samples reaching into the window) and walks forward
//! until Blocks open past the window end.

use crate::storage::channel_data::ChannelData;
use crate::storage::channel_map::ChannelMap;
use crate::storage::error::StorageResult;
use crate::storage::types::{
    block_time_from_name, ms_to_secs, parse_time_name, secs_to_ms, ByteOrder, ChannelType, Mode,
    SpacingPolicy,
};
use flate2::read::GzDecoder;
use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

// micro-second nudge keeping "after" queries strictly forward-progressing
const AFTER_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Folder,
    Zip,
    GzipZip,
}

#[derive(Debug, Clone)]
struct BlockRef {
    time_ms: i64,
    path: PathBuf,
    kind: BlockKind,
}

/// Read-only query interface over a data root folder
pub struct Reader {
    root: PathBuf,
    spacing: SpacingPolicy,
    byte_order: ByteOrder,
}

impl Reader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            spacing: SpacingPolicy::default(),
            byte_order: ByteOrder::default(),
        }
    }

    /// Fallback spacing rule for packed Points without a usable interval
    pub fn with_spacing(mut self, spacing: SpacingPolicy) -> Self {
        self.spacing = spacing;
        self
    }

    /// Byte order assumed when decoding binary samples
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Point at a different data root
    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = root.into();
    }

    /// Source names under the root, nested paths joined with `/`.
    /// A folder is a source once it holds time-named children.
    pub fn list_sources(&self) -> StorageResult<Vec<String>> {
        let mut out = Vec::new();
        if self.root.is_dir() {
            scan_sources(&self.root, "", &mut out)?;
        }
        out.sort();
        Ok(out)
    }

    /// Unique channel names across all of a source's Blocks
    pub fn list_channels(&self, source: &str) -> StorageResult<Vec<String>> {
        let mut names = BTreeSet::new();
        for block in self.collect_blocks(source)? {
            match block_channels(&block) {
                Ok(chans) => names.extend(chans),
                Err(e) => warn!(block = %block.path.display(), error = %e, "skipping unreadable block"),
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Oldest sample time in seconds, for one channel or the whole source.
    /// None when no data.
    pub fn old_time(&self, source: &str, channel: Option<&str>) -> StorageResult<Option<f64>> {
        let blocks = self.collect_blocks(source)?;
        match channel {
            // the oldest sample is the first block's open time: points never
            // predate their block, and a packed Point's recorded time is its
            // END time, not where its samples start
            None => Ok(blocks.first().map(|b| ms_to_secs(b.time_ms))),
            Some(chan) => {
                for block in &blocks {
                    if let Some(t) = self.channel_edge_time(block, chan, false) {
                        return Ok(Some(t));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Newest sample time in seconds, for one channel or the whole source.
    /// None when no data.
    pub fn new_time(&self, source: &str, channel: Option<&str>) -> StorageResult<Option<f64>> {
        let blocks = self.collect_blocks(source)?;
        match channel {
            None => Ok(blocks.last().map(|b| self.newest_point_time(b))),
            Some(chan) => {
                for block in blocks.iter().rev() {
                    if let Some(t) = self.channel_edge_time(block, chan, true) {
                        return Ok(Some(t));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Fetch one channel over a time window.
    /// `start` is interpreted per `mode`; `duration` is in seconds and the
    /// window is end-inclusive.
    pub fn get_data(
        &self,
        source: &str,
        channel: &str,
        start: f64,
        duration: f64,
        mode: Mode,
    ) -> StorageResult<ChannelData> {
        let mut map = self.get_data_map(source, &[channel], start, duration, mode)?;
        Ok(map.remove(channel).unwrap_or_default())
    }

    /// Fetch several channels over one time window.
    /// An empty channel list fetches every channel in the source.
    pub fn get_data_map(
        &self,
        source: &str,
        channels: &[&str],
        start: f64,
        duration: f64,
        mode: Mode,
    ) -> StorageResult<ChannelMap> {
        // empty request map wants every channel in the source
        let mut map = ChannelMap::with_channels(channels.iter().copied());

        let start = match self.resolve_start(source, start, duration, mode)? {
            Some(s) => s,
            None => return Ok(map), // relative mode over empty source
        };
        debug!(source, start, duration, %mode, "query");

        let blocks = self.collect_blocks(source)?;
        for name in self.list_channels(source)? {
            if !map.wants(&name) {
                continue;
            }
            let data = self.gather_channel(&blocks, &name, start, duration)?;
            map.add(&name, data);
        }
        map.set_byte_order(self.byte_order);
        map.trim(start, duration, self.spacing);
        Ok(map)
    }

    // Turn a (start, mode) pair into an absolute window start
    fn resolve_start(
        &self,
        source: &str,
        start: f64,
        duration: f64,
        mode: Mode,
    ) -> StorageResult<Option<f64>> {
        let resolved = match mode {
            Mode::Absolute => Some(start),
            Mode::Oldest => self.old_time(source, None)?.map(|old| old + start),
            Mode::Newest => self
                .new_time(source, None)?
                .map(|new| new - duration - start),
            Mode::After => self
                .new_time(source, None)?
                .map(|new| (new - duration).max(start) + AFTER_EPSILON),
        };
        Ok(resolved)
    }

    // All Blocks of a source in time order, Segments flattened one level
    fn collect_blocks(&self, source: &str) -> StorageResult<Vec<BlockRef>> {
        let dir = self.root.join(source);
        let mut blocks = Vec::new();
        if !dir.is_dir() {
            return Ok(blocks);
        }
        for (time_ms, path) in time_children(&dir)? {
            if path.is_dir() && is_segment(&path)? {
                for (t, p) in time_children(&path)? {
                    if let Some(block) = block_ref(t, p) {
                        blocks.push(block);
                    }
                }
            } else if let Some(block) = block_ref(time_ms, path) {
                blocks.push(block);
            }
        }
        blocks.sort_by_key(|b| b.time_ms);
        Ok(blocks)
    }

    // Frames of one channel intersecting [start, start+duration], untrimmed
    fn gather_channel(
        &self,
        blocks: &[BlockRef],
        channel: &str,
        start: f64,
        duration: f64,
    ) -> StorageResult<ChannelData> {
        let start_ms = secs_to_ms(start);
        let end_ms = secs_to_ms(start + duration);

        // last block at-or-before start; its samples may reach into the window
        let idx = blocks.partition_point(|b| b.time_ms <= start_ms);
        let first = idx.saturating_sub(1);

        let mut out = ChannelData::new();
        for block in &blocks[first..] {
            if block.time_ms > end_ms {
                break;
            }
            if let Err(e) = gather_block(block, channel, &mut out) {
                warn!(block = %block.path.display(), error = %e, "skipping unreadable block");
            }
        }
        Ok(out)
    }

    // Edge sample time of one channel inside one block, packed frames
    // expanded so the oldest lands on the block open time
    fn channel_edge_time(&self, block: &BlockRef, channel: &str, newest: bool) -> Option<f64> {
        let mut data = ChannelData::new();
        if let Err(e) = gather_block(block, channel, &mut data) {
            warn!(block = %block.path.display(), error = %e, "skipping unreadable block");
            return None;
        }
        let ctype = ChannelType::from_name(channel);
        let expanded = if ctype.is_numeric_string() {
            data.time_range_numeric(f64::MIN, f64::INFINITY)
        } else {
            data.time_range(ctype.word_size(), f64::MIN, f64::INFINITY, self.spacing)
        };
        if newest {
            expanded.times().last().copied()
        } else {
            expanded.times().first().copied()
        }
    }

    // Newest Point time within one block, falling back to the block's own
    // time when its interior cannot be read
    fn newest_point_time(&self, block: &BlockRef) -> f64 {
        let times = match block_point_times(block) {
            Ok(times) => times,
            Err(e) => {
                warn!(block = %block.path.display(), error = %e, "skipping unreadable block");
                Vec::new()
            }
        };
        ms_to_secs(times.into_iter().max().unwrap_or(block.time_ms))
    }
}

fn block_ref(time_ms: i64, path: PathBuf) -> Option<BlockRef> {
    let name = path.file_name()?.to_str()?;
    let kind = if path.is_dir() {
        BlockKind::Folder
    } else if name.ends_with(".zip.gz") {
        BlockKind::GzipZip
    } else if name.ends_with(".zip") {
        BlockKind::Zip
    } else {
        return None;
    };
    Some(BlockRef {
        time_ms,
        path,
        kind,
    })
}

// Time-named children of a folder, unsorted
fn time_children(dir: &Path) -> std::io::Result<Vec<(i64, PathBuf)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if let Some(t) = block_time_from_name(name) {
                out.push((t, path));
            }
        }
    }
    Ok(out)
}

// A time-named folder is a Segment when it holds zip Blocks, or folder
// Blocks (which in turn hold Point folders). A Block folder's children
// are Point folders holding only plain files.
fn is_segment(dir: &Path) -> std::io::Result<bool> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if path.is_file() && (name.ends_with(".zip") || name.ends_with(".zip.gz")) {
            return Ok(true);
        }
        if path.is_dir() {
            for sub in fs::read_dir(&path)? {
                if sub?.path().is_dir() {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

// read a block's raw zip bytes, unwrapping gzip when present
fn zip_bytes(block: &BlockRef) -> std::io::Result<Vec<u8>> {
    let raw = fs::read(&block.path)?;
    if block.kind == BlockKind::GzipZip {
        let mut inner = Vec::new();
        GzDecoder::new(&raw[..]).read_to_end(&mut inner)?;
        Ok(inner)
    } else {
        Ok(raw)
    }
}

// Append one block's frames for a channel: (point time, block open time, bytes)
fn gather_block(block: &BlockRef, channel: &str, out: &mut ChannelData) -> StorageResult<()> {
    let base = ms_to_secs(block.time_ms);
    match block.kind {
        BlockKind::Folder => {
            let mut points = time_children(&block.path)?;
            points.sort_by_key(|(t, _)| *t);
            for (ptime, pdir) in points {
                let file = pdir.join(channel);
                if file.is_file() {
                    out.add(ms_to_secs(ptime), base, fs::read(file)?);
                }
            }
        }
        BlockKind::Zip | BlockKind::GzipZip => {
            let bytes = zip_bytes(block)?;
            let mut archive = ZipArchive::new(Cursor::new(bytes))?;
            let mut frames = Vec::new();
            for i in 0..archive.len() {
                let mut entry = archive.by_index(i)?;
                let entry_name = entry.name().to_string();
                if let Some((ptime, name)) = split_entry_name(&entry_name) {
                    if name == channel {
                        let mut buf = Vec::new();
                        entry.read_to_end(&mut buf)?;
                        frames.push((ptime, buf));
                    }
                }
            }
            frames.sort_by_key(|(t, _)| *t);
            for (ptime, buf) in frames {
                out.add(ms_to_secs(ptime), base, buf);
            }
        }
    }
    Ok(())
}

// Channel names present in one block
fn block_channels(block: &BlockRef) -> StorageResult<Vec<String>> {
    let mut names = Vec::new();
    match block.kind {
        BlockKind::Folder => {
            for (_, pdir) in time_children(&block.path)? {
                if !pdir.is_dir() {
                    continue;
                }
                for entry in fs::read_dir(&pdir)? {
                    let path = entry?.path();
                    if path.is_file() {
                        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                            names.push(name.to_string());
                        }
                    }
                }
            }
        }
        BlockKind::Zip | BlockKind::GzipZip => {
            let bytes = zip_bytes(block)?;
            let archive = ZipArchive::new(Cursor::new(bytes))?;
            for entry in archive.file_names() {
                if let Some((_, name)) = split_entry_name(entry) {
                    names.push(name.to_string());
                }
            }
        }
    }
    Ok(names)
}

// Point times present in one block
fn block_point_times(block: &BlockRef) -> StorageResult<Vec<i64>> {
    match block.kind {
        BlockKind::Folder => Ok(time_children(&block.path)?
            .into_iter()
            .map(|(t, _)| t)
            .collect()),
        BlockKind::Zip | BlockKind::GzipZip => {
            let bytes = zip_bytes(block)?;
            let archive = ZipArchive::new(Cursor::new(bytes))?;
            Ok(archive
                .file_names()
                .filter_map(|e| split_entry_name(e).map(|(t, _)| t))
                .collect())
        }
    }
}

// zip entry names look like "<pointTimeMs>/<channelName>"
fn split_entry_name(entry: &str) -> Option<(i64, &str)> {
    let (time, name) = entry.split_once('/')?;
    let t = parse_time_name(time)?;
    if name.is_empty() {
        return None;
    }
    Some((t, name))
}

// Depth-first source discovery: a folder with time-named children is a
// source; otherwise keep descending with `/`-joined names.
fn scan_sources(dir: &Path, prefix: &str, out: &mut Vec<String>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };
        if parse_time_name(&name).is_some() {
            continue; // inside a source already; handled by its parent
        }
        let joined = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };
        if has_time_children(&path)? {
            out.push(joined);
        } else {
            scan_sources(&path, &joined, out)?;
        }
    }
    Ok(())
}

fn has_time_children(dir: &Path) -> std::io::Result<bool> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if block_time_from_name(name).is_some() {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::writer::{Writer, WriterConfig};
    use tempfile::tempdir;

    #[test]
    fn test_streamed_round_trip() {
        let dir = tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        w.set_time(1.0);
        w.put_data("c.i32", 7i32).unwrap();
        w.set_time(2.0);
        w.put_data("c.i32", 9i32).unwrap();
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        let data = r.get_data("src", "c.i32", 0.0, 10.0, Mode::Absolute).unwrap();
        assert_eq!(data.times(), &[1.0, 2.0]);
        assert_eq!(data.as_i32(), vec![7, 9]);
    }

    #[test]
    fn test_packed_round_trip() {
        let dir = tempdir().unwrap();
        let config = WriterConfig {
            packed: true,
            ..WriterConfig::default()
        };
        let mut w = Writer::new(dir.path(), "src", config).unwrap();
        w.set_time(0.0);
        w.put_data("c.i32", 5i32).unwrap();
        w.set_time(0.010);
        w.put_data("c.i32", 6i32).unwrap();
        w.set_time(0.020);
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        let data = r.get_data("src", "c.i32", 0.0, 1.0, Mode::Absolute).unwrap();
        assert_eq!(data.times(), &[0.0, 0.010]);
        assert_eq!(data.as_i32(), vec![5, 6]);
    }

    #[test]
    fn test_folder_blocks_round_trip() {
        let dir = tempdir().unwrap();
        let config = WriterConfig {
            zip: false,
            ..WriterConfig::default()
        };
        let mut w = Writer::new(dir.path(), "src", config).unwrap();
        w.set_time(1.0);
        w.put_data("msg", "hello").unwrap();
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        let data = r.get_data("src", "msg", 0.0, 10.0, Mode::Absolute).unwrap();
        assert_eq!(data.as_string(), vec!["hello"]);
    }

    #[test]
    fn test_gzip_blocks_round_trip() {
        let dir = tempdir().unwrap();
        let config = WriterConfig {
            gzip: true,
            ..WriterConfig::default()
        };
        let mut w = Writer::new(dir.path(), "src", config).unwrap();
        w.set_time(1.0);
        w.put_data("c.f64", 2.5f64).unwrap();
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        let data = r.get_data("src", "c.f64", 0.0, 10.0, Mode::Absolute).unwrap();
        assert_eq!(data.as_f64(), vec![2.5]);
    }

    #[test]
    fn test_segmented_source_round_trip() {
        let dir = tempdir().unwrap();
        let config = WriterConfig {
            blocks_per_segment: 2,
            ..WriterConfig::default()
        };
        let mut w = Writer::new(dir.path(), "src", config).unwrap();
        for (i, t) in [1.0f64, 2.0, 3.0].iter().enumerate() {
            w.set_time(*t);
            w.put_data("c.i32", i as i32).unwrap();
            w.flush().unwrap();
        }

        let r = Reader::new(dir.path());
        let data = r.get_data("src", "c.i32", 0.0, 10.0, Mode::Absolute).unwrap();
        assert_eq!(data.times(), &[1.0, 2.0, 3.0]);
        assert_eq!(data.as_i32(), vec![0, 1, 2]);
    }

    #[test]
    fn test_block_before_window_included() {
        // packed block opens before the query window but reaches into it
        let dir = tempdir().unwrap();
        let config = WriterConfig {
            packed: true,
            ..WriterConfig::default()
        };
        let mut w = Writer::new(dir.path(), "src", config).unwrap();
        for t in [0.0f64, 1.0, 2.0, 3.0] {
            w.set_time(t);
            w.put_data("c.f32", t as f32).unwrap();
        }
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        let data = r.get_data("src", "c.f32", 2.0, 5.0, Mode::Absolute).unwrap();
        assert_eq!(data.times(), &[2.0, 3.0]);
        assert_eq!(data.as_f32(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_numeric_folder_ordering() {
        // 999 sorts after 1000 lexicographically; gather must not
        let dir = tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        w.set_time_ms(999);
        w.put_data("c.i32", 1i32).unwrap();
        w.flush().unwrap();
        w.set_time_ms(1000);
        w.put_data("c.i32", 2i32).unwrap();
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        let data = r.get_data("src", "c.i32", 0.0, 10.0, Mode::Absolute).unwrap();
        assert_eq!(data.times(), &[0.999, 1.0]);
        assert_eq!(data.as_i32(), vec![1, 2]);
    }

    #[test]
    fn test_oldest_newest_times() {
        let dir = tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        w.set_time(1.0);
        w.put_data("c.i32", 1i32).unwrap();
        w.set_time(2.0);
        w.put_data("c.i32", 2i32).unwrap();
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        assert_eq!(r.old_time("src", None).unwrap(), Some(1.0));
        assert_eq!(r.new_time("src", None).unwrap(), Some(2.0));
        assert_eq!(r.old_time("nosuch", None).unwrap(), None);
    }

    #[test]
    fn test_packed_old_time_is_block_open_time() {
        // packed Point folders carry END times; the oldest sample still
        // lives at the block open time
        let dir = tempdir().unwrap();
        let config = WriterConfig {
            packed: true,
            ..WriterConfig::default()
        };
        let mut w = Writer::new(dir.path(), "src", config).unwrap();
        w.set_time(0.0);
        w.put_data("c.i32", 1i32).unwrap();
        w.set_time(10.0);
        w.put_data("c.i32", 2i32).unwrap();
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        assert_eq!(r.old_time("src", None).unwrap(), Some(0.0));
        assert_eq!(r.new_time("src", None).unwrap(), Some(10.0));

        let data = r.get_data("src", "c.i32", 0.0, 20.0, Mode::Oldest).unwrap();
        assert_eq!(data.times(), &[0.0, 10.0]);
        assert_eq!(data.as_i32(), vec![1, 2]);
    }

    #[test]
    fn test_per_channel_time_limits() {
        let dir = tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        w.set_time(1.0);
        w.put_data("a.i32", 1i32).unwrap();
        w.flush().unwrap();
        w.set_time(2.0);
        w.put_data("a.i32", 2i32).unwrap();
        w.put_data("b.i32", 2i32).unwrap();
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        assert_eq!(r.old_time("src", Some("a.i32")).unwrap(), Some(1.0));
        assert_eq!(r.old_time("src", Some("b.i32")).unwrap(), Some(2.0));
        assert_eq!(r.new_time("src", Some("a.i32")).unwrap(), Some(2.0));
        assert_eq!(r.new_time("src", Some("nosuch")).unwrap(), None);
    }

    #[test]
    fn test_newest_mode() {
        let dir = tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        for t in [1.0f64, 2.0, 3.0, 4.0] {
            w.set_time(t);
            w.put_data("c.i32", (t as i32) * 10).unwrap();
            w.flush().unwrap();
        }

        // newest with zero offset: window [newest-duration, newest]
        let r = Reader::new(dir.path());
        let data = r.get_data("src", "c.i32", 0.0, 1.0, Mode::Newest).unwrap();
        assert_eq!(data.times(), &[3.0, 4.0]);
        assert_eq!(data.as_i32(), vec![30, 40]);
    }

    #[test]
    fn test_oldest_mode() {
        let dir = tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        for t in [5.0f64, 6.0, 7.0] {
            w.set_time(t);
            w.put_data("c.i32", t as i32).unwrap();
            w.flush().unwrap();
        }

        let r = Reader::new(dir.path());
        let data = r.get_data("src", "c.i32", 0.0, 1.0, Mode::Oldest).unwrap();
        assert_eq!(data.times(), &[5.0, 6.0]);
    }

    #[test]
    fn test_after_mode_excludes_already_seen() {
        let dir = tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        for t in [1.0f64, 2.0, 3.0] {
            w.set_time(t);
            w.put_data("c.i32", t as i32).unwrap();
            w.flush().unwrap();
        }

        // already consumed through t=2.0; only newer samples come back
        let r = Reader::new(dir.path());
        let data = r.get_data("src", "c.i32", 2.0, 10.0, Mode::After).unwrap();
        assert_eq!(data.as_i32(), vec![3]);
    }

    #[test]
    fn test_missing_source_and_channel_are_empty() {
        let dir = tempdir().unwrap();
        let r = Reader::new(dir.path());
        let data = r
            .get_data("nosuch", "c.i32", 0.0, 10.0, Mode::Absolute)
            .unwrap();
        assert!(data.is_empty());

        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        w.set_time(1.0);
        w.put_data("c.i32", 1i32).unwrap();
        w.flush().unwrap();
        let data = r
            .get_data("src", "other.i32", 0.0, 10.0, Mode::Absolute)
            .unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_corrupt_block_skipped() {
        let dir = tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        w.set_time(2.0);
        w.put_data("c.i32", 2i32).unwrap();
        w.flush().unwrap();
        fs::write(dir.path().join("src").join("1000.zip"), b"not a zip").unwrap();

        let r = Reader::new(dir.path());
        let data = r.get_data("src", "c.i32", 0.0, 10.0, Mode::Absolute).unwrap();
        assert_eq!(data.as_i32(), vec![2]);
    }

    #[test]
    fn test_list_sources_and_channels() {
        let dir = tempdir().unwrap();
        for source in ["alpha", "nest/beta"] {
            let mut w = Writer::new(dir.path(), source, WriterConfig::default()).unwrap();
            w.set_time(1.0);
            w.put_data("a.i32", 1i32).unwrap();
            w.put_data("b.txt", "x").unwrap();
            w.flush().unwrap();
        }

        let r = Reader::new(dir.path());
        assert_eq!(r.list_sources().unwrap(), vec!["alpha", "nest/beta"]);
        assert_eq!(r.list_channels("alpha").unwrap(), vec!["a.i32", "b.txt"]);
    }

    #[test]
    fn test_get_data_map_multi_channel() {
        let dir = tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        w.set_time(1.0);
        w.put_data("a.i32", 1i32).unwrap();
        w.put_data("b.f64", 2.5f64).unwrap();
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        let map = r
            .get_data_map("src", &[], 0.0, 10.0, Mode::Absolute)
            .unwrap();
        assert_eq!(map.names(), vec!["a.i32", "b.f64"]);
        assert_eq!(map.get("a.i32").unwrap().as_i32(), vec![1]);
        assert_eq!(map.get("b.f64").unwrap().as_f64(), vec![2.5]);
    }

    #[test]
    fn test_get_data_map_filters_request() {
        let dir = tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        w.set_time(1.0);
        w.put_data("a.i32", 1i32).unwrap();
        w.put_data("b.f64", 2.5f64).unwrap();
        w.flush().unwrap();

        // only the requested channel is gathered
        let r = Reader::new(dir.path());
        let map = r
            .get_data_map("src", &["a.i32"], 0.0, 10.0, Mode::Absolute)
            .unwrap();
        assert_eq!(map.names(), vec!["a.i32"]);
        assert_eq!(map.get("a.i32").unwrap().as_i32(), vec![1]);

        // a requested channel with no data comes back empty, not missing
        let map = r
            .get_data_map("src", &["nosuch.i32"], 0.0, 10.0, Mode::Absolute)
            .unwrap();
        assert_eq!(map.names(), vec!["nosuch.i32"]);
        assert!(map.get("nosuch.i32").unwrap().is_empty());
    }
}
