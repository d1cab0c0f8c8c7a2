//! One channel's gathered samples as parallel time/byte arrays
//!
//! Each element ("frame") is the payload of one Point as found on disk.
//! Streamed frames hold a single sample; packed frames hold K concatenated
//! samples whose individual times were never stored and are reconstructed
//! here by linear interpolation between the Block open time (`base_time`)
//! and the Point's recorded end time.

use crate::storage::types::{ByteOrder, SpacingPolicy};

/// Parallel (time, base_time, bytes) sample arrays for one channel
#[derive(Debug, Clone, Default)]
pub struct ChannelData {
    times: Vec<f64>,
    base_times: Vec<f64>,
    data: Vec<Vec<u8>>,
    order: ByteOrder,
}

impl ChannelData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one frame. `time` is the Point's recorded time and
    /// `base_time` its enclosing Block's open time, both in seconds.
    pub fn add(&mut self, time: f64, base_time: f64, bytes: Vec<u8>) {
        self.times.push(time);
        self.base_times.push(base_time);
        self.data.push(bytes);
    }

    /// Append all frames of another ChannelData (gathering across Blocks)
    pub fn append(&mut self, mut other: ChannelData) {
        self.times.append(&mut other.times);
        self.base_times.append(&mut other.base_times);
        self.data.append(&mut other.data);
    }

    /// Current frame count
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample times in seconds (per-frame before trim, per-sample after)
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Raw frame payloads
    pub fn data(&self) -> &[Vec<u8>] {
        &self.data
    }

    /// Byte order used by the decode operations
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    //------------------------------------------------------------------
    // time_range: expand packed frames to per-sample times, trim to window

    /// Trim to `[start, start+duration]`, expanding multi-sample frames.
    ///
    /// A frame whose payload holds N > 1 words of `word_size` bytes is
    /// split into N samples at evenly spaced times from `base_time` to the
    /// frame's recorded time. The window end is inclusive so a `newest`
    /// query returns the newest sample itself.
    pub fn time_range(
        &self,
        word_size: usize,
        start: f64,
        duration: f64,
        policy: SpacingPolicy,
    ) -> ChannelData {
        let end = start + duration;
        let mut out = ChannelData {
            order: self.order,
            ..ChannelData::default()
        };

        for i in 0..self.data.len() {
            let bytes = &self.data[i];
            let time = self.times[i];
            let count = if word_size > 1 {
                bytes.len() / word_size
            } else {
                1
            };

            if count <= 1 {
                // intact single-sample frame
                if time >= start && time <= end {
                    out.add(time, self.base_times[i], bytes.clone());
                }
                if time > end {
                    break;
                }
                continue;
            }

            let base = self.base_times[i];
            let mut dt = if time > base {
                (time - base) / (count - 1) as f64
            } else {
                0.0
            };
            if dt == 0.0 {
                dt = match policy {
                    SpacingPolicy::AverageRate => self.average_dt(word_size),
                    SpacingPolicy::ConstantTime => 0.0,
                };
                if dt == 0.0 {
                    tracing::warn!(
                        count,
                        "cannot derive sample spacing, using constant time over block"
                    );
                }
            }

            for j in 0..count {
                let t = base + j as f64 * dt;
                if t < start {
                    continue;
                }
                if t > end {
                    break;
                }
                let word = bytes[j * word_size..(j + 1) * word_size].to_vec();
                out.add(t, t, word);
            }

            if base > end {
                break;
            }
        }

        out
    }

    /// `time_range` for comma-packed numeric-string frames (`.num`/`.Num`)
    pub fn time_range_numeric(&self, start: f64, duration: f64) -> ChannelData {
        let end = start + duration;
        let mut out = ChannelData {
            order: self.order,
            ..ChannelData::default()
        };

        for i in 0..self.data.len() {
            let text = String::from_utf8_lossy(&self.data[i]).to_string();
            let parts: Vec<&str> = text.split(',').filter(|p| !p.is_empty()).collect();
            let count = parts.len();
            if count == 0 {
                continue;
            }

            let time = self.times[i];
            let base = self.base_times[i];
            let dt = if count > 1 && time > base {
                (time - base) / (count - 1) as f64
            } else {
                0.0
            };

            for (j, part) in parts.iter().enumerate() {
                let t = if count > 1 { base + j as f64 * dt } else { time };
                if t >= start && t <= end {
                    out.add(t, t, part.as_bytes().to_vec());
                }
            }

            if base > end {
                break;
            }
        }

        out
    }

    // fallback dt: average sample rate over everything gathered
    fn average_dt(&self, word_size: usize) -> f64 {
        if self.data.len() < 2 || word_size == 0 {
            return 0.0;
        }
        let total: usize = self.data.iter().map(|d| d.len() / word_size).sum();
        if total < 2 {
            return 0.0;
        }
        let span = self.times[self.times.len() - 1] - self.base_times[0];
        if span <= 0.0 {
            return 0.0;
        }
        span / (total - 1) as f64
    }

    //------------------------------------------------------------------
    // decode as primitive types

    /// Decode every frame's UTF-8 text
    pub fn as_string(&self) -> Vec<String> {
        self.data
            .iter()
            .map(|d| String::from_utf8_lossy(d).to_string())
            .collect()
    }

    pub fn as_f64(&self) -> Vec<f64> {
        self.decode_words(8, |b| match self.order {
            ByteOrder::LittleEndian => f64::from_le_bytes(b.try_into().unwrap()),
            ByteOrder::BigEndian => f64::from_be_bytes(b.try_into().unwrap()),
        })
    }

    pub fn as_f32(&self) -> Vec<f32> {
        self.decode_words(4, |b| match self.order {
            ByteOrder::LittleEndian => f32::from_le_bytes(b.try_into().unwrap()),
            ByteOrder::BigEndian => f32::from_be_bytes(b.try_into().unwrap()),
        })
    }

    pub fn as_i64(&self) -> Vec<i64> {
        self.decode_words(8, |b| match self.order {
            ByteOrder::LittleEndian => i64::from_le_bytes(b.try_into().unwrap()),
            ByteOrder::BigEndian => i64::from_be_bytes(b.try_into().unwrap()),
        })
    }

    pub fn as_i32(&self) -> Vec<i32> {
        self.decode_words(4, |b| match self.order {
            ByteOrder::LittleEndian => i32::from_le_bytes(b.try_into().unwrap()),
            ByteOrder::BigEndian => i32::from_be_bytes(b.try_into().unwrap()),
        })
    }

    pub fn as_i16(&self) -> Vec<i16> {
        self.decode_words(2, |b| match self.order {
            ByteOrder::LittleEndian => i16::from_le_bytes(b.try_into().unwrap()),
            ByteOrder::BigEndian => i16::from_be_bytes(b.try_into().unwrap()),
        })
    }

    /// Parse numeric-string frames as f64 (`.Num` channels)
    pub fn as_numeric_f64(&self) -> Vec<f64> {
        self.data
            .iter()
            .filter_map(|d| String::from_utf8_lossy(d).trim().parse().ok())
            .collect()
    }

    /// Parse numeric-string frames as f32 (`.num` channels)
    pub fn as_numeric_f32(&self) -> Vec<f32> {
        self.data
            .iter()
            .filter_map(|d| String::from_utf8_lossy(d).trim().parse().ok())
            .collect()
    }

    /// All frame payloads concatenated (opaque binary channels)
    pub fn as_bytes(&self) -> Vec<u8> {
        let total: usize = self.data.iter().map(|d| d.len()).sum();
        let mut out = Vec::with_capacity(total);
        for d in &self.data {
            out.extend_from_slice(d);
        }
        out
    }

    fn decode_words<T>(&self, word: usize, f: impl Fn(&[u8]) -> T) -> Vec<T> {
        let mut out = Vec::new();
        for frame in &self.data {
            for chunk in frame.chunks_exact(word) {
                out.push(f(chunk));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed_frame(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_single_sample_trim() {
        let mut cd = ChannelData::new();
        cd.add(1.0, 1.0, 7i32.to_le_bytes().to_vec());
        cd.add(2.0, 2.0, 9i32.to_le_bytes().to_vec());
        cd.add(3.0, 3.0, 11i32.to_le_bytes().to_vec());

        let trimmed = cd.time_range(4, 1.5, 1.0, SpacingPolicy::default());
        assert_eq!(trimmed.times(), &[2.0]);
        assert_eq!(trimmed.as_i32(), vec![9]);
    }

    #[test]
    fn test_packed_interpolation() {
        // one Block: opened at t=0, Point recorded at t=4, 5 samples
        let mut cd = ChannelData::new();
        cd.add(4.0, 0.0, packed_frame(&[10, 20, 30, 40, 50]));

        let expanded = cd.time_range(4, 0.0, 10.0, SpacingPolicy::default());
        assert_eq!(expanded.times(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(expanded.as_i32(), vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_packed_trim_drops_early_samples() {
        let mut cd = ChannelData::new();
        cd.add(4.0, 0.0, packed_frame(&[10, 20, 30, 40, 50]));

        // window [2, 4]: synthesized times >= 2 survive
        let trimmed = cd.time_range(4, 2.0, 2.0, SpacingPolicy::default());
        assert_eq!(trimmed.times(), &[2.0, 3.0, 4.0]);
        assert_eq!(trimmed.as_i32(), vec![30, 40, 50]);
    }

    #[test]
    fn test_lone_block_constant_time_fallback() {
        // open == end time, no spacing derivable
        let mut cd = ChannelData::new();
        cd.add(5.0, 5.0, packed_frame(&[1, 2, 3]));

        let out = cd.time_range(4, 0.0, 10.0, SpacingPolicy::ConstantTime);
        assert_eq!(out.times(), &[5.0, 5.0, 5.0]);
        assert_eq!(out.as_i32(), vec![1, 2, 3]);
    }

    #[test]
    fn test_average_rate_fallback() {
        // second frame has zero interval; rate borrowed from overall span
        let mut cd = ChannelData::new();
        cd.add(2.0, 0.0, packed_frame(&[1, 2, 3]));
        cd.add(3.0, 3.0, packed_frame(&[4, 5, 6]));

        let out = cd.time_range(4, 0.0, 10.0, SpacingPolicy::AverageRate);
        assert_eq!(out.size(), 6);
        // frame 2 samples advance at the average rate instead of collapsing
        assert!(out.times()[4] > out.times()[3]);
    }

    #[test]
    fn test_numeric_string_expansion() {
        let mut cd = ChannelData::new();
        cd.add(2.0, 0.0, b"1.5,2.5,3.5,".to_vec());

        let out = cd.time_range_numeric(0.0, 5.0);
        assert_eq!(out.times(), &[0.0, 1.0, 2.0]);
        assert_eq!(out.as_numeric_f64(), vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_decode_big_endian() {
        let mut cd = ChannelData::new();
        cd.add(1.0, 1.0, 300i16.to_be_bytes().to_vec());
        cd.set_byte_order(ByteOrder::BigEndian);
        assert_eq!(cd.as_i16(), vec![300]);

        cd.set_byte_order(ByteOrder::LittleEndian);
        assert_ne!(cd.as_i16(), vec![300]);
    }

    #[test]
    fn test_decode_floats() {
        let mut cd = ChannelData::new();
        cd.add(1.0, 1.0, 1.25f64.to_le_bytes().to_vec());
        cd.add(2.0, 2.0, 2.5f64.to_le_bytes().to_vec());
        assert_eq!(cd.as_f64(), vec![1.25, 2.5]);
    }

    #[test]
    fn test_append() {
        let mut a = ChannelData::new();
        a.add(1.0, 1.0, vec![1]);
        let mut b = ChannelData::new();
        b.add(2.0, 2.0, vec![2]);

        a.append(b);
        assert_eq!(a.size(), 2);
        assert_eq!(a.times(), &[1.0, 2.0]);
    }

    #[test]
    fn test_empty_trim() {
        let cd = ChannelData::new();
        let out = cd.time_range(4, 0.0, 100.0, SpacingPolicy::default());
        assert!(out.is_empty());
    }
}
