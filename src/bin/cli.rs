//! Turbine CLI
//!
//! Command-line interface for turbine data folders:
//! - List sources and channels
//! - Show time ranges
//! - Get channel data
//! - Put test data

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turbine::storage::{ChannelType, Mode, PutValue, Reader, Writer, WriterConfig};

#[derive(Parser)]
#[command(name = "turbine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and write filesystem time-series data folders")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data root folder
    #[arg(short, long, default_value = "CTdata", global = true)]
    pub root: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List sources under the root
    Sources,

    /// List channels of a source
    Channels {
        /// Source name
        source: String,
    },

    /// Show the oldest and newest sample times of a source
    Times {
        /// Source name
        source: String,
        /// Restrict to one channel
        channel: Option<String>,
    },

    /// Fetch channel data over a time window
    Get {
        /// Source name
        source: String,
        /// Channel name (suffix picks the decode type)
        channel: String,
        /// Window start, seconds (meaning depends on --mode)
        #[arg(short, long, default_value = "0")]
        start: f64,
        /// Window duration, seconds
        #[arg(short, long, default_value = "10")]
        duration: f64,
        /// Reference mode (absolute, oldest, newest, after)
        #[arg(short, long, default_value = "newest")]
        mode: Mode,
        /// Output format (text, csv)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write a comma-separated series of numeric samples
    Put {
        /// Source name
        source: String,
        /// Channel name (suffix picks the encoding)
        channel: String,
        /// Values, comma-separated
        values: String,
        /// First sample time, seconds (default: now)
        #[arg(short, long)]
        start: Option<f64>,
        /// Sample interval, seconds
        #[arg(short, long, default_value = "1")]
        interval: f64,
        /// Pack samples into single block entries
        #[arg(long)]
        packed: bool,
    },
}

// Narrow a parsed f64 to the channel's suffix type so typed channels
// get the binary encoding their name asks for
fn typed_value(channel: &str, value: f64) -> PutValue {
    match ChannelType::from_name(channel) {
        ChannelType::Int16 => PutValue::I16(value as i16),
        ChannelType::Int32 => PutValue::I32(value as i32),
        ChannelType::Int64 => PutValue::I64(value as i64),
        ChannelType::Float32 => PutValue::F32(value as f32),
        _ => PutValue::F64(value),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "turbine=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let reader = Reader::new(&cli.root);

    match cli.command {
        Commands::Sources => {
            for source in reader.list_sources()? {
                println!("{}", source);
            }
        }

        Commands::Channels { source } => {
            for channel in reader.list_channels(&source)? {
                println!("{}", channel);
            }
        }

        Commands::Times { source, channel } => {
            let chan = channel.as_deref();
            match (
                reader.old_time(&source, chan)?,
                reader.new_time(&source, chan)?,
            ) {
                (Some(old), Some(new)) => {
                    println!("oldest: {:.3}", old);
                    println!("newest: {:.3}", new);
                    println!("span:   {:.3}", new - old);
                }
                _ => println!("no data for source {}", source),
            }
        }

        Commands::Get {
            source,
            channel,
            start,
            duration,
            mode,
            format,
        } => {
            let data = reader.get_data(&source, &channel, start, duration, mode)?;
            if data.is_empty() {
                eprintln!("no data in window");
            }
            for (time, value) in data.times().iter().zip(data.as_string()) {
                match format.as_str() {
                    "csv" => println!("{:.3},{}", time, value.escape_default()),
                    _ => println!("{:.3}\t{}", time, value.escape_default()),
                }
            }
        }

        Commands::Put {
            source,
            channel,
            values,
            start,
            interval,
            packed,
        } => {
            let config = WriterConfig {
                packed,
                ..WriterConfig::default()
            };
            let mut writer = Writer::new(&cli.root, &source, config)?;
            let mut time = start;
            let mut count = 0usize;
            for value in values.split(',').filter(|v| !v.is_empty()) {
                let parsed: f64 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("bad value: {:?}", value))?;
                if let Some(t) = time {
                    writer.set_time(t);
                    time = Some(t + interval);
                }
                writer.put_data(&channel, typed_value(&channel, parsed))?;
                count += 1;
            }
            writer.close()?;
            println!("wrote {} samples to {}/{}", count, source, channel);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_value_follows_suffix() {
        assert_eq!(typed_value("c.i16", 3.0), PutValue::I16(3));
        assert_eq!(typed_value("c.i32", 3.0), PutValue::I32(3));
        assert_eq!(typed_value("c.i64", 3.0), PutValue::I64(3));
        assert_eq!(typed_value("c.f32", 1.5), PutValue::F32(1.5));
        assert_eq!(typed_value("c.f64", 1.5), PutValue::F64(1.5));
        assert_eq!(typed_value("c", 1.5), PutValue::F64(1.5));
        assert_eq!(typed_value("c.num", 1.5), PutValue::F64(1.5));
    }

    #[test]
    fn test_typed_value_round_trips_through_writer() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = Writer::new(dir.path(), "src", WriterConfig::default()).unwrap();
        w.set_time(1.0);
        w.put_data("c.i32", typed_value("c.i32", 7.0)).unwrap();
        w.flush().unwrap();

        let r = Reader::new(dir.path());
        let data = r
            .get_data("src", "c.i32", 0.0, 10.0, Mode::Absolute)
            .unwrap();
        assert_eq!(data.as_i32(), vec![7]);
    }
}
