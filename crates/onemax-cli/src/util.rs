use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use onemax_sweep::config::SweepConfig;

/// Destination of a JSON document: a file, or stdout when no path is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonTarget {
    Stdout,
    File(PathBuf),
}

impl JsonTarget {
    pub fn from_output_path(output_path: Option<PathBuf>) -> Self {
        output_path.map_or(JsonTarget::Stdout, JsonTarget::File)
    }

    pub fn display_path(&self) -> String {
        match self {
            JsonTarget::Stdout => "stdout".to_owned(),
            JsonTarget::File(path) => path.display().to_string(),
        }
    }

    /// Writes `value` as pretty JSON followed by a newline.
    pub fn write_json<T>(&self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let result = match self {
            JsonTarget::Stdout => write_json_to(io::stdout().lock(), value),
            JsonTarget::File(path) => {
                let file = File::create(path).with_context(|| {
                    format!("Failed to create output file: {}", path.display())
                })?;
                write_json_to(BufWriter::new(file), value)
            }
        };
        result.with_context(|| format!("Failed to write JSON to {}", self.display_path()))
    }
}

fn write_json_to<W, T>(mut writer: W, value: &T) -> anyhow::Result<()>
where
    W: Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let value = serde_json::from_reader(BufReader::new(file)).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read a sweep configuration from a JSON file
///
/// Fields missing from the file keep their default values.
///
/// # Errors
///
/// Returns error if file cannot be opened or parsed
pub fn read_sweep_config_file<P>(path: P) -> anyhow::Result<SweepConfig>
where
    P: AsRef<Path>,
{
    read_json_file("sweep config", path)
}
