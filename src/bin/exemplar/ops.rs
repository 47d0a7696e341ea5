use std::fmt::Debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;

use ndarray::Array1;
use num_traits::Float;
use thiserror::Error;

use exemplar::ExemplarMap;

#[derive(Debug, Error)]
#[error("{message}")]
pub(crate) struct FileParseError {
    pub message: String,
}

impl FileParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reads in a file formatted as (`d` separated):
///     id1 val1 val2 val3
///     id2 val1 val2 val3
///
/// Provide as many ids and values as desired
/// All rows should be same length
/// Values should be floating-point decimal values
pub(crate) fn from_file<F>(
    p: &Path,
    d: &str,
) -> Result<(Vec<Array1<F>>, Vec<String>), FileParseError>
where
    F: Float + FromStr,
    <F as FromStr>::Err: Debug,
{
    let file = File::open(p)
        .map_err(|e| FileParseError::new(format!("Unable to open {}: {}", p.display(), e)))?;
    let reader = BufReader::new(file);
    let mut labels = Vec::new();
    let mut data: Vec<Array1<F>> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            FileParseError::new(format!("Error reading line {}: {}", idx + 1, e))
        })?;
        if !line.contains(d) {
            return Err(FileParseError::new(format!(
                "Line {} is not {:?}-delimited",
                idx + 1,
                d
            )));
        }
        let mut line = line.split(d);
        // ID as first col
        match line.next() {
            Some(id) if !id.is_empty() => labels.push(id.to_string()),
            _ => {
                return Err(FileParseError::new(format!(
                    "Error loading label at line {}",
                    idx + 1
                )))
            }
        }
        // Rest are data
        let mut entry: Vec<F> = vec![];
        for s in line {
            match s.trim().parse::<F>() {
                Ok(v) => entry.push(v),
                Err(_) => {
                    return Err(FileParseError::new(format!(
                        "Error parsing file at line {}",
                        idx + 1
                    )))
                }
            }
        }
        if let Some(first) = data.first() {
            if first.len() != entry.len() {
                return Err(FileParseError::new("Input data rows must all be same length!"));
            }
        }
        data.push(Array1::from(entry));
    }
    Ok((data, labels))
}

pub(crate) fn display_results<W, L>(
    mut writer: W,
    converged: bool,
    results: &ExemplarMap,
    labels: &[L],
) -> std::io::Result<()>
where
    W: Write,
    L: AsRef<str>,
{
    // Output header
    writeln!(
        writer,
        "Converged={} nClusters={} nSamples={}",
        converged,
        results.len(),
        results.values().map(|v| v.len()).sum::<usize>()
    )?;
    for (idx, (key, value)) in results.iter().enumerate() {
        // Write each exemplar
        writeln!(
            writer,
            ">Cluster={} size={} exemplar={}",
            idx + 1,
            value.len(),
            labels[*key].as_ref()
        )?;
        // Write exemplar members
        let members: Vec<&str> = value.iter().map(|v| labels[*v].as_ref()).collect();
        writeln!(writer, "{}", members.join(","))?;
    }
    writer.flush()
}
