
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::fs::File;
use std::path::Path;

use crate::data_types::call_results::CallResults;

/// Helper function that loads a file into some type, helpful generic
/// # Arguments
/// * `filename` - the file path to open and parse, gzip is detected from a ".gz" extension
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let fp: Box<dyn std::io::Read> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(
            flate2::read::MultiGzDecoder::new(
                File::open(filename)?
            )
        )
    } else {
        Box::new(File::open(filename)?)
    };
    let result: T = serde_json::from_reader(std::io::BufReader::new(fp))?;
    Ok(result)
}

/// This will save a generic serializable struct to JSON.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file: Box<dyn std::io::Write> = if out_filename.extension().unwrap_or_default() == "gz" {
        Box::new(
            flate2::write::GzEncoder::new(
                File::create(out_filename)?,
                flate2::Compression::best()
            )
        )
    } else {
        Box::new(File::create(out_filename)?)
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}

/// Wrapper for a single row of the calls TSV
#[derive(Serialize)]
struct CallRow<'a> {
    #[serde(rename = "#sample")]
    sample: &'a str,
    gene: &'a str,
    diplotype: &'a str,
    status: &'a str
}

/// Saves a flat table with one row per sample per gene.
/// # Arguments
/// * `results` - our reported calls
/// * `filename` - the output filename, TSV
/// # Errors
/// * if we have any errors opening or writing to the file
pub fn save_calls_tsv(results: &CallResults, filename: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(filename)?;

    for (gene, details) in results.gene_details().iter() {
        for sample_call in details.calls().iter() {
            let call = sample_call.call();
            let row = CallRow {
                sample: sample_call.sample(),
                gene,
                diplotype: call.diplotype().diplotype(),
                status: call.status().as_ref()
            };
            csv_writer.serialize(&row)?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}
