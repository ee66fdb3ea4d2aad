
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Opens a file for buffered reading, transparently decompressing `.gz` files
/// # Arguments
/// * `filename` - the file path to open
/// # Errors
/// * if the file does not open
pub fn open_reader(filename: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let reader: Box<dyn BufRead> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Opens a file for buffered writing, compressing if the path ends in `.gz`
/// # Arguments
/// * `filename` - the file path to create
/// # Errors
/// * if the file cannot be created
pub fn open_writer(filename: &Path) -> anyhow::Result<BufWriter<Box<dyn Write>>> {
    let file = File::create(filename)
        .with_context(|| format!("Error while creating {filename:?}:"))?;
    let writer: Box<dyn Write> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(flate2::write::GzEncoder::new(file, flate2::Compression::best()))
    } else {
        Box::new(file)
    };
    Ok(BufWriter::new(writer))
}

/// Helper function that loads a file into some type, helpful generic
/// # Arguments
/// * `filename` - the file path to open and parse
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> anyhow::Result<T> {
    let reader = open_reader(filename)?;
    let result: T = serde_json::from_reader(reader)
        .with_context(|| format!("Error while deserializing {filename:?}:"))?;
    Ok(result)
}

/// This will save a generic serializable struct to JSON.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let mut writer = open_writer(out_filename)?;
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Error while serializing {out_filename:?}:"))?;
    writer.flush()
        .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::input_record::InputRecord;

    #[test]
    fn test_round_trip_gz() {
        let records = vec![InputRecord {
            id: "ins1".to_string(),
            contig: "chr2".to_string(),
            position: 100,
            alt_allele: "<INS>".to_string(),
            svlen: Some(300),
            ..Default::default()
        }];

        let out_fn = std::env::temp_dir().join(format!("svbench_json_io_{}.json.gz", std::process::id()));
        save_json(&records, &out_fn).unwrap();
        let loaded: Vec<InputRecord> = load_json(&out_fn).unwrap();
        std::fs::remove_file(&out_fn).unwrap();
        assert_eq!(records, loaded);
    }
}
