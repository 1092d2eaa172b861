//! Export helpers for the surrounding reporting layer: feature tables and
//! histograms as CSV, comparison reports as JSON. Read-only views of the
//! core's outputs; nothing here feeds back into the analysis.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use csv::Writer;

use crate::features::FeatureSet;
use crate::stats::comparison::ComparisonResult;
use crate::stats::FeatureHistogram;

#[allow(dead_code)]
pub fn write_feature_set_to_csv<P: AsRef<Path>>(
    path: P,
    set: &FeatureSet,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(path)?;

    wtr.write_record(["label", "feature", "frame", "valid", "value"])?;
    for (feature, series) in set.iter() {
        for frame in 0..series.len() {
            let value = if series.valid[frame] {
                series.values[frame].to_string()
            } else {
                "NaN".to_string()
            };
            let record = vec![
                set.label.clone(),
                feature.name().to_string(),
                frame.to_string(),
                series.valid[frame].to_string(),
                value,
            ];
            wtr.write_record(&record)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[allow(dead_code)]
pub fn write_histogram_to_csv<P: AsRef<Path>>(
    path: P,
    histogram: &FeatureHistogram,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(path)?;

    wtr.write_record(["feature", "bin_low", "bin_high", "count"])?;
    match histogram {
        FeatureHistogram::Binned(h) => {
            for (i, count) in h.counts.iter().enumerate() {
                let record = vec![
                    h.feature.name().to_string(),
                    h.edges[i].to_string(),
                    h.edges[i + 1].to_string(),
                    count.to_string(),
                ];
                wtr.write_record(&record)?;
            }
        }
        FeatureHistogram::Insufficient {
            feature,
            num_samples,
            ..
        } => {
            let record = vec![
                feature.name().to_string(),
                "insufficient".to_string(),
                "insufficient".to_string(),
                num_samples.to_string(),
            ];
            wtr.write_record(&record)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[allow(dead_code)]
pub fn write_comparison_report_json<P: AsRef<Path>>(
    path: P,
    results: &[ComparisonResult],
) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), results)?;
    Ok(())
}
