use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of one split run: how many domains were written and which
/// shard files were created, in rank order.
#[derive(Debug)]
pub struct SplitSummary {
    pub domains: usize,
    pub files: Vec<PathBuf>,
}

/// Extract the domain column from one ranking CSV row. Rows with fewer
/// than two columns or an empty domain are skipped.
fn ranking_domain(line: &str) -> Option<&str> {
    let mut columns = line.split(',');
    let _rank = columns.next()?;
    let domain = columns.next()?.trim();
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

/// Split a ranked-domain CSV into shard files of `shard_size` records in
/// dnsperf input format (`<domain> A` per line), stopping after
/// `max_domains` records. Shards are named
/// `domains_<index>_<start>_to_<end>.csv` by the rank range they cover.
pub fn split_ranking(
    input: &Path,
    output_dir: &Path,
    shard_size: usize,
    max_domains: usize,
) -> Result<SplitSummary> {
    if shard_size == 0 {
        anyhow::bail!("shard size must be at least 1");
    }

    let file = File::open(input)
        .with_context(|| format!("ranking file {} not found", input.display()))?;
    let reader = BufReader::new(file);

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let mut domains = 0usize;
    let mut files: Vec<PathBuf> = Vec::new();
    let mut writer: Option<BufWriter<File>> = None;

    for line in reader.lines() {
        let line = line.context("failed to read ranking file")?;

        if domains >= max_domains {
            info!("reached {} domains, stopping", max_domains);
            break;
        }

        let Some(domain) = ranking_domain(&line) else {
            continue;
        };

        if domains % shard_size == 0 {
            if let Some(mut previous) = writer.take() {
                previous.flush()?;
            }

            let index = domains / shard_size + 1;
            let start = domains + 1;
            let end = (domains + shard_size).min(max_domains);
            let path = output_dir.join(format!("domains_{}_{}_to_{}.csv", index, start, end));
            info!("creating shard {}: {}", index, path.display());

            let file = File::create(&path)
                .with_context(|| format!("failed to create shard {}", path.display()))?;
            files.push(path);
            writer = Some(BufWriter::new(file));
        }

        if let Some(shard) = writer.as_mut() {
            writeln!(shard, "{} A", domain)?;
        }
        domains += 1;

        if domains % 100_000 == 0 {
            info!("processed {} domains", domains);
        }
    }

    if let Some(mut last) = writer.take() {
        last.flush()?;
    }

    info!("split complete: {} domains across {} files", domains, files.len());
    Ok(SplitSummary { domains, files })
}

/// Convert a whole ranking CSV into one dnsperf/resperf input file,
/// returning the number of domains written.
pub fn convert_ranking(input: &Path, output: &Path) -> Result<usize> {
    let file = File::open(input)
        .with_context(|| format!("ranking file {} not found", input.display()))?;
    let reader = BufReader::new(file);

    let out = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(out);

    let mut count = 0usize;
    for line in reader.lines() {
        let line = line.context("failed to read ranking file")?;
        let Some(domain) = ranking_domain(&line) else {
            continue;
        };
        writeln!(writer, "{} A", domain)?;
        count += 1;
        if count % 500_000 == 0 {
            info!("processed {} domains", count);
        }
    }
    writer.flush()?;

    info!("converted {} domains to {}", count, output.display());
    Ok(count)
}

/// Locate the shard file for a given shard number by its
/// `domains_<number>_` filename prefix.
pub fn find_shard(dir: &Path, number: u32) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let prefix = format!("domains_{}_", number);
    for entry in fs::read_dir(dir)
        .with_context(|| format!("failed to read shard directory {}", dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(".csv") {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// All shard files in the directory, sorted by name.
pub fn list_shards(dir: &Path) -> Vec<PathBuf> {
    let mut shards: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map(|name| {
                        let name = name.to_string_lossy();
                        name.starts_with("domains_") && name.ends_with(".csv")
                    })
                    .unwrap_or(false)
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    shards.sort();
    shards
}
