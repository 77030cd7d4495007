use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use flate2::read::GzDecoder;
use rustc_hash::FxHashMap;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::LinkPredError;
use crate::source::{MemoryGraph, Orientation};
use crate::types::ScoredPair;

/// Error type for edge-list file operations and the binary.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// CSV writing error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Prediction engine error.
    #[error(transparent)]
    Core(#[from] LinkPredError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

/// Output layout for preprocessed edges.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum EdgeFormat {
    /// Tab-separated `src dst` lines, the SNAP layout without comments.
    #[default]
    Text,
    /// CSV with a `:START_ID(Member),:END_ID(Member)` header for bulk graph importers.
    Csv,
}

/// Configuration for cleaning a SNAP edge list.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Input edge list.
    pub input: PathBuf,
    /// Output edge file; must not exist yet.
    pub output: PathBuf,
    /// Output layout.
    pub format: EdgeFormat,
    /// When set, vertices are renumbered densely in first-seen order and the
    /// `original new` mapping is written here.
    pub renumber_out: Option<PathBuf>,
    /// Optional CSV of distinct vertices (`_id:ID(Member),name`).
    pub nodes_out: Option<PathBuf>,
}

/// Counters from a preprocessing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PreprocessSummary {
    /// Lines read, comments included.
    pub lines: u64,
    /// Comment and blank lines skipped.
    pub skipped: u64,
    /// Repeated edges dropped.
    pub duplicates: u64,
    /// Edges written.
    pub edges: u64,
    /// Distinct vertices seen.
    pub vertices: u64,
}

/// Parses a whitespace-separated edge list.
///
/// Lines starting with `#` and blank lines are skipped. Any other line must begin
/// with two unsigned integer ids; extra columns are ignored.
pub fn parse_edge_list<R: BufRead>(reader: R) -> Result<Vec<(u64, u64)>, CliError> {
    let mut edges = Vec::new();
    for_each_edge(reader, |_, edge| {
        edges.push(edge);
        Ok(())
    })?;
    Ok(edges)
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Opens a text input, transparently decompressing gzip.
///
/// A file is treated as gzip when it ends in `.gz` or starts with the gzip magic
/// bytes, which covers SNAP's `.txt.gz` dumps and renamed copies of them.
pub fn open_input(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>, CliError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| CliError::Message(format!("cannot open {}: {e}", path.display())))?;
    let mut reader = BufReader::new(file);
    let has_gz_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    let has_magic = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if has_gz_extension || has_magic {
        debug!(path = %path.display(), "reading gzip input");
        Ok(Box::new(BufReader::new(GzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Reads an edge list file, plain or gzip-compressed.
pub fn read_edge_list(path: impl AsRef<Path>) -> Result<Vec<(u64, u64)>, CliError> {
    let path = path.as_ref();
    let edges = parse_edge_list(open_input(path)?)?;
    debug!(path = %path.display(), edges = edges.len(), "edge list read");
    Ok(edges)
}

/// Loads an edge list file into an in-memory graph.
pub fn load_graph(
    path: impl AsRef<Path>,
    orientation: Orientation,
) -> Result<MemoryGraph<u64>, CliError> {
    let edges = read_edge_list(path)?;
    Ok(MemoryGraph::from_edges(orientation, edges))
}

/// Strips comments, drops duplicate edges and optionally renumbers vertices.
///
/// Every output is written to a temporary file next to its target and only moved
/// into place once the whole input has been processed, so a failed run leaves no
/// output behind.
pub fn run_preprocess(cfg: &PreprocessConfig) -> Result<PreprocessSummary, CliError> {
    for target in [Some(&cfg.output), cfg.renumber_out.as_ref(), cfg.nodes_out.as_ref()]
        .into_iter()
        .flatten()
    {
        if target.exists() {
            return Err(CliError::Message(format!(
                "output file {} already exists",
                target.display()
            )));
        }
    }
    let input = open_input(&cfg.input)?;
    let output = staged(&cfg.output)?;

    let mut summary = PreprocessSummary::default();
    let mut seen_edges: HashSet<(u64, u64)> = HashSet::new();
    let mut ids: FxHashMap<u64, u64> = FxHashMap::default();
    let mut order: Vec<u64> = Vec::new();
    let mut sink = EdgeSink::create(output.as_file().try_clone()?, cfg.format)?;
    let renumber = cfg.renumber_out.is_some();

    let lines = for_each_edge(input, |_, (src, dst)| {
        for v in [src, dst] {
            if !ids.contains_key(&v) {
                ids.insert(v, order.len() as u64);
                order.push(v);
            }
        }
        if !seen_edges.insert((src, dst)) {
            summary.duplicates += 1;
            return Ok(());
        }
        let (out_src, out_dst) = if renumber { (ids[&src], ids[&dst]) } else { (src, dst) };
        sink.write(out_src, out_dst)?;
        summary.edges += 1;
        Ok(())
    })?;
    sink.finish()?;
    summary.lines = lines.total;
    summary.skipped = lines.skipped;
    summary.vertices = order.len() as u64;

    let mut finished = vec![(output, &cfg.output)];
    if let Some(path) = &cfg.renumber_out {
        let tmp = staged(path)?;
        let mut out = BufWriter::new(tmp.as_file());
        writeln!(out, "# original\tnew")?;
        for (new, original) in order.iter().enumerate() {
            writeln!(out, "{original}\t{new}")?;
        }
        out.flush()?;
        drop(out);
        finished.push((tmp, path));
    }
    if let Some(path) = &cfg.nodes_out {
        let tmp = staged(path)?;
        let mut writer = csv_writer(tmp.as_file().try_clone()?);
        writer.write_record(["_id:ID(Member)", "name"])?;
        for (new, original) in order.iter().enumerate() {
            let id = if renumber { new as u64 } else { *original };
            writer.write_record([id.to_string(), original.to_string()])?;
        }
        writer.flush()?;
        finished.push((tmp, path));
    }
    for (tmp, path) in finished {
        tmp.persist_noclobber(path).map_err(|e| {
            CliError::Message(format!("cannot write {}: {}", path.display(), e.error))
        })?;
    }
    info!(
        input = %cfg.input.display(),
        output = %cfg.output.display(),
        edges = summary.edges,
        duplicates = summary.duplicates,
        "preprocess finished"
    );
    Ok(summary)
}

/// Reads a renumbering file of `original new` lines into a `new -> original` map.
pub fn read_renumber_map(path: impl AsRef<Path>) -> Result<FxHashMap<u64, u64>, CliError> {
    let path = path.as_ref();
    let mut map = FxHashMap::default();
    for_each_edge(open_input(path)?, |line, (original, new)| {
        if map.insert(new, original).is_some() {
            return Err(LinkPredError::InvalidData(format!(
                "line {line}: id {new} renumbered twice"
            ))
            .into());
        }
        Ok(())
    })?;
    Ok(map)
}

/// Maps both endpoints of every result back to original ids.
pub fn apply_renumber(
    results: Vec<ScoredPair<u64>>,
    map: &FxHashMap<u64, u64>,
) -> Result<Vec<ScoredPair<u64>>, CliError> {
    if let Some(missing) = results
        .iter()
        .flat_map(|r| [r.source, r.target])
        .find(|v| !map.contains_key(v))
    {
        return Err(CliError::Message(format!(
            "vertex {missing} missing from renumber map"
        )));
    }
    Ok(results
        .into_iter()
        .map(|r| r.map_vertices(|v| map.get(&v).copied().unwrap_or(v)))
        .collect())
}

struct LineCounts {
    total: u64,
    skipped: u64,
}

fn for_each_edge<R, F>(reader: R, mut f: F) -> Result<LineCounts, CliError>
where
    R: BufRead,
    F: FnMut(usize, (u64, u64)) -> Result<(), CliError>,
{
    let mut counts = LineCounts {
        total: 0,
        skipped: 0,
    };
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => CliError::Core(LinkPredError::InvalidData(format!(
                "line {line_no}: not a text edge list ({e})"
            ))),
            _ => CliError::Io(e),
        })?;
        counts.total += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            counts.skipped += 1;
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        let src = parse_id(fields.next(), line_no)?;
        let dst = parse_id(fields.next(), line_no)?;
        f(line_no, (src, dst))?;
    }
    Ok(counts)
}

fn parse_id(field: Option<&str>, line: usize) -> Result<u64, CliError> {
    let field = field.ok_or_else(|| {
        LinkPredError::InvalidData(format!("line {line}: expected two vertex ids"))
    })?;
    field.parse::<u64>().map_err(|e| {
        LinkPredError::InvalidData(format!("line {line}: invalid vertex id '{field}': {e}"))
            .into()
    })
}

fn csv_writer(file: File) -> csv::Writer<File> {
    WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file)
}

/// Temporary file in the directory of `target`, creating the directory if needed.
fn staged(target: &Path) -> Result<NamedTempFile, CliError> {
    let dir = match target.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    Ok(NamedTempFile::new_in(dir)?)
}

enum EdgeSink {
    Text(BufWriter<File>),
    Csv(csv::Writer<File>),
}

impl EdgeSink {
    fn create(file: File, format: EdgeFormat) -> Result<Self, CliError> {
        match format {
            EdgeFormat::Text => Ok(EdgeSink::Text(BufWriter::new(file))),
            EdgeFormat::Csv => {
                let mut writer = csv_writer(file);
                writer.write_record([":START_ID(Member)", ":END_ID(Member)"])?;
                Ok(EdgeSink::Csv(writer))
            }
        }
    }

    fn write(&mut self, src: u64, dst: u64) -> Result<(), CliError> {
        match self {
            EdgeSink::Text(out) => writeln!(out, "{src}\t{dst}")?,
            EdgeSink::Csv(writer) => writer.write_record([src.to_string(), dst.to_string()])?,
        }
        Ok(())
    }

    fn finish(self) -> Result<(), CliError> {
        match self {
            EdgeSink::Text(mut out) => out.flush()?,
            EdgeSink::Csv(mut writer) => writer.flush()?,
        }
        Ok(())
    }
}
