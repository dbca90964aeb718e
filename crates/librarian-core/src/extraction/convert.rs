use super::correlator::{is_source_document, ExtractionIndex};
use crate::scanner::ScannedFile;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{error, info, trace};

/// Produces a `.txt` artifact for a source document. Implementations live
/// outside the catalog core; the engine only cares whether the artifact
/// exists afterwards.
pub trait Converter {
    fn name(&self) -> &str;
    fn handles(&self, extension: &str) -> bool;
    fn convert(&self, source: &Path, target: &Path) -> io::Result<()>;
}

/// PDF text extraction through the external `pdftotext` program.
pub struct PdfToText {
    program: String,
}

impl PdfToText {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for PdfToText {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl Converter for PdfToText {
    fn name(&self) -> &str {
        "pdf"
    }

    fn handles(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case("pdf")
    }

    fn convert(&self, source: &Path, target: &Path) -> io::Result<()> {
        let status = Command::new(&self.program).arg(source).arg(target).status()?;
        if !status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} exited with {}", self.program, status),
            ));
        }
        Ok(())
    }
}

/// Markdown is already text; the artifact is a verbatim copy.
pub struct MarkdownCopy;

impl Converter for MarkdownCopy {
    fn name(&self) -> &str {
        "markdown"
    }

    fn handles(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case("md")
    }

    fn convert(&self, source: &Path, target: &Path) -> io::Result<()> {
        fs::copy(source, target)?;
        Ok(())
    }
}

/// Flattens a WebVTT subtitle track to plain text.
pub struct VttFlatten;

impl Converter for VttFlatten {
    fn name(&self) -> &str {
        "subtitles"
    }

    fn handles(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case("vtt")
    }

    fn convert(&self, source: &Path, target: &Path) -> io::Result<()> {
        let text = fs::read_to_string(source)?;
        let flat = flatten_vtt(&text).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(target, flat)
    }
}

/// Keep only cue lines carrying `<c>` styling tags, strip every tag, and drop
/// empty or already-seen lines. Auto-generated tracks repeat each caption
/// once styled and once plain, so the styled copy is the one kept.
pub fn flatten_vtt(text: &str) -> Result<String, regex::Error> {
    let styled = Regex::new(r"<c(?:\.[^>]*)?>.*?</c>")?;
    let tags = Regex::new(r"<[^>]+>")?;

    let mut seen = ahash::AHashSet::new();
    let mut lines = Vec::new();
    for raw in text.lines() {
        if !styled.is_match(raw) {
            continue;
        }
        let clean = tags.replace_all(raw, "");
        let clean = clean.trim();
        if clean.is_empty() || !seen.insert(clean.to_string()) {
            continue;
        }
        lines.push(clean.to_string());
    }
    Ok(lines.join("\n\n"))
}

pub fn default_converters() -> Vec<Box<dyn Converter>> {
    vec![
        Box::new(PdfToText::default()),
        Box::new(MarkdownCopy),
        Box::new(VttFlatten),
    ]
}

/// Where the artifact of `source` belongs:
/// `<root>/<top_level_folder>/<extraction>/<stem>.txt`, or
/// `<root>/<extraction>/<stem>.txt` for files directly under the root.
pub fn artifact_target(root: &Path, extraction_folder: &str, source: &ScannedFile) -> PathBuf {
    let dir = if source.is_at_root() {
        root.join(extraction_folder)
    } else {
        root.join(&source.top_level_folder).join(extraction_folder)
    };
    dir.join(format!("{}.txt", source.stem))
}

/// Convert every source document that has no artifact yet. New artifacts are
/// registered in `index` and returned so they are cataloged in the same run.
/// Failures are logged and leave the source uncorrelated.
pub fn convert_missing(
    root: &Path,
    extraction_folder: &str,
    files: &[ScannedFile],
    index: &mut ExtractionIndex,
    converters: &[Box<dyn Converter>],
) -> Vec<ScannedFile> {
    let mut produced = Vec::new();

    for source in files.iter().filter(|f| is_source_document(f)) {
        if index.artifact_for(source, extraction_folder).is_some() {
            continue;
        }
        let Some(converter) = converters.iter().find(|c| c.handles(&source.extension)) else {
            continue;
        };

        let target = artifact_target(root, extraction_folder, source);
        if target.exists() {
            trace!("Artifact {} exists but was not scanned; leaving it alone", target.display());
            continue;
        }
        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Could not create {}: {}", parent.display(), e);
                continue;
            }
        }

        match converter.convert(&source.path, &target) {
            Ok(()) => {
                info!(
                    "Converted {} ({}) -> {}",
                    source.path.display(),
                    converter.name(),
                    target.display()
                );
                if let Some(artifact) = ScannedFile::from_path(root, &target) {
                    index.register(&artifact.top_level_folder, &artifact.stem, artifact.path.clone());
                    produced.push(artifact);
                }
            }
            Err(e) => {
                error!("Failed to convert {}: {}", source.path.display(), e);
                // Do not leave a partial artifact behind to be picked up next run.
                let _ = fs::remove_file(&target);
            }
        }
    }

    produced
}
