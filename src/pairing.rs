//! Directory listing and the image/caption pairing step.
//!
//! Two sorted listings are only trustworthy as pairs if their file stems
//! line up. `Position` keeps the listings as they are and reports every slot
//! where the stems differ; `Stem` builds the caption list from the image
//! names instead, so a missing or extra caption cannot shift later pairs.

use crate::error::{CaptionError, Result};
use glob::{MatchOptions, Pattern, glob_with};
use log::{debug, warn};
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const IMAGE_PATTERNS: [&str; 8] = [
    "*.png", "*.jpg", "*.jpeg", "*.bmp", "*.webp", "*.tif", "*.tiff", "*.gif",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingMode {
    /// Nth image goes with Nth caption in sorted order.
    #[default]
    Position,
    /// Caption path is `<caption_dir>/<image stem>.<ext>`.
    Stem,
}

impl FromStr for PairingMode {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "position" | "positional" => Ok(PairingMode::Position),
            "stem" | "name" => Ok(PairingMode::Stem),
            other => Err(CaptionError::config(format!(
                "unknown pairing mode {other:?} (expected \"position\" or \"stem\")"
            ))),
        }
    }
}

/// Outcome of pairing two directories.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub images: Vec<PathBuf>,
    pub captions: Vec<PathBuf>,
    /// Positions whose image and caption stems differ.
    pub mismatched: Vec<usize>,
    /// Images with no caption partner.
    pub unpaired_images: Vec<PathBuf>,
    /// Captions with no image partner.
    pub unpaired_captions: Vec<PathBuf>,
}

impl Pairing {
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty()
            && self.unpaired_images.is_empty()
            && self.unpaired_captions.is_empty()
    }

    /// Fail if any pair joins files with different stems, or if either
    /// directory has files left without a partner.
    pub fn ensure_consistent(&self) -> Result<()> {
        if let Some(&first) = self.mismatched.first() {
            return Err(CaptionError::PairingMismatch {
                count: self.mismatched.len(),
                first,
            });
        }
        if !self.unpaired_images.is_empty() || !self.unpaired_captions.is_empty() {
            return Err(CaptionError::UnpairedFiles {
                images: self.unpaired_images.len(),
                captions: self.unpaired_captions.len(),
            });
        }
        Ok(())
    }

    fn log_problems(&self) {
        for &i in &self.mismatched {
            warn!(
                "pair #{i} joins {} with {}",
                self.images[i].display(),
                self.captions[i].display()
            );
        }
        for p in &self.unpaired_images {
            warn!("no caption for image {}", p.display());
        }
        for p in &self.unpaired_captions {
            warn!("no image for caption {}", p.display());
        }
    }
}

fn list_matching(dir: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let mut out = vec![];
    for pat in patterns {
        let root = Pattern::escape(&dir.to_string_lossy());
        let globpat = Path::new(&root).join(pat).to_string_lossy().to_string();
        let entries = glob_with(&globpat, options).map_err(|e| CaptionError::Scan {
            pattern: globpat.clone(),
            reason: e.to_string(),
        })?;
        for entry in entries {
            match entry {
                Ok(p) if p.is_file() => out.push(p),
                Ok(_) => {}
                Err(e) => warn!("skipping unreadable entry: {e}"),
            }
        }
    }
    out.sort();
    out.dedup();
    Ok(out)
}

pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    list_matching(dir, &IMAGE_PATTERNS)
}

pub fn list_captions(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!("*.{}", extension.trim_start_matches('.'));
    list_matching(dir, &[pattern.as_str()])
}

pub fn caption_path_for_image(image: &Path, caption_dir: &Path, extension: &str) -> PathBuf {
    // stems like "photo.v2" keep their dots
    let mut name = image
        .file_stem()
        .unwrap_or_else(|| OsStr::new(""))
        .to_os_string();
    name.push(".");
    name.push(extension.trim_start_matches('.'));
    caption_dir.join(name)
}

/// Pair the files of two directories. Problems are logged and reported,
/// never silently dropped.
pub fn pair_directories(
    image_dir: &Path,
    caption_dir: &Path,
    extension: &str,
    mode: PairingMode,
) -> Result<Pairing> {
    let images = list_images(image_dir)?;
    let captions = list_captions(caption_dir, extension)?;
    debug!(
        "found {} image(s) in {} and {} caption(s) in {}",
        images.len(),
        image_dir.display(),
        captions.len(),
        caption_dir.display()
    );
    let pairing = match mode {
        PairingMode::Position => pair_by_position(images, captions),
        PairingMode::Stem => pair_by_stem(images, captions, caption_dir, extension),
    };
    pairing.log_problems();
    Ok(pairing)
}

pub fn pair_by_position(images: Vec<PathBuf>, captions: Vec<PathBuf>) -> Pairing {
    let len = images.len().min(captions.len());
    let mismatched = (0..len)
        .filter(|&i| images[i].file_stem() != captions[i].file_stem())
        .collect();
    Pairing {
        unpaired_images: images[len..].to_vec(),
        unpaired_captions: captions[len..].to_vec(),
        mismatched,
        images,
        captions,
    }
}

pub fn pair_by_stem(
    images: Vec<PathBuf>,
    captions: Vec<PathBuf>,
    caption_dir: &Path,
    extension: &str,
) -> Pairing {
    let mut pairing = Pairing::default();
    for image in images {
        let caption = caption_path_for_image(&image, caption_dir, extension);
        if captions.contains(&caption) {
            pairing.images.push(image);
            pairing.captions.push(caption);
        } else {
            pairing.unpaired_images.push(image);
        }
    }
    pairing.unpaired_captions = captions
        .into_iter()
        .filter(|c| !pairing.captions.contains(c))
        .collect();
    pairing
}
