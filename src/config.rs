//! Startup configuration: command line, optionally backed by a TOML file.

use crate::error::{CaptionError, Result};
use crate::pairing::PairingMode;
use log::debug;
use pico_args::Arguments;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CAPTION_EXTENSION: &str = "txt";
pub const DEFAULT_MAX_PREVIEW: u32 = 1024;

pub const USAGE: &str = "\
Browse image/caption pairs and edit captions in place.

USAGE:
    caption-annotator [OPTIONS] [IMAGE_DIR CAPTION_DIR]

OPTIONS:
    --config <FILE>        TOML file with any of the keys below
    --images <DIR>         directory holding the images      (image_dir)
    --captions <DIR>       directory holding the captions    (caption_dir)
    --pairing <MODE>       position | stem                   (pairing)
    --caption-ext <EXT>    caption file extension, default txt (caption_extension)
    --strict               refuse to start if pairs disagree (strict_pairing)
    --max-preview <PX>     longest preview edge, default 1024 (max_preview)
    -h, --help             print this help
";

/// Keys accepted in the TOML file. Everything is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub image_dir: Option<PathBuf>,
    pub caption_dir: Option<PathBuf>,
    pub pairing: Option<PairingMode>,
    pub caption_extension: Option<String>,
    pub strict_pairing: Option<bool>,
    pub max_preview: Option<u32>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CaptionError::config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CaptionError::read(path, e))?;
        debug!("read configuration from {}", path.display());
        Self::parse(&text)
    }

    /// Fill unset fields from `fallback`.
    fn or(self, fallback: FileConfig) -> FileConfig {
        FileConfig {
            image_dir: self.image_dir.or(fallback.image_dir),
            caption_dir: self.caption_dir.or(fallback.caption_dir),
            pairing: self.pairing.or(fallback.pairing),
            caption_extension: self.caption_extension.or(fallback.caption_extension),
            strict_pairing: self.strict_pairing.or(fallback.strict_pairing),
            max_preview: self.max_preview.or(fallback.max_preview),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub image_dir: PathBuf,
    pub caption_dir: PathBuf,
    pub pairing: PairingMode,
    pub caption_extension: String,
    pub strict_pairing: bool,
    pub max_preview: u32,
}

impl Config {
    /// Parse the command line. A `--config` file supplies anything the
    /// command line leaves out.
    pub fn from_args(mut args: Arguments) -> Result<Self> {
        let bad = |e: pico_args::Error| CaptionError::config(e.to_string());
        let config_file: Option<PathBuf> = args.opt_value_from_str("--config").map_err(bad)?;
        let mut cli = FileConfig {
            image_dir: args.opt_value_from_str("--images").map_err(bad)?,
            caption_dir: args.opt_value_from_str("--captions").map_err(bad)?,
            pairing: args.opt_value_from_str("--pairing").map_err(bad)?,
            caption_extension: args.opt_value_from_str("--caption-ext").map_err(bad)?,
            strict_pairing: args.contains("--strict").then_some(true),
            max_preview: args.opt_value_from_str("--max-preview").map_err(bad)?,
        };

        let mut positional = args.finish().into_iter();
        let mut next_dir = |slot: &mut Option<PathBuf>| {
            if slot.is_none() {
                *slot = positional.next().map(PathBuf::from);
            }
        };
        next_dir(&mut cli.image_dir);
        next_dir(&mut cli.caption_dir);
        let extra: Vec<OsString> = positional.collect();
        if !extra.is_empty() {
            return Err(CaptionError::config(format!(
                "unexpected arguments: {extra:?}"
            )));
        }

        let file = match config_file {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli.or(file))
    }

    pub fn resolve(raw: FileConfig) -> Result<Self> {
        let image_dir = raw
            .image_dir
            .ok_or_else(|| CaptionError::config("no image directory given"))?;
        let caption_dir = raw
            .caption_dir
            .ok_or_else(|| CaptionError::config("no caption directory given"))?;
        let caption_extension = raw
            .caption_extension
            .map(|ext| ext.trim_start_matches('.').to_owned())
            .unwrap_or_else(|| DEFAULT_CAPTION_EXTENSION.to_owned());
        if caption_extension.is_empty() {
            return Err(CaptionError::config("caption extension is empty"));
        }
        let max_preview = raw.max_preview.unwrap_or(DEFAULT_MAX_PREVIEW);
        if max_preview == 0 {
            return Err(CaptionError::config("max_preview must be positive"));
        }
        Ok(Config {
            image_dir,
            caption_dir,
            pairing: raw.pairing.unwrap_or_default(),
            caption_extension,
            strict_pairing: raw.strict_pairing.unwrap_or(false),
            max_preview,
        })
    }

    /// Both directories must exist before anything is listed.
    pub fn validate(&self) -> Result<()> {
        for (what, dir) in [("image", &self.image_dir), ("caption", &self.caption_dir)] {
            if !dir.is_dir() {
                return Err(CaptionError::config(format!(
                    "{what} directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}
