//! Positional pairing of images and captions plus bounds-checked navigation.

use crate::error::{CaptionError, Result};
use std::path::{Path, PathBuf};

/// One image together with the caption file that describes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pair<'a> {
    pub image: &'a Path,
    pub caption: &'a Path,
}

/// The navigable collection. `images[i]` goes with `captions[i]`.
///
/// Both lists are fixed at construction; only `position` moves, and it
/// never leaves `0..size()`.
#[derive(Debug, Clone)]
pub struct Collection {
    images: Vec<PathBuf>,
    captions: Vec<PathBuf>,
    position: usize,
}

impl Collection {
    pub fn new(images: Vec<PathBuf>, captions: Vec<PathBuf>) -> Result<Self> {
        if images.is_empty() || captions.is_empty() {
            return Err(CaptionError::EmptyCollection {
                images: images.len(),
                captions: captions.len(),
            });
        }
        Ok(Self {
            images,
            captions,
            position: 0,
        })
    }

    /// Number of navigable positions: the shorter of the two lists.
    pub fn size(&self) -> usize {
        self.images.len().min(self.captions.len())
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> Pair<'_> {
        self.pair_at(self.position)
    }

    /// Step forward. At the last pair this is a no-op.
    pub fn next(&mut self) -> Pair<'_> {
        if self.position + 1 < self.size() {
            self.position += 1;
        }
        self.current()
    }

    /// Step back. At the first pair this is a no-op.
    pub fn previous(&mut self) -> Pair<'_> {
        if self.position > 0 {
            self.position -= 1;
        }
        self.current()
    }

    /// Jump to an explicit position, e.g. a row picked from the list.
    pub fn seek(&mut self, index: usize) -> Result<Pair<'_>> {
        let len = self.size();
        if index >= len {
            return Err(CaptionError::IndexOutOfRange { index, len });
        }
        self.position = index;
        Ok(self.current())
    }

    pub fn is_at_first(&self) -> bool {
        self.position == 0
    }

    pub fn is_at_last(&self) -> bool {
        self.position + 1 == self.size()
    }

    /// Counter shown above the image, 1-based.
    pub fn progress_label(&self) -> String {
        format!("Image {}/{}", self.position + 1, self.size())
    }

    pub fn pairs(&self) -> impl Iterator<Item = Pair<'_>> + '_ {
        (0..self.size()).map(|i| self.pair_at(i))
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn captions(&self) -> &[PathBuf] {
        &self.captions
    }

    fn pair_at(&self, index: usize) -> Pair<'_> {
        Pair {
            image: &self.images[index],
            caption: &self.captions[index],
        }
    }
}
