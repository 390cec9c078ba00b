//! Background image decoding with a single worker slot.
//!
//! A new request joins the previous worker before spawning the next one, so
//! at most one decode is in flight and results arrive in request order.

use crate::error::{CaptionError, Result};
use crossbeam_channel::{Receiver, Sender, unbounded};
use image::GenericImageView;
use log::{debug, error};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Decoded pixels ready to upload as a texture.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// `[width, height]` of `rgba` after downscaling.
    pub size: [usize; 2],
    pub rgba: Vec<u8>,
    /// Dimensions of the file on disk.
    pub original_size: (u32, u32),
}

#[derive(Debug)]
pub struct ImageLoad {
    pub ticket: u64,
    pub path: PathBuf,
    pub result: Result<DecodedImage>,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

pub struct ImageLoader {
    max_edge: u32,
    tx: Sender<ImageLoad>,
    rx: Receiver<ImageLoad>,
    worker: Option<JoinHandle<()>>,
    last_ticket: u64,
    waker: Option<Waker>,
}

impl ImageLoader {
    pub fn new(max_edge: u32) -> Self {
        let (tx, rx) = unbounded();
        Self {
            max_edge: max_edge.max(1),
            tx,
            rx,
            worker: None,
            last_ticket: 0,
            waker: None,
        }
    }

    /// Called from the worker after each result is sent, e.g. to wake the UI.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    /// Start decoding `path`. Blocks until the previous decode has finished.
    pub fn request(&mut self, path: impl Into<PathBuf>) -> u64 {
        self.wait();
        self.last_ticket += 1;
        let ticket = self.last_ticket;
        let path = path.into();
        let max_edge = self.max_edge;
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        debug!("loading image #{ticket}: {}", path.display());

        let spawned = thread::Builder::new()
            .name("image-loader".to_owned())
            .spawn({
                let path = path.clone();
                move || {
                    let result = decode_image(&path, max_edge);
                    let _ = tx.send(ImageLoad {
                        ticket,
                        path,
                        result,
                    });
                    if let Some(wake) = waker {
                        wake();
                    }
                }
            });
        match spawned {
            Ok(handle) => self.worker = Some(handle),
            Err(e) => {
                error!("could not start image worker: {e}");
                let _ = self.tx.send(ImageLoad {
                    ticket,
                    result: Err(CaptionError::read(&path, e)),
                    path,
                });
            }
        }
        ticket
    }

    /// Block until the in-flight decode, if any, has finished.
    pub fn wait(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("image worker panicked");
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn last_ticket(&self) -> u64 {
        self.last_ticket
    }

    pub fn try_recv(&self) -> Option<ImageLoad> {
        self.rx.try_recv().ok()
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        self.wait();
    }
}

/// Decode `path` and shrink it so neither edge exceeds `max_edge`.
pub fn decode_image(path: &Path, max_edge: u32) -> Result<DecodedImage> {
    let dynimg = image::io::Reader::open(path)
        .map_err(|e| CaptionError::read(path, e))?
        .with_guessed_format()
        .map_err(|e| CaptionError::read(path, e))?
        .decode()
        .map_err(|e| CaptionError::read(path, io::Error::new(io::ErrorKind::InvalidData, e)))?;
    let original_size = dynimg.dimensions();
    let (w, h) = original_size;
    let dynimg = if w > max_edge || h > max_edge {
        dynimg.thumbnail(max_edge, max_edge)
    } else {
        dynimg
    };
    let (w, h) = dynimg.dimensions();
    Ok(DecodedImage {
        size: [w as usize, h as usize],
        rgba: dynimg.to_rgba8().into_vec(),
        original_size,
    })
}
