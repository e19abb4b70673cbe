//! Testing utilities for imgload workspace
//!
//! Shared test sources, resolvers, and image fixtures.

#![allow(missing_docs, clippy::cast_possible_truncation, clippy::must_use_candidate)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use imgload_core::{ImageSource, RemoteResolver, ResolveError, SourceError};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a scripted URL does when loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    NotFound,
    Network,
    Hang,
    /// Sleep, then succeed
    Delay(Duration),
}

/// Image source driven by per-URL scripts
///
/// Each URL has a queue of behaviors consumed one per call; once a queue is
/// empty the URL falls back to its fixed behavior, then the default.
#[derive(Debug)]
pub struct ScriptedSource {
    default: Behavior,
    fixed: HashMap<String, Behavior>,
    scripts: Mutex<HashMap<String, VecDeque<Behavior>>>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(default: Behavior) -> Self {
        Self {
            default,
            fixed: HashMap::new(),
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Behavior::Succeed)
    }

    pub fn script(self, url: &str, behaviors: impl IntoIterator<Item = Behavior>) -> Self {
        self.scripts
            .lock()
            .insert(url.to_string(), behaviors.into_iter().collect());
        self
    }

    /// Every call to `url` behaves as `behavior`
    pub fn always(mut self, url: &str, behavior: Behavior) -> Self {
        self.fixed.insert(url.to_string(), behavior);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    /// Highest number of loads observed running at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    fn next_behavior(&self, url: &str) -> Behavior {
        self.scripts
            .lock()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.fixed.get(url).cloned())
            .unwrap_or_else(|| self.default.clone())
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageSource for ScriptedSource {
    async fn load(&self, url: &str) -> Result<(), SourceError> {
        self.calls.lock().push(url.to_string());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.active);

        match self.next_behavior(url) {
            Behavior::Succeed => Ok(()),
            Behavior::NotFound => Err(SourceError::NotFound(url.to_string())),
            Behavior::Network => Err(SourceError::Network("connection reset".to_string())),
            Behavior::Hang => futures::future::pending().await,
            Behavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

/// Resolver backed by a fixed path table
#[derive(Debug, Default)]
pub struct StaticResolver {
    table: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, url: &str) -> Self {
        self.table.insert(path.to_string(), url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteResolver for StaticResolver {
    async fn resolve(&self, path: &str) -> Result<String, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table
            .get(path)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(path.to_string()))
    }
}

/// Gradient so resized output is not trivially uniform
pub fn rgb_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn rgba_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
    });
    DynamicImage::ImageRgba8(img)
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&rgba_image(width, height), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&rgb_image(width, height), ImageFormat::Jpeg)
}
