//! Subcommand runners
//!
//! Each runner writes one JSON document to `out` and reports whether the
//! command fully succeeded.

use crate::cli::loader_config;
use crate::fs_source::FsImageSource;
use anyhow::{bail, Context};
use clap::ArgMatches;
use image::ImageFormat;
use imgload_core::{ImageLoader, ImageSizes, LoadOptions, LoadResult, RemoteResolver};
use imgload_remote::StorageUrlResolver;
use imgload_transcode::{compress_image_async, ImageFile};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Outcome of `compress`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressReport {
    /// Written file
    pub output: PathBuf,
    /// Output MIME type
    pub mime_type: String,
    /// Input size in bytes
    pub before_bytes: usize,
    /// Output size in bytes
    pub after_bytes: usize,
}

/// Outcome of `sizes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizesReport {
    /// URL the variants derive from
    pub url: String,
    /// Whether the URL has variants at all
    pub supports_variants: bool,
    /// One URL per preset
    pub sizes: ImageSizes,
}

/// Dispatch the parsed command line
///
/// # Errors
///
/// Setup failures: bad config, unreadable input, unresolvable path. Per-image
/// load failures are reported in the output instead.
pub async fn run(matches: &ArgMatches, out: &mut impl Write) -> anyhow::Result<bool> {
    match matches.subcommand() {
        Some(("compress", args)) => {
            let input = required::<PathBuf>(args, "input")?;
            let output = required::<PathBuf>(args, "output")?;
            let report = compress(
                input,
                output,
                *required::<u32>(args, "max-width")?,
                *required::<u32>(args, "max-height")?,
                *required::<f32>(args, "quality")?,
            )
            .await?;
            emit(out, &report)?;
            Ok(true)
        }
        Some(("sizes", args)) => {
            let target = required::<String>(args, "target")?;
            let bucket = args.get_one::<String>("bucket").map(String::as_str);
            let report = sizes(target, bucket).await?;
            emit(out, &report)?;
            Ok(true)
        }
        Some(("probe", args)) => {
            let paths: Vec<&str> = args
                .get_many::<String>("paths")
                .context("no paths given")?
                .map(String::as_str)
                .collect();
            let source = match args.get_one::<PathBuf>("root") {
                Some(root) => FsImageSource::with_root(root),
                None => FsImageSource::new(),
            };
            let mut options = LoadOptions::new();
            if let Some(fallback) = args.get_one::<String>("fallback") {
                options = options.with_fallback(fallback.as_str());
            }
            let loader = ImageLoader::with_config(Arc::new(source), loader_config(matches)?)?;

            let results = probe(&loader, &paths, &options).await;
            emit(out, &results)?;
            Ok(results.iter().all(|r| r.success))
        }
        Some((other, _)) => bail!("unknown subcommand {other}"),
        None => bail!("no subcommand given"),
    }
}

/// Compress `input` into `output`
///
/// The output extension picks the encoder; unknown extensions keep the
/// input's format.
///
/// # Errors
///
/// I/O and transcoding failures.
pub async fn compress(
    input: &Path,
    output: &Path,
    max_width: u32,
    max_height: u32,
    quality: f32,
) -> anyhow::Result<CompressReport> {
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let before_bytes = bytes.len();
    let name = input
        .file_name()
        .map_or_else(|| input.display().to_string(), |n| n.to_string_lossy().into_owned());

    let mut file = ImageFile::sniff(name, bytes)?;
    if let Ok(format) = ImageFormat::from_path(output) {
        file.mime_type = format.to_mime_type().to_string();
    }

    let compressed = compress_image_async(file, max_width, max_height, quality).await?;
    tokio::fs::write(output, &compressed.bytes)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    info!(output = %output.display(), bytes = compressed.bytes.len(), "wrote compressed image");

    Ok(CompressReport {
        output: output.to_path_buf(),
        mime_type: compressed.mime_type,
        before_bytes,
        after_bytes: compressed.bytes.len(),
    })
}

/// Size variants of `target`, resolving it as a storage path when a bucket is given
///
/// # Errors
///
/// Fails when the storage path is invalid.
pub async fn sizes(target: &str, bucket: Option<&str>) -> anyhow::Result<SizesReport> {
    let url = match bucket {
        Some(bucket) => StorageUrlResolver::new(bucket)
            .resolve(target)
            .await
            .with_context(|| format!("resolving {target} in bucket {bucket}"))?,
        None => target.to_string(),
    };
    Ok(SizesReport {
        supports_variants: imgload_core::sizes::supports_size_variants(&url),
        sizes: imgload_core::generate_image_sizes(&url),
        url,
    })
}

/// Load every path concurrently; results follow input order
pub async fn probe(loader: &ImageLoader, paths: &[&str], options: &LoadOptions) -> Vec<LoadResult> {
    let results = loader.preload_images(paths, options).await;
    let loaded = results.iter().filter(|r| r.success).count();
    info!(loaded, failed = results.len() - loaded, "probe finished");
    results
}

fn required<'a, T>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(id)
        .with_context(|| format!("missing argument {id}"))
}

fn emit(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
