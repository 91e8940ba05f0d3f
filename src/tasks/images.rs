//! Image optimization and modern-format conversion

use std::fs;

use anyhow::{Context, Result};
use tracing::debug;

use super::{Task, TaskContext, TaskReport};
use crate::config::{Asset, AssetPaths};
use crate::sources::{SourceFile, SourceSet};
use crate::transform::raster::{self, RasterKind};
use crate::transform::TransformError;

fn image_sources(ctx: &TaskContext) -> Result<(AssetPaths, Vec<SourceFile>)> {
    let paths = ctx.config.assets(Asset::Images);
    let files = SourceSet::new(&paths.base, &paths.include)?.files()?;
    Ok((paths, files))
}

fn read(file: &SourceFile) -> Result<Vec<u8>> {
    fs::read(&file.path).with_context(|| format!("Failed to read {}", file.path.display()))
}

/// Recompresses JPEG/PNG files and copies everything else through
pub struct ImagesTask;

impl Task for ImagesTask {
    fn name(&self) -> &'static str {
        "images"
    }

    fn run(&self, ctx: &TaskContext) -> Result<TaskReport> {
        let options = &ctx.config.images;
        let (paths, files) = image_sources(ctx)?;
        let mut report = TaskReport::new(self.name());

        for file in files {
            let bytes = read(&file)?;

            let output = match file.extension().as_deref().and_then(RasterKind::from_extension) {
                Some(kind) => {
                    let optimized = raster::optimize(
                        &bytes,
                        kind,
                        options.jpeg_quality,
                        options.png_compression,
                    )
                    .with_context(|| format!("Failed to optimize {}", file.path.display()))?;
                    debug!(
                        "{}: {} -> {} bytes",
                        file.relative.display(),
                        bytes.len(),
                        optimized.len()
                    );
                    optimized
                }
                None => bytes,
            };

            report.write(&file.output_path(&paths.output), output)?;
        }

        Ok(report)
    }
}

/// Emit a converted sibling for every decodable raster image
fn convert_all(
    name: &'static str,
    ctx: &TaskContext,
    ext: &str,
    convert: impl Fn(&[u8], RasterKind) -> Result<Vec<u8>, TransformError>,
) -> Result<TaskReport> {
    let (paths, files) = image_sources(ctx)?;
    let mut report = TaskReport::new(name);

    for file in files {
        let Some(kind) = file.extension().as_deref().and_then(RasterKind::from_extension) else {
            continue;
        };

        let bytes = read(&file)?;
        let converted = convert(&bytes, kind)
            .with_context(|| format!("Failed to convert {} to {}", file.path.display(), ext))?;

        let target = file.output_with_extension(&paths.output, ext);
        report.write(&target, converted)?;
    }

    Ok(report)
}

/// Converts JPEG/PNG images to lossless WebP siblings
pub struct WebpTask;

impl Task for WebpTask {
    fn name(&self) -> &'static str {
        "webp"
    }

    fn run(&self, ctx: &TaskContext) -> Result<TaskReport> {
        if !ctx.config.images.webp {
            return Ok(TaskReport::new(self.name()));
        }

        convert_all(self.name(), ctx, "webp", raster::to_webp)
    }
}

/// Converts JPEG/PNG images to AVIF siblings
pub struct AvifTask;

impl Task for AvifTask {
    fn name(&self) -> &'static str {
        "avif"
    }

    fn run(&self, ctx: &TaskContext) -> Result<TaskReport> {
        let options = &ctx.config.images;
        if !options.avif {
            return Ok(TaskReport::new(self.name()));
        }

        convert_all(self.name(), ctx, "avif", |bytes, kind| {
            raster::to_avif(bytes, kind, options.avif_quality, options.avif_speed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::tasks::tests::fixture;
    use std::sync::Arc;

    #[test]
    fn test_optimizes_rasters_and_copies_the_rest() {
        let (dir, ctx) = fixture();
        let report = ImagesTask.run(&ctx).unwrap();

        assert_eq!(report.outputs.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("dist/img/icon.svg")).unwrap(),
            "<svg></svg>"
        );

        let png = fs::read(dir.path().join("dist/img/photo.png")).unwrap();
        let original = fs::read(dir.path().join("app/images/photo.png")).unwrap();
        assert!(png.len() <= original.len());
    }

    #[test]
    fn test_conversions_skip_non_rasters() {
        let (dir, ctx) = fixture();

        let webp = WebpTask.run(&ctx).unwrap();
        assert_eq!(webp.outputs.len(), 1);
        assert!(dir.path().join("dist/img/photo.webp").is_file());
        assert!(!dir.path().join("dist/img/icon.webp").exists());

        let avif = AvifTask.run(&ctx).unwrap();
        assert_eq!(avif.outputs.len(), 1);
        assert!(dir.path().join("dist/img/photo.avif").is_file());
    }

    #[test]
    fn test_conversions_can_be_disabled() {
        let (dir, _) = fixture();
        let mut config = Config::default_config(dir.path());
        config.images.webp = false;
        config.images.avif = false;
        let ctx = TaskContext::new(Arc::new(config));

        assert!(WebpTask.run(&ctx).unwrap().outputs.is_empty());
        assert!(AvifTask.run(&ctx).unwrap().outputs.is_empty());
    }

    #[test]
    fn test_corrupt_raster_fails() {
        let (dir, ctx) = fixture();
        fs::write(dir.path().join("app/images/bad.jpg"), "not a jpeg").unwrap();
        assert!(ImagesTask.run(&ctx).is_err());
    }
}
