//! Workflow orchestration: decoded inputs in, prepared buffers and artifact files out.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use log::{debug, info, warn};

use crate::buffer::{PixelBuffer, SAVE_FORMATS};
use crate::compositor::{self, EdgeOverlay, DEFAULT_EDGE_COLOR};
use crate::edges::{self, DEFAULT_EDGE_THRESHOLD};
use crate::error::{Error, Result};
use crate::grayscale;
use crate::mask;

/// How the visual cue of a composite is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMethod {
    /// Grayscale the masked zone only.
    Grayscale,
    /// Grayscale the masked zone and outline it in the edge color.
    #[default]
    Bordered,
}

/// Which edit workflow to prepare inputs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    /// RGBA image plus an alpha-channel mask for endpoints with mask support.
    Native,
    /// A single composite image carrying the mask as a visual cue.
    Composite,
}

/// Options controlling mask preparation.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Edge detector cutoff on the clamped Laplacian response.
    pub edge_threshold: u8,
    /// Color of the outline drawn by [`CompositeMethod::Bordered`].
    pub edge_color: [u8; 3],
    /// Resampling filter used when the mask size differs from the image.
    pub filter: FilterType,
    /// Composite style.
    pub method: CompositeMethod,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            edge_color: DEFAULT_EDGE_COLOR,
            filter: FilterType::Triangle,
            method: CompositeMethod::default(),
        }
    }
}

/// Inputs for a native inpainting call.
#[derive(Debug, Clone)]
pub struct NativeEdit {
    /// The source image as RGBA.
    pub image: PixelBuffer,
    /// The normalized single-channel mask, sized to `image`.
    pub mask: PixelBuffer,
    /// RGBA matte: alpha 0 where the image should be edited.
    pub alpha_mask: PixelBuffer,
}

/// Inputs for a mask-less model: one composite image.
#[derive(Debug, Clone)]
pub struct CompositeEdit {
    /// The normalized single-channel mask, sized to the image.
    pub mask: PixelBuffer,
    /// Edge map, present for [`CompositeMethod::Bordered`].
    pub edges: Option<PixelBuffer>,
    /// Opaque RGBA composite.
    pub composite: PixelBuffer,
}

/// Result of preparing a single image file.
#[derive(Debug)]
pub struct PrepareResult {
    /// Path of the processed image.
    pub path: PathBuf,
    /// Whether preparation succeeded.
    pub success: bool,
    /// Artifacts written to the output directory.
    pub artifacts: Vec<PathBuf>,
    /// Human-readable status message.
    pub message: String,
}

/// Prepares images and masks for either edit workflow.
///
/// Holds no state besides its options; one pipeline can serve any number of
/// images, from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct MaskPipeline {
    opts: PipelineOptions,
}

impl MaskPipeline {
    /// Create a pipeline with the given options.
    #[must_use]
    pub fn new(opts: PipelineOptions) -> Self {
        Self { opts }
    }

    /// The options this pipeline runs with.
    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    /// Normalize `mask` to the size of `image` and build the alpha matte.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`mask::normalize`] and [`mask::to_alpha_mask`].
    pub fn prepare_native(
        &self,
        image: &DynamicImage,
        mask_image: &DynamicImage,
    ) -> Result<NativeEdit> {
        let image = PixelBuffer::rgba_from_dynamic(image);
        let (w, h) = image.dimensions();
        let mask = mask::normalize(mask_image, w, h, self.opts.filter)?;
        let alpha_mask = mask::to_alpha_mask(&mask)?;
        debug!("prepared native edit inputs at {w}x{h}");
        Ok(NativeEdit {
            image,
            mask,
            alpha_mask,
        })
    }

    /// Normalize `mask` to the size of `image` and build the composite.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`mask::normalize`] and [`MaskPipeline::composite_buffers`].
    pub fn prepare_composite(
        &self,
        image: &DynamicImage,
        mask_image: &DynamicImage,
    ) -> Result<CompositeEdit> {
        let image = PixelBuffer::rgb_from_dynamic(image);
        let (w, h) = image.dimensions();
        let mask = mask::normalize(mask_image, w, h, self.opts.filter)?;
        self.composite_buffers(&image, mask)
    }

    /// Grayscale the masked zone of `image` and, for the bordered method, outline it.
    ///
    /// # Errors
    ///
    /// Fails on an `image` that is not RGB/RGBA, or a `mask` that is not a
    /// single-channel buffer of the same size.
    pub fn composite_buffers(
        &self,
        image: &PixelBuffer,
        mask: PixelBuffer,
    ) -> Result<CompositeEdit> {
        let gray = grayscale::to_grayscale(image)?;
        let edges = match self.opts.method {
            CompositeMethod::Grayscale => None,
            CompositeMethod::Bordered => {
                Some(edges::detect_edges(&mask, self.opts.edge_threshold)?)
            }
        };
        let overlay = edges
            .as_ref()
            .map(|e| EdgeOverlay::new(e).with_color(self.opts.edge_color));
        let composite = compositor::composite(image, &gray, &mask, overlay)?;
        Ok(CompositeEdit {
            mask,
            edges,
            composite,
        })
    }

    /// Load an image and mask, prepare them for `workflow`, and save the artifacts.
    ///
    /// Never panics or aborts: failures are reported in the returned [`PrepareResult`].
    #[must_use]
    pub fn process_file(
        &self,
        image_path: &Path,
        mask_path: &Path,
        output_dir: &Path,
        workflow: Workflow,
    ) -> PrepareResult {
        let mut result = PrepareResult {
            path: image_path.to_path_buf(),
            success: false,
            artifacts: Vec::new(),
            message: String::new(),
        };

        match self.write_artifacts(image_path, mask_path, output_dir, workflow) {
            Ok(artifacts) => {
                for path in &artifacts {
                    info!("wrote {}", path.display());
                }
                result.success = true;
                result.artifacts = artifacts;
                result.message = match workflow {
                    Workflow::Native => "Alpha mask prepared".to_string(),
                    Workflow::Composite => "Composite prepared".to_string(),
                };
            }
            Err(e) => {
                warn!("{}: {e}", image_path.display());
                result.message = e.to_string();
            }
        }

        result
    }

    fn write_artifacts(
        &self,
        image_path: &Path,
        mask_path: &Path,
        output_dir: &Path,
        workflow: Workflow,
    ) -> Result<Vec<PathBuf>> {
        let image = image::open(image_path).map_err(Error::InvalidImage)?;
        let mask_image = image::open(mask_path).map_err(Error::InvalidImage)?;

        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir)?;
        }

        let mut written = Vec::new();
        let mut save = |buffer: &PixelBuffer, suffix: &str| -> Result<()> {
            let path = artifact_path(output_dir, image_path, suffix);
            buffer.save(&path)?;
            written.push(path);
            Ok(())
        };

        match workflow {
            Workflow::Native => {
                let edit = self.prepare_native(&image, &mask_image)?;
                save(&edit.image, "image")?;
                save(&edit.alpha_mask, "alpha_mask")?;
            }
            Workflow::Composite => {
                let edit = self.prepare_composite(&image, &mask_image)?;
                save(&edit.mask, "mask")?;
                if let Some(edges) = &edit.edges {
                    save(edges, "edges")?;
                }
                save(&edit.composite, "composite")?;
            }
        }

        Ok(written)
    }

    /// Prepare every supported image in `input_dir` against one mask.
    ///
    /// The mask is resampled to each image's size. The mask file itself is
    /// skipped if it lives in `input_dir`. Uses parallel iteration when the
    /// `cli` feature is enabled (via rayon).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        mask_path: &Path,
        output_dir: &Path,
        workflow: Workflow,
    ) -> Vec<PrepareResult> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p) && !same_file(p, mask_path))
                .collect(),
            Err(e) => {
                return vec![PrepareResult {
                    path: input_dir.to_path_buf(),
                    success: false,
                    artifacts: Vec::new(),
                    message: format!("Failed to read directory: {e}"),
                }];
            }
        };
        debug!("{} images found in {}", entries.len(), input_dir.display());

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries
                .par_iter()
                .map(|path| self.process_file(path, mask_path, output_dir, workflow))
                .collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries
                .iter()
                .map(|path| self.process_file(path, mask_path, output_dir, workflow))
                .collect()
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Whether `path` names a format that can be both decoded and written back.
///
/// The extension list follows [`SAVE_FORMATS`], case-insensitively.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok_and(|format| SAVE_FORMATS.contains(&format))
}

/// Path of an artifact derived from `input`, always PNG.
///
/// The input extension is part of the name so that `a.png` and `a.bmp` in one
/// directory never write to the same file.
/// Example: `("out", "photo.jpg", "composite")` becomes `"out/photo_jpg_composite.png"`.
#[must_use]
pub fn artifact_path(output_dir: &Path, input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    match input.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy();
            output_dir.join(format!("{stem}_{ext}_{suffix}.png"))
        }
        None => output_dir.join(format!("{stem}_{suffix}.png")),
    }
}
