//! Mask-driven image editing prep for image-generation APIs.
//!
//! Two workflows share one pixel pipeline:
//!
//! - **Native inpainting**: a binary mask (255 = edit, 0 = keep) becomes an
//!   RGBA matte whose alpha is `255 - mask`, the format edit endpoints expect.
//! - **Composite cue**: for models without mask support, the masked zone is
//!   blended toward grayscale and optionally outlined with a Laplacian edge
//!   ring, producing one opaque image that shows the model where to edit.
//!
//! # Quick Start
//!
//! ```no_run
//! use mask_inpaint::{MaskPipeline, PipelineOptions};
//!
//! let pipeline = MaskPipeline::new(PipelineOptions::default());
//! let image = image::open("photo.png").unwrap();
//! let mask = image::open("mask.png").unwrap();
//!
//! let native = pipeline.prepare_native(&image, &mask).unwrap();
//! native.alpha_mask.save("alpha_mask.png".as_ref()).unwrap();
//!
//! let cue = pipeline.prepare_composite(&image, &mask).unwrap();
//! cue.composite.save("composite.png".as_ref()).unwrap();
//! ```
//!
//! # Building blocks
//!
//! Every stage is a pure function over [`PixelBuffer`]s and can be used on its own:
//!
//! ```
//! use mask_inpaint::mask::{rect_mask, to_alpha_mask, Rect};
//!
//! let mask = rect_mask(4, 4, Rect { x: 1, y: 1, width: 2, height: 2 }).unwrap();
//! let alpha = to_alpha_mask(&mask).unwrap();
//! assert_eq!(alpha.pixel(1, 1), Some(&[0, 0, 0, 0][..]));
//! assert_eq!(alpha.pixel(0, 0), Some(&[0, 0, 0, 255][..]));
//! ```

#![deny(missing_docs)]

pub mod buffer;
pub mod compositor;
pub mod edges;
pub mod error;
pub mod grayscale;
pub mod mask;
mod pipeline;
pub mod service;

pub use buffer::PixelBuffer;
pub use error::{Error, Result};
pub use pipeline::{
    artifact_path, is_supported_image, CompositeEdit, CompositeMethod, MaskPipeline, NativeEdit,
    PipelineOptions, PrepareResult, Workflow,
};
