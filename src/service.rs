//! Boundary with the external image-generation service.
//!
//! This crate does not talk to the network. Callers implement [`EditService`]
//! over their HTTP client of choice; this module defines the request and
//! response shapes, the explicit credentials value, and the sequential batch
//! runner used to try several prompts against the same inputs.

use std::fmt;
use std::str::FromStr;

use log::{info, warn};

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};
use crate::pipeline::NativeEdit;

/// Environment variable read by [`ServiceConfig::from_env`].
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Output size accepted by the edit endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    /// 1024x1024.
    Square,
    /// 1536x1024.
    Landscape,
    /// 1024x1536.
    Portrait,
    /// Let the service pick.
    #[default]
    Auto,
}

impl ImageSize {
    /// Pixel dimensions, or `None` for [`ImageSize::Auto`].
    #[must_use]
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            Self::Square => Some((1024, 1024)),
            Self::Landscape => Some((1536, 1024)),
            Self::Portrait => Some((1024, 1536)),
            Self::Auto => None,
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dimensions() {
            Some((w, h)) => write!(f, "{w}x{h}"),
            None => f.write_str("auto"),
        }
    }
}

impl FromStr for ImageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1024x1024" => Ok(Self::Square),
            "1536x1024" => Ok(Self::Landscape),
            "1024x1536" => Ok(Self::Portrait),
            "auto" => Ok(Self::Auto),
            other => Err(Error::Service(format!("unsupported size '{other}'"))),
        }
    }
}

/// Rendering quality requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    /// Fastest, cheapest.
    Low,
    /// Balanced.
    Medium,
    /// Best quality.
    #[default]
    High,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(Error::Service(format!("unsupported quality '{other}'"))),
        }
    }
}

/// Credentials and defaults handed to an [`EditService`] at construction.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Bearer token for the service.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Size used by [`ServiceConfig::request`].
    pub size: ImageSize,
    /// Quality used by [`ServiceConfig::request`].
    pub quality: Quality,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("size", &self.size)
            .field("quality", &self.quality)
            .finish()
    }
}

impl ServiceConfig {
    /// Config with the given key and default model, size and quality.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gpt-image-1".to_string(),
            size: ImageSize::default(),
            quality: Quality::default(),
        }
    }

    /// Read the key from [`API_KEY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(Error::Service(format!("{API_KEY_ENV} is not set"))),
        }
    }

    /// A request for `prompt` using this config's size and quality.
    #[must_use]
    pub fn request(&self, prompt: impl Into<String>) -> EditRequest {
        EditRequest {
            prompt: prompt.into(),
            size: self.size,
            quality: self.quality,
        }
    }
}

/// One edit call's parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    /// Text instruction.
    pub prompt: String,
    /// Requested output size.
    pub size: ImageSize,
    /// Requested quality.
    pub quality: Quality,
}

/// Encoded images sent to the service.
#[derive(Debug, Clone)]
pub enum EditInput {
    /// Image plus alpha mask for endpoints with native mask support.
    Masked {
        /// PNG-encoded RGBA image.
        image: Vec<u8>,
        /// PNG-encoded RGBA alpha mask.
        mask: Vec<u8>,
    },
    /// A single composite carrying the mask as a visual cue.
    Composite {
        /// PNG-encoded composite.
        image: Vec<u8>,
    },
}

impl EditInput {
    /// Encode the outputs of [`crate::MaskPipeline::prepare_native`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if PNG encoding fails.
    pub fn masked(edit: &NativeEdit) -> Result<Self> {
        Ok(Self::Masked {
            image: edit.image.encode_png()?,
            mask: edit.alpha_mask.encode_png()?,
        })
    }

    /// Encode a composite buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if PNG encoding fails.
    pub fn composite(composite: &PixelBuffer) -> Result<Self> {
        Ok(Self::Composite {
            image: composite.encode_png()?,
        })
    }
}

/// Where the generated image can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Encoded image bytes returned inline.
    Bytes(Vec<u8>),
    /// URL the caller must fetch.
    Url(String),
}

/// The service's answer to one edit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutput {
    /// Generated image.
    pub payload: ImagePayload,
    /// Prompt as rewritten by the service, if it reports one.
    pub revised_prompt: Option<String>,
}

/// A client for the external edit endpoint.
///
/// Implementations own their [`ServiceConfig`]; network and authentication
/// failures are returned as [`Error::Service`].
pub trait EditService {
    /// Run one edit.
    ///
    /// # Errors
    ///
    /// Any failure of the remote call.
    fn edit(&self, input: &EditInput, request: &EditRequest) -> Result<EditOutput>;
}

/// Outcome of one prompt in a batch.
#[derive(Debug)]
pub struct BatchItem {
    /// The request that was sent.
    pub request: EditRequest,
    /// What the service returned.
    pub outcome: Result<EditOutput>,
}

impl BatchItem {
    /// Whether the call succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Send each request in order against the same input.
///
/// Calls are strictly sequential. A failed item is recorded and the batch
/// moves on to the next request.
pub fn run_batch<S, I>(service: &S, input: &EditInput, requests: I) -> Vec<BatchItem>
where
    S: EditService + ?Sized,
    I: IntoIterator<Item = EditRequest>,
{
    let mut items = Vec::new();
    for (i, request) in requests.into_iter().enumerate() {
        let outcome = service.edit(input, &request);
        match &outcome {
            Ok(_) => info!("batch item {} succeeded: {}", i + 1, request.prompt),
            Err(e) => warn!("batch item {} failed: {e}", i + 1),
        }
        items.push(BatchItem { request, outcome });
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recording {
        seen: RefCell<Vec<String>>,
    }

    impl EditService for Recording {
        fn edit(&self, _input: &EditInput, request: &EditRequest) -> Result<EditOutput> {
            self.seen.borrow_mut().push(request.prompt.clone());
            if request.prompt.contains("fail") {
                return Err(Error::Service("rate limited".to_string()));
            }
            Ok(EditOutput {
                payload: ImagePayload::Url(format!("https://example.invalid/{}", request.prompt)),
                revised_prompt: None,
            })
        }
    }

    #[test]
    fn batch_isolates_failures_and_keeps_order() {
        let service = Recording {
            seen: RefCell::new(Vec::new()),
        };
        let config = ServiceConfig::new("k");
        let input = EditInput::Composite { image: vec![1, 2, 3] };
        let items = run_batch(
            &service,
            &input,
            ["a", "fail here", "c"].map(|p| config.request(p)),
        );

        assert_eq!(items.len(), 3);
        assert!(items[0].is_success());
        assert!(!items[1].is_success());
        assert!(items[2].is_success());
        assert_eq!(*service.seen.borrow(), vec!["a", "fail here", "c"]);
    }

    #[test]
    fn size_and_quality_parse_and_display() {
        for s in ["1024x1024", "1536x1024", "1024x1536", "auto"] {
            assert_eq!(s.parse::<ImageSize>().unwrap().to_string(), s);
        }
        for q in ["low", "medium", "high"] {
            assert_eq!(q.parse::<Quality>().unwrap().to_string(), q);
        }
        assert!("512x512".parse::<ImageSize>().is_err());
        assert!("ultra".parse::<Quality>().is_err());
    }

    #[test]
    fn config_debug_hides_key() {
        let config = ServiceConfig::new("sk-secret");
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("gpt-image-1"));
    }

    #[test]
    fn request_uses_config_defaults() {
        let config = ServiceConfig {
            size: ImageSize::Portrait,
            quality: Quality::Low,
            ..ServiceConfig::new("k")
        };
        let req = config.request("add a boat");
        assert_eq!(req.size, ImageSize::Portrait);
        assert_eq!(req.quality, Quality::Low);
        assert_eq!(req.prompt, "add a boat");
    }
}
