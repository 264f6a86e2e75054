// Domain use cases - Turning validated inputs into an extraction request

use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::OutputNaming;

/// Retries applied both to the whole transfer and to each fragment
pub const DEFAULT_RETRY_BUDGET: u32 = 10;

/// Milliseconds the consumer waits between event drains
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Raw user input for one extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentInput {
    pub source: String,
    pub start: String,
    pub end: String,
    pub output: Option<PathBuf>,
}

impl SegmentInput {
    pub fn new(
        source: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            start: start.into(),
            end: end.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// Builds immutable extraction requests.
///
/// Identical inputs always give equal requests; in particular the default
/// output name depends only on the start and end texts, so callers that need
/// distinct files for overlapping ranges must pass an explicit path.
#[derive(Debug, Clone)]
pub struct ExtractionRequestBuilder {
    retry_budget: u32,
    output_dir: Option<PathBuf>,
    overwrite: bool,
}

impl Default for ExtractionRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionRequestBuilder {
    pub fn new() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            output_dir: None,
            overwrite: false,
        }
    }

    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    /// Directory for default-named outputs; explicit paths are left alone
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Validate raw input and build the request. Fails fast, before any
    /// external process is involved.
    pub fn build(&self, input: &SegmentInput) -> Result<ExtractionRequest, DomainError> {
        let source = SourceReference::parse(&input.source)?;
        let range = SegmentRange::parse(&input.start, &input.end)?;
        Ok(self.build_from_parts(source, range, input.output.as_deref()))
    }

    /// Build from already validated parts
    pub fn build_from_parts(
        &self,
        source: SourceReference,
        range: SegmentRange,
        output: Option<&Path>,
    ) -> ExtractionRequest {
        let format_policy = FormatPolicy::BestMp4Compatible;
        let output_path = match output {
            Some(path) => OutputNaming::with_container_extension(path, format_policy),
            None => {
                let name = OutputNaming::default_file_name(&range, format_policy);
                match &self.output_dir {
                    Some(dir) => dir.join(name),
                    None => PathBuf::from(name),
                }
            }
        };

        ExtractionRequest {
            source,
            range,
            output_path,
            format_policy,
            retry_budget: self.retry_budget,
            keyframe_alignment: true,
            overwrite: self.overwrite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[test]
    fn test_default_output_path() {
        let request = ExtractionRequestBuilder::new()
            .build(&SegmentInput::new(URL, "15:21", "30:21"))
            .unwrap();
        assert_eq!(request.output_path, PathBuf::from("segment_15-21_30-21.mp4"));
    }

    #[test]
    fn test_fixed_policy_fields() {
        let request = ExtractionRequestBuilder::new()
            .build(&SegmentInput::new(URL, "0:10", "0:20"))
            .unwrap();
        assert_eq!(request.format_policy, FormatPolicy::BestMp4Compatible);
        assert!(request.keyframe_alignment);
        assert_eq!(request.retry_budget, DEFAULT_RETRY_BUDGET);
        assert!(!request.overwrite);
    }

    #[test]
    fn test_build_is_idempotent() {
        let builder = ExtractionRequestBuilder::new().with_retry_budget(3);
        let input = SegmentInput::new(URL, "1:15:30", "1:45:00");
        assert_eq!(builder.build(&input).unwrap(), builder.build(&input).unwrap());
    }

    #[test]
    fn test_explicit_output_path() {
        let builder =
            ExtractionRequestBuilder::new().with_output_dir(Some(PathBuf::from("downloads")));
        let request = builder
            .build(&SegmentInput::new(URL, "0:10", "0:20").with_output("mon_segment.mp4"))
            .unwrap();
        assert_eq!(request.output_path, PathBuf::from("mon_segment.mp4"));

        let request = builder
            .build(&SegmentInput::new(URL, "0:10", "0:20").with_output("clip"))
            .unwrap();
        assert_eq!(request.output_path, PathBuf::from("clip.mp4"));
    }

    #[test]
    fn test_output_dir_applies_to_default_name() {
        let request = ExtractionRequestBuilder::new()
            .with_output_dir(Some(PathBuf::from("downloads")))
            .build(&SegmentInput::new(URL, "0:10", "0:20"))
            .unwrap();
        assert_eq!(request.output_path, Path::new("downloads").join("segment_0-10_0-20.mp4"));
    }

    #[test]
    fn test_validation_order_and_kinds() {
        let builder = ExtractionRequestBuilder::new();

        let err = builder
            .build(&SegmentInput::new("https://www.google.com", "0:10", "0:20"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSource);

        let err = builder.build(&SegmentInput::new(URL, "10", "0:20")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);

        let err = builder.build(&SegmentInput::new(URL, "1:00", "1:00")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRange);
        assert!(err.is_validation());
    }
}
