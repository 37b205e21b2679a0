use thiserror::Error;

/// Why a renderer could not be built
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RendererError {
    #[error("invalid upscale factor {0}: expected 1, 2, 4 or 8")]
    InvalidUpscale(u32),

    #[error("internal resolution {width}x{height} is too small: both sides must be at least {min}")]
    DimensionsTooSmall { width: u32, height: u32, min: u32 },

    #[error("internal resolution {width}x{height} is not divisible by 4")]
    DimensionsNotDivisibleBy4 { width: u32, height: u32 },

    #[error("failed to allocate the {buffer} buffer")]
    Allocation { buffer: &'static str },
}

impl RendererError {
    /// Numeric status for callers that report plain codes
    /// (0 is success and never produced here)
    pub fn code(&self) -> i32 {
        match self {
            RendererError::Allocation { .. } => 1,
            RendererError::DimensionsTooSmall { .. } => 2,
            RendererError::InvalidUpscale(_) => 3,
            RendererError::DimensionsNotDivisibleBy4 { .. } => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(RendererError::Allocation { buffer: "index" }.code(), 1);
        assert_eq!(
            RendererError::DimensionsTooSmall {
                width: 10,
                height: 10,
                min: 100
            }
            .code(),
            2
        );
        assert_eq!(RendererError::InvalidUpscale(3).code(), 3);
        assert_eq!(
            RendererError::DimensionsNotDivisibleBy4 {
                width: 102,
                height: 100
            }
            .code(),
            4
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            RendererError::InvalidUpscale(3).to_string(),
            "invalid upscale factor 3: expected 1, 2, 4 or 8"
        );
    }
}
