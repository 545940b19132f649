//! Limits for codec-level decoding.

/// Codec-specific limits enforced while decoding parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecLimits {
    /// Maximum number of parameters in one message.
    pub max_params: usize,
    /// Maximum UTF-8 bytes in a string parameter.
    pub max_string_bytes: usize,
    /// Maximum bytes in a byte-array parameter.
    pub max_byte_array_bytes: usize,
    /// Maximum encoded bytes of one custom value.
    pub max_custom_bytes: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_params: 32,
            max_string_bytes: 1024,
            max_byte_array_bytes: 16 * 1024,
            max_custom_bytes: 1024,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_params: 8,
            max_string_bytes: 64,
            max_byte_array_bytes: 256,
            max_custom_bytes: 64,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_params: usize::MAX,
            max_string_bytes: usize::MAX,
            max_byte_array_bytes: usize::MAX,
            max_custom_bytes: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_limits_smaller() {
        let test_limits = CodecLimits::for_testing();
        let default_limits = CodecLimits::default();
        assert!(test_limits.max_params < default_limits.max_params);
        assert!(test_limits.max_string_bytes < default_limits.max_string_bytes);
        assert!(test_limits.max_byte_array_bytes < default_limits.max_byte_array_bytes);
    }

    #[test]
    fn unlimited_is_max() {
        assert_eq!(CodecLimits::unlimited().max_params, usize::MAX);
    }
}
