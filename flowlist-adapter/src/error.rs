use alloc::string::String;

/// Why an asset could not be measured.
///
/// These never reach the end user: the resolver logs them and falls back to the default height.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("failed to fetch asset: {0}")]
    Network(String),
    #[error("failed to decode asset: {0}")]
    Decode(String),
    #[error("asset reported invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}
