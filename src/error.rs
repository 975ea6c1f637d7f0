use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("field of view must lie in (0, pi) radians, got {0}")]
    InvalidFov(f64),
    #[error("framebuffer holds {actual} samples, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to parse scene config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
