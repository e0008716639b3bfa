//! # 错误类型模块
//!
//! 隐写核心 (载体图像、游标、编解码、帧格式) 使用的类型化错误。
//! 命令处理层会将其包装进 `anyhow::Error` 并附加上下文。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StegError>;

#[derive(Debug, Error)]
pub enum StegError {
    #[error("unable to open {}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to load image {}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unable to save image {}", path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// 载荷所需位数超过图像的可嵌入位数。
    #[error("image not large enough to embed data: required {required} bits, available {available} bits")]
    Capacity { required: u64, available: u64 },

    #[error(
        "subtraction requires two images of the same size: {first:?} vs {second:?} (width, height, channels)"
    )]
    DimensionMismatch {
        first: (u32, u32, u8),
        second: (u32, u32, u8),
    },

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// 游标试图访问超出 `width * height` 像素范围的通道。
    #[error("channel {position} is outside the image ({total} channels)")]
    OutOfBounds { position: usize, total: usize },

    #[error("cannot encode a {0}-byte integer, at most 8 bytes are supported")]
    UnsupportedWidth(usize),

    #[error("filename is {0} bytes long, at most 255 bytes can be embedded")]
    FilenameTooLong(usize),

    #[error("embedded frame is corrupt: {0}")]
    CorruptFrame(String),

    #[error("reached the end of the image without finding the terminator")]
    MissingTerminator,

    #[error("pixel buffer holds {len} bytes, expected {expected}")]
    BufferSize { len: usize, expected: usize },

    #[error("unsupported channel count {0}, expected 1 to 4")]
    UnsupportedLayout(u8),

    #[error(transparent)]
    Io(#[from] io::Error),
}
