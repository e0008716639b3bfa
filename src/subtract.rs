//! # 图像相减模块
//!
//! 诊断工具：逐通道计算两幅图像的差异并放大，使低位的改动变得可见。

use crate::carrier::Carrier;
use crate::constants::CHANNEL_MASK;
use crate::error::{Result, StegError};

/// 生成差异图像：每个通道为 `|p1 - p2| / CHANNEL_MASK * max`，结果截断到 `u8`。
///
/// `max` 取两幅图像中出现的最大通道值，因此 `subtract(a, b) == subtract(b, a)`。
///
/// # Errors
///
/// 两幅图像的宽、高或通道数不同时返回 `DimensionMismatch`。
pub fn subtract(first: &Carrier, second: &Carrier) -> Result<Carrier> {
    if first.geometry() != second.geometry() {
        return Err(StegError::DimensionMismatch {
            first: first.geometry(),
            second: second.geometry(),
        });
    }

    let max = first
        .as_raw()
        .iter()
        .chain(second.as_raw())
        .copied()
        .max()
        .unwrap_or(0) as f64;

    let data = first
        .as_raw()
        .iter()
        .zip(second.as_raw())
        .map(|(&a, &b)| {
            let diff = a.abs_diff(b) as f64;
            // `as` saturates at 255
            (diff / CHANNEL_MASK as f64 * max) as u8
        })
        .collect();

    let (width, height, channels) = first.geometry();
    Carrier::new(width, height, channels, data)
}
