//! # 载体图像模块
//!
//! 以交错排列的 8 位通道缓冲区保存图像像素，按 `(pixel, channel)` 寻址。
//! 图像格式的解码与编码交给 `image` crate 完成，隐写逻辑只关心宽、高和通道数。

use crate::constants::BITS_PER_CHANNEL;
use crate::cursor::ChannelCursor;
use crate::error::{Result, StegError};
use image::{DynamicImage, ExtendedColorType};
use std::path::Path;

/// 由宽、高、通道数 (1 到 4) 描述的 8 位像素网格。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Carrier {
    /// 由原始通道数据构建载体，`data` 必须恰好包含 `width * height * channels` 个字节。
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if !(1..=4).contains(&channels) {
            return Err(StegError::UnsupportedLayout(channels));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(StegError::BufferSize {
                len: data.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// 所有通道都为 0 的载体。
    pub fn blank(width: u32, height: u32, channels: u8) -> Result<Self> {
        let len = width as usize * height as usize * channels as usize;
        Self::new(width, height, channels, vec![0; len])
    }

    /// 从任意受支持格式的图像文件加载载体。
    ///
    /// 高于 8 位的样本会被转换为 8 位，通道数保持不变。
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path).map_err(|source| StegError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from(image))
    }

    /// 按输出路径的扩展名选择格式并保存。
    pub fn save(&self, path: &Path) -> Result<()> {
        image::save_buffer(
            path,
            &self.data,
            self.width,
            self.height,
            self.color_type(),
        )
        .map_err(|source| StegError::ImageSave {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// `(width, height, channels)`
    pub fn geometry(&self) -> (u32, u32, u8) {
        (self.width, self.height, self.channels)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// 可寻址的通道总数。
    pub fn channel_count(&self) -> usize {
        self.data.len()
    }

    /// 可嵌入的总位数：`width * height * channels * BITS_PER_CHANNEL`。
    pub fn capacity_bits(&self) -> u64 {
        self.data.len() as u64 * BITS_PER_CHANNEL as u64
    }

    /// 从 `cursor` (包含) 到图像末尾剩余的通道数。
    pub fn remaining_channels(&self, cursor: ChannelCursor) -> usize {
        self.data
            .len()
            .saturating_sub(cursor.linear(self.channels as usize))
    }

    /// 游标所指的通道值，越界时返回 `None`。
    pub fn channel(&self, cursor: ChannelCursor) -> Option<u8> {
        let index = self.index_of(cursor)?;
        Some(self.data[index])
    }

    pub fn channel_mut(&mut self, cursor: ChannelCursor) -> Option<&mut u8> {
        let index = self.index_of(cursor)?;
        Some(&mut self.data[index])
    }

    fn index_of(&self, cursor: ChannelCursor) -> Option<usize> {
        let channels = self.channels as usize;
        if cursor.channel() >= channels {
            return None;
        }
        // 交错存储时像素 (x, y) 的通道 c 位于 (y * width + x) * channels + c
        let index = cursor.linear(channels);
        (index < self.data.len()).then_some(index)
    }

    fn color_type(&self) -> ExtendedColorType {
        match self.channels {
            1 => ExtendedColorType::L8,
            2 => ExtendedColorType::La8,
            3 => ExtendedColorType::Rgb8,
            _ => ExtendedColorType::Rgba8,
        }
    }
}

impl From<DynamicImage> for Carrier {
    fn from(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let channels = image.color().channel_count();
        let data = match channels {
            1 => image.into_luma8().into_raw(),
            2 => image.into_luma_alpha8().into_raw(),
            3 => image.into_rgb8().into_raw(),
            _ => image.into_rgba8().into_raw(),
        };
        Self {
            width,
            height,
            channels: channels.clamp(1, 4),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_counts_two_bits_per_channel() -> Result<()> {
        let carrier = Carrier::blank(4, 4, 3)?;
        assert_eq!(carrier.channel_count(), 48);
        assert_eq!(carrier.capacity_bits(), 96);
        Ok(())
    }

    #[test]
    fn addressing_is_pixel_major_interleaved() -> Result<()> {
        let data: Vec<u8> = (0..24).collect();
        let carrier = Carrier::new(4, 2, 3, data)?;
        assert_eq!(carrier.channel(ChannelCursor::new(0, 0)), Some(0));
        assert_eq!(carrier.channel(ChannelCursor::new(1, 2)), Some(5));
        assert_eq!(carrier.channel(ChannelCursor::new(7, 2)), Some(23));
        assert_eq!(carrier.channel(ChannelCursor::new(8, 0)), None);
        assert_eq!(carrier.channel(ChannelCursor::new(0, 3)), None);
        Ok(())
    }

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(matches!(
            Carrier::new(2, 2, 3, vec![0; 11]),
            Err(StegError::BufferSize {
                len: 11,
                expected: 12
            })
        ));
        assert!(matches!(
            Carrier::new(1, 1, 5, vec![0; 5]),
            Err(StegError::UnsupportedLayout(5))
        ));
    }

    #[test]
    fn remaining_channels_shrink_with_cursor() -> Result<()> {
        let carrier = Carrier::blank(2, 2, 4)?;
        assert_eq!(carrier.remaining_channels(ChannelCursor::origin()), 16);
        assert_eq!(carrier.remaining_channels(ChannelCursor::new(3, 3)), 1);
        assert_eq!(carrier.remaining_channels(ChannelCursor::new(4, 0)), 0);
        Ok(())
    }
}
