//! # 通道游标模块
//!
//! 游标 `(pixel, channel)` 指向下一个要读写的颜色通道。
//! 先遍历同一像素的所有通道，再前进到下一个像素；像素索引按宽度折行：
//! `x = pixel % width`，`y = pixel / width`。

/// 指向下一个待读写通道的位置。
///
/// 游标是显式传递的值，每次嵌入或提取都拥有自己的游标，
/// 不存在跨调用的隐藏状态。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChannelCursor {
    pixel: usize,
    channel: usize,
}

impl ChannelCursor {
    /// 位于第一个像素的第一个通道 `(0, 0)`。
    pub const fn origin() -> Self {
        Self {
            pixel: 0,
            channel: 0,
        }
    }

    pub const fn new(pixel: usize, channel: usize) -> Self {
        Self { pixel, channel }
    }

    pub const fn pixel(&self) -> usize {
        self.pixel
    }

    pub const fn channel(&self) -> usize {
        self.channel
    }

    /// 纯状态转移：返回下一个通道的位置。
    ///
    /// 最后一个通道之后回到通道 0 并前进一个像素。这里不检查像素是否越界，
    /// 调用方负责保证访问的通道总数不超过 `width * height * channel_count`。
    pub const fn advance(self, channel_count: usize) -> Self {
        if self.channel + 1 < channel_count {
            Self {
                pixel: self.pixel,
                channel: self.channel + 1,
            }
        } else {
            Self {
                pixel: self.pixel + 1,
                channel: 0,
            }
        }
    }

    /// 原地前进一个通道。
    pub fn step(&mut self, channel_count: usize) {
        *self = self.advance(channel_count);
    }

    /// 游标所指像素的 `(x, y)` 坐标。
    pub const fn coordinates(&self, width: usize) -> (usize, usize) {
        (self.pixel % width, self.pixel / width)
    }

    /// 从原点到当前位置已经经过的通道数，也就是交错排列缓冲区中的下标。
    pub const fn linear(&self, channel_count: usize) -> usize {
        self.pixel * channel_count + self.channel
    }

    /// 从当前位置开始依次访问的通道位置 (包括当前位置)。
    pub fn positions(self, channel_count: usize) -> impl Iterator<Item = ChannelCursor> {
        std::iter::successors(Some(self), move |cursor| Some(cursor.advance(channel_count)))
    }
}
