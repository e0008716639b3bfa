/// 每个颜色通道中用于隐写的最低有效位数量。
/// 通道的高 6 位保持不变，因此修改在视觉上几乎不可察觉。
pub const BITS_PER_CHANNEL: usize = 2;

/// 选取通道低 `BITS_PER_CHANNEL` 位的掩码 (`0b11`)。
pub const CHANNEL_MASK: u8 = (1 << BITS_PER_CHANNEL) - 1;

/// 帧头中文件名长度字段占用的字节数。
pub const FILENAME_LEN_BYTES: usize = 1;

/// 帧头中文件大小字段占用的字节数 (大端 `u64`)。
pub const FILE_SIZE_BYTES: usize = 8;

/// 单个字节需要的通道数：8 / 2 = 4。
pub const CHANNELS_PER_BYTE: usize = 8 / BITS_PER_CHANNEL;

/// 文件名长度字段只有一个字节，因此文件名最多 255 字节。
pub const MAX_FILENAME_LEN: usize = u8::MAX as usize;

/// 旧版终止符格式在载荷之后追加的两字节哨兵。
pub const SENTINEL: [u8; 2] = [0x5D, 0xCF];

/// 未指定输出路径时使用的默认图像文件名。
pub const DEFAULT_OUTPUT: &str = "out.png";
