use crate::carrier::Carrier;
use crate::constants::{BITS_PER_CHANNEL, CHANNEL_MASK, CHANNELS_PER_BYTE};
use crate::cursor::ChannelCursor;
use crate::error::{Result, StegError};

/// 存放 `bytes` 字节整数所需的通道数 (`8 * bytes / BITS_PER_CHANNEL`)。
pub const fn channels_for(bytes: usize) -> usize {
    bytes * CHANNELS_PER_BYTE
}

fn check_region(carrier: &Carrier, bytes: usize, cursor: ChannelCursor) -> Result<usize> {
    if bytes > 8 {
        return Err(StegError::UnsupportedWidth(bytes));
    }

    let needed = channels_for(bytes);
    if carrier.remaining_channels(cursor) < needed {
        return Err(StegError::OutOfBounds {
            position: cursor.linear(carrier.channels() as usize) + needed,
            total: carrier.channel_count(),
        });
    }

    Ok(needed)
}

/// 将 `bytes` 字节宽的整数 `value` 写入从 `cursor` 开始的通道，高位组在前。
///
/// 每个通道只替换最低 2 位，高 6 位保持不变。写入后 `cursor` 指向紧随其后的通道。
/// 写入前会检查整个区域是否都在图像范围内，越界时不修改任何通道。
pub fn embed(
    carrier: &mut Carrier,
    value: u64,
    bytes: usize,
    cursor: &mut ChannelCursor,
) -> Result<()> {
    let needed = check_region(carrier, bytes, *cursor)?;
    let channels = carrier.channels() as usize;
    let total = carrier.channel_count();

    for i in 0..needed {
        let shift = BITS_PER_CHANNEL * (needed - 1 - i);
        let bits = ((value >> shift) as u8) & CHANNEL_MASK;
        let channel = carrier
            .channel_mut(*cursor)
            .ok_or(StegError::OutOfBounds {
                position: cursor.linear(channels),
                total,
            })?;
        *channel = (*channel & !CHANNEL_MASK) | bits;
        cursor.step(channels);
    }

    Ok(())
}

/// `embed` 的逆操作：从 `cursor` 开始读取 `bytes` 字节宽的整数，按大端顺序拼接。
pub fn retrieve(carrier: &Carrier, bytes: usize, cursor: &mut ChannelCursor) -> Result<u64> {
    let needed = check_region(carrier, bytes, *cursor)?;
    let channels = carrier.channels() as usize;

    let mut result: u64 = 0;
    for _ in 0..needed {
        let channel = carrier.channel(*cursor).ok_or(StegError::OutOfBounds {
            position: cursor.linear(channels),
            total: carrier.channel_count(),
        })?;
        result = (result << BITS_PER_CHANNEL) | (channel & CHANNEL_MASK) as u64;
        cursor.step(channels);
    }

    Ok(result)
}

/// 依次把每个字节作为 1 字节整数写入。
pub fn embed_bytes(carrier: &mut Carrier, data: &[u8], cursor: &mut ChannelCursor) -> Result<()> {
    data.iter().try_for_each(|&byte| embed(carrier, byte as u64, 1, cursor))
}

/// 依次读取 `len` 个字节。
pub fn retrieve_bytes(carrier: &Carrier, len: usize, cursor: &mut ChannelCursor) -> Result<Vec<u8>> {
    (0..len)
        .map(|_| retrieve(carrier, 1, cursor).map(|value| value as u8))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_carrier(width: u32, height: u32, channels: u8) -> Carrier {
        let len = width as usize * height as usize * channels as usize;
        let data = (0..len).map(|i| (i * 37 + 11) as u8).collect();
        Carrier::new(width, height, channels, data).unwrap()
    }

    #[test]
    fn byte_is_written_most_significant_pair_first() -> Result<()> {
        let mut carrier = Carrier::blank(2, 1, 3)?;
        let mut cursor = ChannelCursor::origin();
        embed(&mut carrier, 0b10_01_11_00, 1, &mut cursor)?;
        assert_eq!(&carrier.as_raw()[..4], &[0b10, 0b01, 0b11, 0b00]);
        assert_eq!(cursor, ChannelCursor::new(1, 1));
        Ok(())
    }

    #[test]
    fn upper_bits_are_preserved() -> Result<()> {
        let mut carrier = Carrier::new(1, 1, 4, vec![0xFF, 0x80, 0x41, 0xFE])?;
        embed(&mut carrier, 0x00, 1, &mut ChannelCursor::origin())?;
        assert_eq!(carrier.as_raw(), &[0xFC, 0x80, 0x40, 0xFC]);
        Ok(())
    }

    #[test]
    fn retrieve_reverses_embed_for_every_width() -> Result<()> {
        let mut carrier = noisy_carrier(16, 8, 3);
        let values = [
            (1, 0xA5u64),
            (2, 0xBEEF),
            (4, 0xDEAD_BEEF),
            (8, 0x0123_4567_89AB_CDEF),
        ];

        let mut cursor = ChannelCursor::origin();
        for &(bytes, value) in &values {
            embed(&mut carrier, value, bytes, &mut cursor)?;
        }
        let written = cursor;

        let mut cursor = ChannelCursor::origin();
        for &(bytes, value) in &values {
            assert_eq!(retrieve(&carrier, bytes, &mut cursor)?, value);
        }
        assert_eq!(cursor, written);
        Ok(())
    }

    #[test]
    fn embed_only_touches_required_channels() -> Result<()> {
        let original = noisy_carrier(4, 4, 3);
        let mut carrier = original.clone();
        let mut cursor = ChannelCursor::origin();
        embed(&mut carrier, u64::MAX, 8, &mut cursor)?;

        let touched = channels_for(8);
        assert_eq!(&carrier.as_raw()[touched..], &original.as_raw()[touched..]);
        for (after, before) in carrier.as_raw().iter().zip(original.as_raw()) {
            assert_eq!(after & !CHANNEL_MASK, before & !CHANNEL_MASK);
        }
        Ok(())
    }

    #[test]
    fn out_of_bounds_leaves_image_untouched() -> Result<()> {
        let original = noisy_carrier(1, 1, 3);
        let mut carrier = original.clone();
        let mut cursor = ChannelCursor::origin();
        let result = embed(&mut carrier, 0xFF, 1, &mut cursor);
        assert!(matches!(result, Err(StegError::OutOfBounds { .. })));
        assert_eq!(carrier, original);
        assert_eq!(cursor, ChannelCursor::origin());
        Ok(())
    }

    #[test]
    fn rejects_integers_wider_than_u64() {
        let carrier = noisy_carrier(8, 8, 3);
        let result = retrieve(&carrier, 9, &mut ChannelCursor::origin());
        assert!(matches!(result, Err(StegError::UnsupportedWidth(9))));
    }

    #[test]
    fn byte_sequences_round_trip() -> Result<()> {
        let mut carrier = noisy_carrier(5, 5, 4);
        let message = b"hidden \x00\xff bytes";
        embed_bytes(&mut carrier, message, &mut ChannelCursor::origin())?;
        let recovered = retrieve_bytes(&carrier, message.len(), &mut ChannelCursor::origin())?;
        assert_eq!(recovered, message);
        Ok(())
    }
}
