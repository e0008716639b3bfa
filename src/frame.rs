//! # 帧格式模块
//!
//! 定义嵌入数据在通道流中的布局。支持两种互斥的格式：
//!
//! ```text
//! Length (默认):
//! [1 byte ] 文件名长度
//! [N bytes] 文件名
//! [8 bytes] 文件大小 (大端 u64)
//! [M bytes] 文件内容
//!
//! Sentinel (旧版):
//! [M bytes] 文件内容
//! [2 bytes] 0x5D 0xCF
//! ```
//!
//! 旧版格式在载荷本身包含哨兵序列时会被提前截断，这是格式的已知限制。

use crate::carrier::Carrier;
use crate::constants::{
    CHANNELS_PER_BYTE, FILE_SIZE_BYTES, FILENAME_LEN_BYTES, MAX_FILENAME_LEN, SENTINEL,
};
use crate::cursor::ChannelCursor;
use crate::error::{Result, StegError};
use crate::steganography::{embed, embed_bytes, retrieve, retrieve_bytes};
use clap::ValueEnum;
use std::io::Write;

/// 嵌入数据使用的帧格式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Framing {
    /// 文件名 + 文件大小 + 内容。
    #[default]
    Length,
    /// 内容后接两字节哨兵，不记录文件名。
    Sentinel,
}

/// 从图像中读回的帧头。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub filename: String,
    pub file_size: u64,
}

/// 长度前缀帧需要的位数：`8 * (1 + filename_len + 8 + file_size)`。
pub fn required_bits(filename_len: usize, file_size: u64) -> u64 {
    8 * (FILENAME_LEN_BYTES as u64 + filename_len as u64 + FILE_SIZE_BYTES as u64 + file_size)
}

/// 哨兵帧需要的位数：`8 * (file_size + 2)`。
pub fn sentinel_required_bits(file_size: u64) -> u64 {
    8 * (file_size + SENTINEL.len() as u64)
}

/// 在修改任何像素之前确认图像能容纳 `required` 位。
pub fn ensure_capacity(carrier: &Carrier, required: u64) -> Result<()> {
    let available = carrier.capacity_bits();
    if required > available {
        return Err(StegError::Capacity {
            required,
            available,
        });
    }
    Ok(())
}

/// 以长度前缀格式将 `payload` 及其文件名写入图像，返回写入结束后的游标。
///
/// 容量不足或文件名过长时直接返回错误，图像保持原样。
pub fn embed_file(carrier: &mut Carrier, filename: &str, payload: &[u8]) -> Result<ChannelCursor> {
    let name = filename.as_bytes();
    if name.len() > MAX_FILENAME_LEN {
        return Err(StegError::FilenameTooLong(name.len()));
    }
    let file_size = payload.len() as u64;
    ensure_capacity(carrier, required_bits(name.len(), file_size))?;

    log::debug!(
        "embedding '{}' ({} bytes) into {}x{}x{} image",
        filename,
        file_size,
        carrier.width(),
        carrier.height(),
        carrier.channels()
    );

    let mut cursor = ChannelCursor::origin();
    embed(carrier, name.len() as u64, FILENAME_LEN_BYTES, &mut cursor)?;
    embed_bytes(carrier, name, &mut cursor)?;
    embed(carrier, file_size, FILE_SIZE_BYTES, &mut cursor)?;
    embed_bytes(carrier, payload, &mut cursor)?;

    log::debug!("frame ends at pixel {}, channel {}", cursor.pixel(), cursor.channel());
    Ok(cursor)
}

/// 读取帧头，游标随之前进到载荷起点。
///
/// 声明的文件大小超出图像剩余容量时返回 `CorruptFrame`，
/// 通常意味着该图像中并没有嵌入数据。
pub fn read_header(carrier: &Carrier, cursor: &mut ChannelCursor) -> Result<FrameHeader> {
    let name_len = retrieve(carrier, FILENAME_LEN_BYTES, cursor)? as usize;
    let name = retrieve_bytes(carrier, name_len, cursor)?;
    let file_size = retrieve(carrier, FILE_SIZE_BYTES, cursor)?;

    let remaining = carrier.remaining_channels(*cursor) as u64;
    if file_size > remaining / CHANNELS_PER_BYTE as u64 {
        return Err(StegError::CorruptFrame(format!(
            "header declares {file_size} bytes but only {} fit in the image",
            remaining / CHANNELS_PER_BYTE as u64
        )));
    }

    let header = FrameHeader {
        filename: String::from_utf8_lossy(&name).into_owned(),
        file_size,
    };
    log::debug!("recovered header {:?}", header);
    Ok(header)
}

/// 按帧头中的大小逐字节读取载荷并写入 `sink`。
pub fn copy_payload<W: Write>(
    carrier: &Carrier,
    header: &FrameHeader,
    cursor: &mut ChannelCursor,
    sink: &mut W,
) -> Result<()> {
    for _ in 0..header.file_size {
        let byte = retrieve(carrier, 1, cursor)? as u8;
        sink.write_all(&[byte])?;
    }
    Ok(())
}

/// 读取完整的长度前缀帧，返回帧头和载荷。
pub fn extract_file(carrier: &Carrier) -> Result<(FrameHeader, Vec<u8>)> {
    let mut cursor = ChannelCursor::origin();
    let header = read_header(carrier, &mut cursor)?;
    let mut payload = Vec::with_capacity(header.file_size as usize);
    copy_payload(carrier, &header, &mut cursor, &mut payload)?;
    Ok((header, payload))
}

/// 以哨兵格式写入 `payload`，返回写入结束后的游标。
pub fn embed_terminated(carrier: &mut Carrier, payload: &[u8]) -> Result<ChannelCursor> {
    ensure_capacity(carrier, sentinel_required_bits(payload.len() as u64))?;

    if payload.windows(SENTINEL.len()).any(|window| window == SENTINEL) {
        log::warn!(
            "payload contains the terminator sequence {:02X?}, decoding will stop early",
            SENTINEL
        );
    }

    let mut cursor = ChannelCursor::origin();
    embed_bytes(carrier, payload, &mut cursor)?;
    embed_bytes(carrier, &SENTINEL, &mut cursor)?;
    Ok(cursor)
}

/// 逐字节读取直到遇到哨兵，将哨兵之前的字节写入 `sink`，返回写入的字节数。
///
/// 维护两字节滑动窗口：窗口等于哨兵时停止，哨兵本身不输出。
/// 在找到哨兵之前图像就已耗尽时返回 `MissingTerminator`。
pub fn extract_terminated<W: Write>(carrier: &Carrier, sink: &mut W) -> Result<u64> {
    let mut cursor = ChannelCursor::origin();
    let mut next = || -> Result<Option<u8>> {
        if carrier.remaining_channels(cursor) < CHANNELS_PER_BYTE {
            return Ok(None);
        }
        Ok(Some(retrieve(carrier, 1, &mut cursor)? as u8))
    };

    let mut previous = next()?.ok_or(StegError::MissingTerminator)?;
    let mut written = 0u64;
    loop {
        let current = next()?.ok_or(StegError::MissingTerminator)?;
        if [previous, current] == SENTINEL {
            return Ok(written);
        }
        sink.write_all(&[previous])?;
        written += 1;
        previous = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_carrier(width: u32, height: u32, channels: u8) -> Carrier {
        let len = width as usize * height as usize * channels as usize;
        let data = (0..len).map(|i| (i * 91 + 7) as u8).collect();
        Carrier::new(width, height, channels, data).unwrap()
    }

    #[test]
    fn frame_round_trips() -> Result<()> {
        let mut carrier = noisy_carrier(32, 32, 3);
        let payload: Vec<u8> = (0..=255).collect();
        embed_file(&mut carrier, "bytes.bin", &payload)?;

        let (header, recovered) = extract_file(&carrier)?;
        assert_eq!(header.filename, "bytes.bin");
        assert_eq!(header.file_size, 256);
        assert_eq!(recovered, payload);
        Ok(())
    }

    #[test]
    fn capacity_on_a_four_by_four_rgb_image() -> Result<()> {
        assert_eq!(required_bits(1, 0), 80);
        assert_eq!(required_bits(2, 0), 88);
        assert_eq!(required_bits(10, 0), 152);

        let mut carrier = Carrier::blank(4, 4, 3)?;
        embed_file(&mut carrier, "a", &[])?;
        embed_file(&mut carrier, "ab", &[])?;

        let before = carrier.clone();
        let result = embed_file(&mut carrier, "abcdefghij", &[]);
        assert!(matches!(
            result,
            Err(StegError::Capacity {
                required: 152,
                available: 96
            })
        ));
        assert_eq!(carrier, before);
        Ok(())
    }

    #[test]
    fn exact_capacity_succeeds_and_one_more_byte_fails() -> Result<()> {
        // 8x8x4 = 256 channels = 512 bits = 64 bytes; header with "f" uses 10
        let mut carrier = noisy_carrier(8, 8, 4);
        let fits = vec![0xAB; 54];
        let cursor = embed_file(&mut carrier, "f", &fits)?;
        assert_eq!(carrier.remaining_channels(cursor), 0);
        assert_eq!(extract_file(&carrier)?.1, fits);

        let original = noisy_carrier(8, 8, 4);
        let mut carrier = original.clone();
        let result = embed_file(&mut carrier, "f", &[0xAB; 55]);
        assert!(matches!(result, Err(StegError::Capacity { .. })));
        assert_eq!(carrier, original);
        Ok(())
    }

    #[test]
    fn untouched_channels_stay_identical() -> Result<()> {
        let original = noisy_carrier(16, 16, 3);
        let mut carrier = original.clone();
        let cursor = embed_file(&mut carrier, "note.txt", b"hello")?;
        let used = cursor.linear(3);
        assert_eq!(used, 4 * (1 + 8 + 8 + 5));
        assert_eq!(&carrier.as_raw()[used..], &original.as_raw()[used..]);
        Ok(())
    }

    #[test]
    fn long_filenames_are_rejected() -> Result<()> {
        let mut carrier = noisy_carrier(256, 256, 3);
        let name = "n".repeat(256);
        assert!(matches!(
            embed_file(&mut carrier, &name, b"x"),
            Err(StegError::FilenameTooLong(256))
        ));
        Ok(())
    }

    #[test]
    fn implausible_header_is_reported_as_corrupt() -> Result<()> {
        let mut carrier = Carrier::blank(8, 8, 3)?;
        let mut cursor = ChannelCursor::origin();
        embed(&mut carrier, 0, FILENAME_LEN_BYTES, &mut cursor)?;
        embed(&mut carrier, u64::MAX, FILE_SIZE_BYTES, &mut cursor)?;
        assert!(matches!(
            extract_file(&carrier),
            Err(StegError::CorruptFrame(_))
        ));
        Ok(())
    }

    #[test]
    fn sentinel_frame_round_trips() -> Result<()> {
        let mut carrier = noisy_carrier(16, 16, 3);
        let payload = b"legacy payload \x5D but no terminator pair";
        embed_terminated(&mut carrier, payload)?;

        let mut recovered = Vec::new();
        let written = extract_terminated(&carrier, &mut recovered)?;
        assert_eq!(written, payload.len() as u64);
        assert_eq!(recovered, payload);
        Ok(())
    }

    #[test]
    fn sentinel_inside_payload_truncates_output() -> Result<()> {
        let mut carrier = noisy_carrier(16, 16, 3);
        embed_terminated(&mut carrier, &[1, 2, 0x5D, 0xCF, 3, 4])?;

        let mut recovered = Vec::new();
        extract_terminated(&carrier, &mut recovered)?;
        assert_eq!(recovered, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn missing_sentinel_is_an_error() -> Result<()> {
        let carrier = Carrier::blank(4, 4, 3)?;
        let mut sink = Vec::new();
        assert!(matches!(
            extract_terminated(&carrier, &mut sink),
            Err(StegError::MissingTerminator)
        ));
        Ok(())
    }
}
