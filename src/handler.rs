//! # 命令处理逻辑模块
//!
//! 包含处理 `embed`、`decode` 和 `subtract` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用核心隐写算法以及向用户报告结果。

use crate::carrier::Carrier;
use crate::cli::{DecodeArgs, EmbedArgs, SubtractArgs};
use crate::constants::DEFAULT_OUTPUT;
use crate::cursor::ChannelCursor;
use crate::error::StegError;
use crate::frame::{self, Framing};
use crate::subtract::subtract;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 与 `image` 同目录下名为 `name` 的路径。
fn sibling(image: &Path, name: &Path) -> PathBuf {
    image
        .parent()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|| name.to_path_buf())
}

/// 去掉路径中的目录部分，只保留文件名。
fn strip_dirs(name: &str) -> Option<PathBuf> {
    Path::new(name).file_name().map(PathBuf::from)
}

/// 输出文件已存在且未指定 `--force` 时拒绝继续。
fn check_overwrite(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {} \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

fn load_image(path: &Path) -> Result<Carrier> {
    let carrier = Carrier::open(path).with_context(|| {
        format!(
            "Unable to load image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;
    log::info!(
        "loaded {} ({}x{}, {} channels, {} bits available)",
        path.display(),
        carrier.width(),
        carrier.height(),
        carrier.channels(),
        carrier.capacity_bits()
    );
    Ok(carrier)
}

fn save_image(carrier: &Carrier, path: &Path) -> Result<()> {
    carrier.save(path).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            path.to_string_lossy().red().bold()
        )
    })
}

/// 处理 'Embed' 命令的执行逻辑。
///
/// 读取待嵌入文件和载体图像，检查容量后按选定的帧格式写入，最后保存结果图像。
/// 容量检查在修改任何像素之前完成，失败时不会产生输出文件。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取待嵌入文件或载体图像。
/// * 输出文件已存在且未指定 `--force`。
/// * 图像容量不足或文件名过长。
/// * 无法写入结果图像。
pub fn handle_embed(args: EmbedArgs) -> Result<()> {
    let dest = args
        .output
        .clone()
        .unwrap_or_else(|| sibling(&args.image, Path::new(DEFAULT_OUTPUT)));
    check_overwrite(&dest, args.force)?;

    let payload = fs::read(&args.embed)
        .map_err(|source| StegError::FileOpen {
            path: args.embed.clone(),
            source,
        })
        .with_context(|| {
            format!(
                "Unable to read file to embed: {}",
                args.embed.to_string_lossy().red().bold()
            )
        })?;

    let mut carrier = load_image(&args.image)?;

    let end = match args.framing {
        Framing::Length => {
            let filename = args
                .embed
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            frame::embed_file(&mut carrier, &filename, &payload)
        }
        Framing::Sentinel => frame::embed_terminated(&mut carrier, &payload),
    }
    .with_context(|| {
        format!(
            "Failed to embed {} ({} bytes) in {}.",
            args.embed.to_string_lossy().red().bold(),
            payload.len().to_string().red().bold(),
            args.image.to_string_lossy().green()
        )
    })?;
    log::info!(
        "used {} of {} channels",
        end.linear(carrier.channels() as usize),
        carrier.channel_count()
    );

    save_image(&carrier, &dest)?;

    println!(
        "The file has been successfully embedded and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Decode' 命令的执行逻辑。
///
/// 读取载体图像，按帧格式读回帧头和载荷并写入输出文件。
/// 长度前缀格式在未指定 `--output` 时使用嵌入的文件名；哨兵格式没有文件名，必须指定 `--output`。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取载体图像。
/// * 帧头不可信或找不到终止符 (图像中可能没有嵌入数据)。
/// * 输出文件已存在且未指定 `--force`，或无法写入。
pub fn handle_decode(args: DecodeArgs) -> Result<()> {
    if let Some(output) = &args.output {
        check_overwrite(output, args.force)?;
    } else if args.framing == Framing::Sentinel {
        return Err(StegError::MissingArgument("--output")).with_context(|| {
            format!(
                "The {} framing does not store a filename.",
                "sentinel".red().bold()
            )
        });
    }

    let carrier = load_image(&args.image)?;

    let dest = match args.framing {
        Framing::Length => {
            let mut cursor = ChannelCursor::origin();
            let header = frame::read_header(&carrier, &mut cursor).with_context(|| {
                format!(
                    "Failed to recover the file header from '{}'. \nThe image may not contain a hidden file or is corrupted.",
                    args.image.to_string_lossy().red().bold()
                )
            })?;

            let dest = match &args.output {
                Some(output) => output.clone(),
                None => {
                    let name = strip_dirs(&header.filename).ok_or_else(|| {
                        StegError::CorruptFrame(format!(
                            "embedded filename '{}' is not usable",
                            header.filename
                        ))
                    })?;
                    let dest = sibling(&args.image, &name);
                    check_overwrite(&dest, args.force)?;
                    dest
                }
            };

            write_output(&dest, |sink| {
                frame::copy_payload(&carrier, &header, &mut cursor, sink)
            })?;
            dest
        }
        Framing::Sentinel => {
            let dest = args
                .output
                .clone()
                .ok_or(StegError::MissingArgument("--output"))?;
            write_output(&dest, |sink| {
                frame::extract_terminated(&carrier, sink).map(|written| {
                    log::info!("recovered {written} bytes before the terminator");
                })
            })?;
            dest
        }
    };

    println!(
        "The file has been successfully recovered and saved: {}",
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 创建输出文件并交给 `extract` 写入；失败时删除不完整的文件。
fn write_output<F>(dest: &Path, extract: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> crate::error::Result<()>,
{
    let file = File::create(dest)
        .map_err(|source| StegError::FileOpen {
            path: dest.to_path_buf(),
            source,
        })
        .with_context(|| {
            format!(
                "Unable to write to target file: {}",
                dest.to_string_lossy().red().bold()
            )
        })?;

    let mut sink = BufWriter::new(file);
    let result = extract(&mut sink).and_then(|()| sink.flush().map_err(StegError::from));
    drop(sink);

    if let Err(err) = result {
        let _ = fs::remove_file(dest);
        return Err(err).with_context(|| {
            format!(
                "Failed to extract the hidden data into {}.",
                dest.to_string_lossy().red().bold()
            )
        });
    }
    Ok(())
}

/// 处理 'Subtract' 命令的执行逻辑。
///
/// 加载两幅图像，生成放大后的差异图并保存。
///
/// # Errors
///
/// 任一图像无法读取、两幅图像尺寸或通道数不同、或无法写入输出文件时返回错误。
pub fn handle_subtract(args: SubtractArgs) -> Result<()> {
    let dest = args
        .output
        .clone()
        .unwrap_or_else(|| sibling(&args.image, Path::new(DEFAULT_OUTPUT)));
    check_overwrite(&dest, args.force)?;

    let first = load_image(&args.image)?;
    let second = load_image(&args.subtract)?;

    let result = subtract(&first, &second).with_context(|| {
        format!(
            "Unable to subtract {} from {}.",
            args.subtract.to_string_lossy().red().bold(),
            args.image.to_string_lossy().red().bold()
        )
    })?;

    save_image(&result, &dest)?;

    println!(
        "The difference image has been saved: {}",
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}
