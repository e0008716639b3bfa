//! # steg 库
//!
//! 本库包含 LSB 隐写工具的核心逻辑：通道游标、按位编解码、帧格式以及图像相减。

// 声明库包含的所有模块。

pub mod carrier;
pub mod cli;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod frame;
pub mod handler;
pub mod steganography;
pub mod subtract;
