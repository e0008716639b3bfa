//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use crate::frame::Framing;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;
use std::ffi::OsString;
use std::path::PathBuf;

/// 将任意文件隐藏在图像像素通道的最低 2 位中，并在之后恢复。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "将任意文件隐藏在图像像素通道的最低 2 位中，并在之后恢复。输出图像必须使用无损格式 (如 PNG, BMP)。"
)]
pub struct Cli {
    /// 输出更多诊断日志 (-v, -vv, -vvv)。
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// 解析命令行，跳过无法识别的参数而不是报错。
    ///
    /// 每遇到一个未知参数 (未知标志或多余的位置参数)，就将其从参数列表中移除并重新解析。
    /// 返回解析结果以及被忽略的参数，由调用方在日志初始化后发出警告。
    ///
    /// # Errors
    ///
    /// 缺少必需参数等其他解析错误 (包括 `--help` 和 `--version`) 原样返回。
    pub fn parse_lenient<I, T>(args: I) -> Result<(Self, Vec<String>), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let mut ignored = Vec::new();

        loop {
            let err = match Self::try_parse_from(&args) {
                Ok(cli) => return Ok((cli, ignored)),
                Err(err) => err,
            };
            if err.kind() != ErrorKind::UnknownArgument {
                return Err(err);
            }

            let Some(ContextValue::String(token)) = err.get(ContextKind::InvalidArg) else {
                return Err(err);
            };
            let token = token.clone();
            // 第 0 个是程序名
            let Some(position) = args
                .iter()
                .skip(1)
                .position(|arg| arg.to_str() == Some(token.as_str()))
            else {
                return Err(err);
            };

            args.remove(position + 1);
            ignored.push(token);
        }
    }

    /// 根据 `-v` 的次数选择日志级别，默认只显示警告。
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// 可用的子命令：embed (嵌入)、decode (提取) 和 subtract (相减)。
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 将文件嵌入图像。
    Embed(EmbedArgs),

    /// 从经过隐写的图像中提取文件。
    Decode(DecodeArgs),

    /// 生成两幅图像的差异图，用于观察隐写造成的改动。
    Subtract(SubtractArgs),
}

/// 'embed' 命令所需的参数。
#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// 用于隐写的输入图像文件路径。
    pub image: PathBuf,

    /// 要嵌入的文件路径。
    #[arg(short, long)]
    pub embed: PathBuf,

    /// 结果图像的输出路径，默认为输入图像所在目录下的 `out.png`。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 帧格式。
    #[arg(long, value_enum, default_value_t = Framing::Length)]
    pub framing: Framing,

    /// 输出文件已存在时覆盖它。
    #[arg(short, long)]
    pub force: bool,
}

/// 'decode' 命令所需的参数。
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// 已嵌入文件的图像路径。
    pub image: PathBuf,

    /// 提取出的文件的输出路径，默认使用嵌入时记录的文件名，放在输入图像所在目录。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 帧格式，必须与嵌入时一致。
    #[arg(long, value_enum, default_value_t = Framing::Length)]
    pub framing: Framing,

    /// 输出文件已存在时覆盖它。
    #[arg(short, long)]
    pub force: bool,
}

/// 'subtract' 命令所需的参数。
#[derive(Args, Debug)]
pub struct SubtractArgs {
    /// 第一幅图像，差异按其尺寸生成。
    pub image: PathBuf,

    /// 要从第一幅图像中减去的图像。
    #[arg(short, long)]
    pub subtract: PathBuf,

    /// 差异图的输出路径，默认为第一幅图像所在目录下的 `out.png`。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 输出文件已存在时覆盖它。
    #[arg(short, long)]
    pub force: bool,
}
