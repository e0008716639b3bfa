use simple_logger::SimpleLogger;

use steg::{
    cli::{Cli, Commands},
    handler::{handle_decode, handle_embed, handle_subtract},
};

/// 程序的主入口点
///
/// 负责解析命令行参数、初始化日志，并根据指定的子命令
/// （`embed`、`decode` 或 `subtract`）将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 解析命令行参数，无法识别的参数只发出警告
    let (cli, ignored) = Cli::parse_lenient(std::env::args_os()).unwrap_or_else(|err| err.exit());

    SimpleLogger::new().with_level(cli.log_level()).init()?;

    for arg in &ignored {
        if arg.starts_with('-') {
            log::warn!("Invalid flag: {arg}");
        } else {
            log::warn!("Ignoring unexpected argument: {arg}");
        }
    }

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::Embed(args) => handle_embed(args),
        Commands::Decode(args) => handle_decode(args),
        Commands::Subtract(args) => handle_subtract(args),
    }
}
