use anyhow::Result;
use colored::Colorize;
use qxmpp_testrun::Launcher;
use qxmpp_testrun::cli::Cli;

fn main() {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        // -h / -V：clap 自己打印到 stdout，退出码 0
        Err(e) if !e.use_stderr() => e.exit(),
        // 用法错误：诊断信息和用法行都打印到 stdout，退出码 2
        Err(e) => {
            print!("{}", Cli::usage_error_message(&e));
            std::process::exit(e.exit_code());
        }
    };

    // 初始化日志系统
    qxmpp_testrun::logger::init_logger();

    if let Err(e) = run(cli) {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    let options = cli.into_options(config)?;
    Launcher::new(options).launch()?;
    Ok(())
}
