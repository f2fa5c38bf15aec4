/*
 * Parasol CLI - メインエントリーポイント
 *
 * コマンドライン引数を解析し、処理ロジックを呼び出します。
 * 引数の誤りは終了コード1、解析の失敗は終了コード2で終了します。
 */

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

mod cli;

fn main() -> ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => cli::EXIT_USAGE,
            };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    match cli::run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("エラー: {:#}", err);
            ExitCode::from(cli::EXIT_USAGE)
        }
    }
}
