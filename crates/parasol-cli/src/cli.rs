/*
 * Parasol CLI - コマンドライン引数処理モジュール
 *
 * コマンドライン引数を解釈し、入力ファイルをリンク単位に追加してリンクします。
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, LevelFilter};
use parasol_compiler::{module_name_for, CompilerError, FrontendConfig, LinkUnit, VERSION};

/// 引数が不足・不正な場合の終了コード
pub const EXIT_USAGE: u8 = 1;
/// 字句解析・構文解析・読み込みに失敗した場合の終了コード
pub const EXIT_PARSE_FAILURE: u8 = 2;

/// 設定ファイルを指定しない場合に探すファイル
const DEFAULT_CONFIG: &str = "prslc.toml";

/// Parasol言語のフロントエンドCLIツール
#[derive(Parser, Debug)]
#[command(name = "prslc")]
#[command(version = VERSION)]
#[command(about = "Parasolソースを解析し、パイプラインのインクルードをリンクする", long_about = None)]
pub struct Cli {
    /// 詳細なログ出力を有効にする
    #[arg(short, long)]
    pub verbose: bool,

    /// エラー以外のログを抑制する
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// 設定ファイルへのパス
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// リンク後にラベル付きの木を表示する
    #[arg(long)]
    pub print_tree: bool,

    /// 入力ファイル（指定順にモジュールとして追加される）
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// CLIを実行し、終了コードを返す
///
/// 解析の失敗は診断を表示して終了コード2を返します。設定の誤りは `Err` として返ります。
/// `-c` で指定した設定ファイルは存在しなければなりません。
pub fn run(cli: &Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => FrontendConfig::load_required(path),
        None => FrontendConfig::load(DEFAULT_CONFIG),
    }
    .with_context(|| {
        let path = cli.config.as_deref().unwrap_or_else(|| Path::new(DEFAULT_CONFIG));
        format!("設定ファイル {} を読み込めません", path.display())
    })?;

    setup_logging(cli, &config);
    info!("Parasolフロントエンド v{} を起動中...", VERSION);

    let mut unit = LinkUnit::new();
    unit.set_warn_unresolved(config.link.warn_unresolved);

    for path in &cli.files {
        if let Err(err) = add_file(&mut unit, path) {
            eprintln!("{}", diagnostic(path, &err));
            return Ok(ExitCode::from(EXIT_PARSE_FAILURE));
        }
    }

    let report = unit.link();
    info!(
        "{} 個のモジュールをリンクしました (解決 {} 件, 未解決 {} 件)",
        unit.modules().len(),
        report.linked,
        report.unresolved
    );

    if cli.print_tree || config.output.print_tree {
        print_trees(&unit)?;
    }

    Ok(ExitCode::SUCCESS)
}

/// ファイルを読み込んでモジュールとして追加する
fn add_file(unit: &mut LinkUnit, path: &Path) -> parasol_compiler::Result<()> {
    let source = fs::read_to_string(path)?;
    let name = module_name_for(path);
    let index = unit.add_module(&source, &name)?;
    debug!("{} をモジュール #{} '{}' として追加しました", path.display(), index, name);
    Ok(())
}

/// `file:line: message` 形式の診断
fn diagnostic(path: &Path, err: &CompilerError) -> String {
    match err.line {
        Some(line) => format!("{}:{}: {}: {}", path.display(), line, err.kind, err.message),
        None => format!("{}: {}: {}", path.display(), err.kind, err.message),
    }
}

/// 全モジュールの木を標準出力に書き出す
fn print_trees(unit: &LinkUnit) -> Result<()> {
    let mut out = String::new();
    for module in unit.modules() {
        module
            .ast()
            .write_tree(module.root(), &mut out)
            .context("木を書き出せません")?;
    }
    print!("{}", out);
    Ok(())
}

/// ログ設定を初期化
///
/// `RUST_LOG` が設定されていればそれを優先します。
fn setup_logging(cli: &Cli, config: &FrontendConfig) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        config.log_level.to_filter()
    };

    let env = env_logger::Env::default().default_filter_or(level.as_str());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(cli.verbose)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use parasol_compiler::ErrorKind;

    #[test]
    fn diagnostic_has_file_and_line() {
        let err = CompilerError::syntax_error("予期しないトークン '}'", 4);
        assert_eq!(
            diagnostic(Path::new("shader.prsl"), &err),
            "shader.prsl:4: 構文解析エラー: 予期しないトークン '}'"
        );
    }

    #[test]
    fn diagnostic_without_line() {
        let err = CompilerError::new(ErrorKind::IO, "見つかりません", None);
        assert_eq!(
            diagnostic(Path::new("missing.prsl"), &err),
            "missing.prsl: I/Oエラー: 見つかりません"
        );
    }

    #[test]
    fn files_are_required() {
        assert!(Cli::try_parse_from(["prslc"]).is_err());
        let cli = Cli::try_parse_from(["prslc", "-v", "--print-tree", "a.prsl", "b.prsl"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.print_tree);
        assert_eq!(cli.files.len(), 2);
    }
}
