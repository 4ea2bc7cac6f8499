use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::error;

use exam_grader::models::{load_exam_config, BookletMode, ExamConfig, PointsMode, Variant};
use exam_grader::services::SourceKind;
use exam_grader::utils::logging;
use exam_grader::{App, AppError, Config, GradeRequest};

/// 从考试结果 PDF 中识别学生作答并判分，每名学生生成一张成绩图
#[derive(Parser)]
#[command(name = "exam-grader", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 判分并输出压缩包
    Grade(ExamArgs),
    /// 只显示识别到的答案
    Keys(ExamArgs),
    /// 只显示识别到的学生记录
    Records(ExamArgs),
}

impl Command {
    fn args(&self) -> &ExamArgs {
        match self {
            Command::Grade(args) | Command::Keys(args) | Command::Records(args) => args,
        }
    }
}

#[derive(Args)]
struct ExamArgs {
    /// 考试结果文档（.pdf 或 .txt）
    document: PathBuf,

    /// 考试配置 TOML 文件
    #[arg(short, long)]
    exam: Option<PathBuf>,

    /// 题目数量
    #[arg(short = 'n', long)]
    questions: Option<usize>,

    /// 卷型模式
    #[arg(short, long, value_enum)]
    booklets: Option<BookletMode>,

    /// 手动答案，例如 --key A=CDBCBCBDCB（可重复）
    #[arg(short, long = "key", value_name = "VARIANT=KEY", value_parser = parse_key_arg)]
    keys: Vec<(Variant, String)>,

    /// 每题固定分值（默认总分 100 平均分配）
    #[arg(short, long)]
    points: Option<f64>,

    /// 未识别到卷型时使用的卷型
    #[arg(short, long)]
    fallback: Option<Variant>,

    /// 答案和学生记录的来源
    #[arg(short, long, value_enum, default_value_t = SourceKind::Auto)]
    source: SourceKind,

    /// 输出目录（覆盖 OUTPUT_DIR）
    #[arg(short, long)]
    output: Option<String>,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

fn parse_key_arg(s: &str) -> Result<(Variant, String), String> {
    let (label, key) = s
        .split_once('=')
        .ok_or_else(|| format!("格式应为 VARIANT=KEY: {}", s))?;
    let variant = label.parse::<Variant>().map_err(|e| e.to_string())?;
    Ok((variant, key.to_string()))
}

/// 考试配置：TOML 文件打底，命令行参数覆盖
async fn build_exam(args: &ExamArgs) -> Result<ExamConfig> {
    let mut exam = match &args.exam {
        Some(path) => load_exam_config(path).await?,
        None => ExamConfig::default(),
    };

    if let Some(questions) = args.questions {
        exam.question_count = questions;
    }
    if let Some(booklets) = args.booklets {
        exam.booklet_mode = booklets;
    }
    if let Some(points) = args.points {
        exam.points = PointsMode::Fixed(points);
    }
    if let Some(fallback) = args.fallback {
        exam.fallback_variant = fallback;
    }
    for (variant, key) in &args.keys {
        exam.keys.insert(*variant, key);
    }

    Ok(exam)
}

async fn execute(app: &App, command: &Command, request: GradeRequest) -> Result<()> {
    match command {
        Command::Grade(_) => {
            let summary = app.run(request).await?;
            for result in &summary.results {
                let variant = result
                    .variant
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}", result.name, variant, result.total);
            }
            println!("{}", summary.archive.display());
        }
        Command::Keys(_) => {
            let prepared = app.extract(&request).await?;
            if prepared.exam.keys.is_empty() {
                println!("未找到答案");
            }
            for (variant, key) in prepared.exam.keys.iter() {
                println!("{}\t{}", variant, key);
            }
        }
        Command::Records(_) => {
            let prepared = app.prepare(&request).await?;
            for record in &prepared.batch.records {
                println!("{}", record);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let args = cli.command.args();

    // 加载配置
    let mut config = Config::from_env();
    config.verbose_logging |= args.verbose;
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }

    // 初始化日志
    logging::init(config.verbose_logging);

    let request = GradeRequest {
        document: args.document.clone(),
        exam: build_exam(args).await?,
        source: args.source,
    };

    let app = App::initialize(config).await?;

    if let Err(err) = execute(&app, &cli.command, request).await {
        if err
            .downcast_ref::<AppError>()
            .is_some_and(AppError::is_configuration)
        {
            error!("❌ 考试配置不完整，请检查题目数量、卷型模式和答案");
        }
        return Err(err);
    }

    Ok(())
}
