use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文档读取/解析错误
    #[error("文档错误: {0}")]
    Document(#[from] DocumentError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 成绩图渲染错误
    #[error("渲染错误: {0}")]
    Render(#[from] RenderError),
}

/// 文档相关错误
#[derive(Debug, Error)]
pub enum DocumentError {
    /// 不支持的文件类型
    #[error("不支持的文件类型: {path}")]
    UnsupportedFormat { path: String },
    /// PDF 解析失败
    #[error("PDF解析失败: {message}")]
    ExtractionFailed { message: String },
    /// 文档中没有任何文本或表格
    #[error("文档中没有可读取的文本或表格 (可能是扫描件): {path}")]
    Empty { path: String },
    /// 没有识别到任何学生记录
    #[error("未能从文档中读取到学生数据，请检查文档格式 (跳过 {misses} 行)")]
    NoRecords { misses: usize },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 题目数量超出范围
    #[error("题目数量 {count} 超出范围 [{min}, {max}]")]
    QuestionCountOutOfRange { count: usize, min: usize, max: usize },
    /// 当前卷型模式缺少答案
    #[error("卷型 {mode} 缺少答案: {missing}")]
    MissingKeys { mode: String, missing: String },
    /// 默认卷型不在当前模式中
    #[error("默认卷型 {variant} 不属于卷型模式 {mode}")]
    FallbackNotActive { variant: char, mode: String },
    /// 固定分值非法
    #[error("每题分值必须大于 0: {points}")]
    InvalidPoints { points: f64 },
    /// 无法识别的卷型标签
    #[error("无法识别的卷型: {label}")]
    UnknownVariant { label: String },
    /// 选择了辅助识别，但没有配置 API key
    #[error("使用 LLM 辅助识别需要设置环境变量 {var_name}")]
    MissingApiKey { var_name: String },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 返回内容不是预期的 JSON
    #[error("无法解析LLM返回的数据 (响应: {response}): {source}")]
    ResponseParseFailed {
        response: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 压缩包写入失败
    #[error("压缩包写入失败: {source}")]
    ArchiveFailed {
        #[source]
        source: zip::result::ZipError,
    },
}

/// 成绩图渲染错误
#[derive(Debug, Error)]
#[error("无法为 {student} 生成成绩图: {message}")]
pub struct RenderError {
    pub student: String,
    pub message: String,
}

impl AppError {
    /// 是否为需要操作员修改配置后才能继续的错误
    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
