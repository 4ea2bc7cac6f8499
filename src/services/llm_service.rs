//! LLM 服务 - 业务能力层
//!
//! 只负责"LLM 辅助识别"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）
//!
//! 整份文档文本只发送一次，失败不重试。

use std::collections::BTreeMap;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::models::record::UNKNOWN_NAME;
use crate::models::{AnswerKey, ExamConfig, StudentRecord, Variant};
use crate::utils::logging::truncate_text;

/// LLM 返回的原始数据
#[derive(Debug, Clone, Default, Deserialize)]
struct ExamDataResponse {
    #[serde(default)]
    keys: BTreeMap<String, String>,
    #[serde(default)]
    students: Vec<StudentEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct StudentEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    variant: Option<String>,
    #[serde(default)]
    answers: String,
}

/// LLM 辅助识别的结果：答案和学生记录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistedExtraction {
    pub keys: AnswerKey,
    pub records: Vec<StudentRecord>,
}

impl AssistedExtraction {
    /// 解析 LLM 响应（允许被 ```json 代码块包裹）
    pub fn parse(response: &str, exam: &ExamConfig) -> Result<Self, LlmError> {
        let body = strip_code_fence(response);
        let data: ExamDataResponse =
            serde_json::from_str(body).map_err(|source| LlmError::ResponseParseFailed {
                response: truncate_text(response, 200),
                source,
            })?;
        Ok(Self::from_response(data, exam))
    }

    fn from_response(data: ExamDataResponse, exam: &ExamConfig) -> Self {
        let mut keys = AnswerKey::new();
        for (label, key) in &data.keys {
            match Variant::from_label(label).filter(|v| exam.is_active(*v)) {
                Some(variant) => keys.insert(variant, key),
                None => warn!("⚠️ LLM 返回了未使用的卷型 {}，已忽略", label),
            }
        }

        let records = data
            .students
            .into_iter()
            .filter(|s| !s.answers.trim().is_empty())
            .map(|s| {
                let name = s.name.trim();
                let name = if name.is_empty() { UNKNOWN_NAME } else { name };
                let variant = s
                    .variant
                    .as_deref()
                    .and_then(Variant::from_label)
                    .filter(|v| exam.is_active(*v))
                    .unwrap_or(exam.fallback_variant);
                StudentRecord::new(name, Some(variant), s.answers.trim())
            })
            .collect();

        Self { keys, records }
    }
}

/// 去掉 Markdown 代码块标记
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // 跳过 ```json 这一行
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().trim_end_matches("```").trim()
}

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 从文档文本中识别答案和学生作答
/// - 提供通用的 LLM 调用接口
/// - 不判分，不关心流程顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_input_chars: usize,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            max_input_chars: config.llm_max_input_chars,
        }
    }

    fn api_failed(&self, source: impl std::error::Error + Send + Sync + 'static) -> LlmError {
        LlmError::ApiCallFailed {
            model: self.model_name.clone(),
            source: Box::new(source),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// 返回 LLM 的响应内容（已去掉首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| self.api_failed(e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| self.api_failed(e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(8192u32)
            .build()
            .map_err(|e| self.api_failed(e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            self.api_failed(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    /// 从文档文本中识别答案和学生作答
    pub async fn extract_exam_data(
        &self,
        document_text: &str,
        exam: &ExamConfig,
    ) -> Result<AssistedExtraction, LlmError> {
        let text: String = document_text.chars().take(self.max_input_chars).collect();
        if text.chars().count() < document_text.chars().count() {
            warn!(
                "⚠️ 文档文本超过 {} 字符，只发送前半部分",
                self.max_input_chars
            );
        }

        info!("🤖 使用 LLM 辅助识别 (模型: {})", self.model_name);
        let (user_message, system_message) = build_extract_messages(&text, exam);
        let response = self
            .send_to_llm(&user_message, Some(&system_message))
            .await?;

        let extraction = AssistedExtraction::parse(&response, exam)?;
        info!(
            "🤖 LLM 识别到 {} 份答案, {} 名学生",
            extraction.keys.len(),
            extraction.records.len()
        );
        Ok(extraction)
    }
}

/// 构建用于识别的消息，返回 (user_message, system_message)
fn build_extract_messages(text: &str, exam: &ExamConfig) -> (String, String) {
    let system_message = "You extract exam data from text copied out of a results PDF. \
                          Reply with JSON only, no explanations."
        .to_string();

    let labels: Vec<String> = exam
        .active_variants()
        .iter()
        .map(|v| v.label().to_string())
        .collect();

    let user_message = format!(
        r#"The exam has {count} questions and booklet variants [{labels}].

Return exactly this JSON shape:
{{"keys": {{"A": "<answer key letters>"}}, "students": [{{"name": "<full name>", "variant": "<booklet label>", "answers": "<answer letters>"}}]}}

Rules:
- "keys" holds the answer key declared for each booklet variant, letters only.
- "students" holds one entry per student row, in document order, duplicates included.
- Use "" for a name you cannot find and omit "variant" when it is not printed.

Document text:
{text}"#,
        count = exam.question_count,
        labels = labels.join(", "),
        text = text,
    );

    (user_message, system_message)
}
