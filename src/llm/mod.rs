//! # 생성형 텍스트(LLM) 추상화
//!
//! AI 처방 단계가 의존하는 유일한 외부 기능은 "프롬프트 → 텍스트" 하나입니다.
//! 이를 `TextCompletion` 트레이트로 정의하고,
//! - `OpenAiCompatibleClient`: Groq 등 OpenAI 호환 chat completions API 구현
//! - `DisabledCompletion`: API 키가 설정되지 않았을 때 항상 실패하는 구현
//!
//! 을 제공합니다. 테스트에서는 이 트레이트의 대역(test double)을 주입합니다.

pub mod openai_compatible;

pub use openai_compatible::OpenAiCompatibleClient;

use crate::config::Config;
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;

/// 프롬프트를 받아 자유 형식 텍스트를 돌려주는 생성형 텍스트 서비스
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

/// 제공자가 설정되지 않았을 때 사용하는 구현. 호출하면 항상 에러.
pub struct DisabledCompletion;

#[async_trait]
impl TextCompletion for DisabledCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, AppError> {
        Err(AppError::ExternalService(
            "No generative-text provider configured".to_string(),
        ))
    }
}

/// 설정에 따라 사용할 구현을 고릅니다.
pub fn from_config(config: &Config) -> Arc<dyn TextCompletion> {
    match &config.llm_api_key {
        Some(api_key) => {
            tracing::info!("Using generative-text provider at {} ({})", config.llm_base_url, config.llm_model);
            Arc::new(OpenAiCompatibleClient::new(
                config.llm_base_url.clone(),
                api_key.clone(),
                config.llm_model.clone(),
            ))
        }
        None => {
            tracing::warn!("GROQ_API_KEY not set, next-session advice will use the standard fallback");
            Arc::new(DisabledCompletion)
        }
    }
}
