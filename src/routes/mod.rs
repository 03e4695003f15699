//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들과 라우터 구성입니다.
//!
//! 하위 모듈:
//! - `form_analysis`: 폼 분석 저장/기록/요약/추세 핸들러
//! - `health`: 서버 상태 확인 (헬스체크)

pub mod form_analysis;
pub mod health;

pub use form_analysis::*;
pub use health::*;

use crate::services::advisor::Advisor;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// 애플리케이션 공유 상태
///
/// 모든 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 풀과 처방기는 내부적으로 Arc이므로 clone해도 같은 자원을 가리킵니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀
    pub pool: SqlitePool,
    /// 다음 세션 처방기 (생성형 텍스트 서비스 + 타임아웃)
    pub advisor: Advisor,
    /// JWT 토큰 검증용 비밀키
    pub jwt_secret: String,
}

/// `/api/v1` 아래에 모든 API를 묶은 라우터
pub fn router(state: AppState) -> Router {
    let form_analysis_routes = Router::new()
        .route("/form-analysis/save", post(save_form_analysis))
        .route("/form-analysis/history/{exercise}", get(get_form_analysis_history))
        .route("/form-analysis/summary", get(get_form_analysis_summary))
        .route("/form-analysis/trends/{exercise}", get(get_improvement_trends))
        .route(
            "/form-analysis/sessions/{id}",
            get(get_form_session).delete(delete_form_session),
        );

    let api_routes = Router::new()
        .merge(form_analysis_routes)
        .route("/health", get(health_check))
        .with_state(state);

    // 개발 환경 기준 설정. 프로덕션에서는 특정 도메인만 허용해야 합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
