//! # formtrack 웹 서버 진입점
//!
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성 + 마이그레이션
//! 4. 생성형 텍스트 제공자와 처방기 구성
//! 5. API 라우터 설정 후 HTTP 서버 시작

use anyhow::Result;
use formtrack::{config::Config, db, llm, routes, services::advisor::Advisor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // RUST_LOG가 없으면 formtrack, tower_http, axum을 debug 레벨로
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formtrack=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting formtrack server on {}:{}", config.host, config.port);

    let pool = db::connect(&config.database_url, 5).await?;

    let advisor = Advisor::new(llm::from_config(&config), config.advisor_timeout);

    let state = routes::AppState {
        pool,
        advisor,
        jwt_secret: config.jwt_secret.clone(),
    };
    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
