//! # toron-app
//!
//! TORON 클라이언트 바이너리 진입점.
//! 어댑터 조립(DI), CLI 파싱, 대화형 토론 세션 루프.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use toron_core::config::AppConfig;
use toron_core::config_manager::ConfigManager;
use toron_core::models::suggestion::SuggestionStatus;
use toron_core::ports::api_client::DebateApi;
use toron_core::ports::profile::{ProfileStore, DISPLAY_NAME_KEY};
use toron_core::ports::stream::StreamClient;
use toron_network::http_client::HttpDebateApi;
use toron_network::ws_client::WsStreamClient;
use toron_session::DiscussionSession;
use toron_storage::SqliteProfileStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 메시지 스냅샷 폴링 간격
const RENDER_INTERVAL: Duration = Duration::from_millis(500);

/// TORON 토론 클라이언트
///
/// 실시간 토론 참가, 메시지 전송, AI 반론 제안
#[derive(Parser, Debug)]
#[command(name = "toron")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 서버 URL 지정 (기본: 설정 파일의 값)
    #[arg(long, short = 's')]
    server: Option<String>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "warn")]
    log_level: String,

    /// 데이터 저장 경로 (기본: 플랫폼별 데이터 디렉토리)
    #[arg(long)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 진행 중인 토론 목록 조회
    List,

    /// 토론 참가 (대화형)
    Join {
        /// 참가할 토론 ID
        debate_id: i64,

        /// 이번 세션에서 사용할 표시 이름 (지정 시 저장됨)
        #[arg(long, short = 'n')]
        name: Option<String>,
    },

    /// 표시 이름 설정
    Name {
        /// 새 표시 이름
        name: String,
    },
}

/// 프로필 DB 경로 결정 (CLI 인자 또는 플랫폼별 데이터 디렉토리)
fn resolve_db_path(data_dir: Option<&str>, config: &AppConfig) -> Result<PathBuf> {
    if let Some(dir) = data_dir {
        return Ok(PathBuf::from(dir).join("profile.db"));
    }
    if let Some(path) = &config.storage.db_path {
        return Ok(path.clone());
    }
    let dir = ConfigManager::data_dir().context("데이터 디렉토리 결정 실패")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("데이터 디렉토리 생성 실패: {}", dir.display()))?;
    Ok(dir.join("profile.db"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "toron={level},toron_app={level},toron_core={level},toron_network={level},toron_session={level},toron_storage={level}",
        level = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let config_manager = ConfigManager::new().context("설정 로드 실패")?;
    let mut config = config_manager.get();
    if let Some(server) = &args.server {
        config.server.base_url = server.trim_end_matches('/').to_string();
    }

    let api: Arc<dyn DebateApi> = Arc::new(
        HttpDebateApi::new(&config.server.base_url, config.server.request_timeout())
            .context("HTTP 클라이언트 생성 실패")?
            .with_max_retries(config.server.max_retries),
    );

    match args.command {
        Command::List => run_list(api).await,
        Command::Name { name } => {
            let db_path = resolve_db_path(args.data_dir.as_deref(), &config)?;
            run_set_name(&db_path, &name).await
        }
        Command::Join { debate_id, name } => {
            let db_path = resolve_db_path(args.data_dir.as_deref(), &config)?;
            let stream: Arc<dyn StreamClient> =
                Arc::new(WsStreamClient::new(&config.server.base_url));
            run_join(
                debate_id,
                name,
                api,
                stream,
                &db_path,
                config.server.stream_channel_capacity,
            )
            .await
        }
    }
}

/// 토론 목록 출력
async fn run_list(api: Arc<dyn DebateApi>) -> Result<()> {
    let debates = api.fetch_debates().await.context("토론 목록 조회 실패")?;

    if debates.is_empty() {
        println!("진행 중인 토론이 없습니다.");
        return Ok(());
    }

    println!("{:>6}  {}", "ID", "제목");
    println!("{:->6}  {:-<40}", "", "");
    for debate in &debates {
        println!("{:>6}  {}", debate.id, debate.title);
        if let Some(description) = &debate.description {
            println!("{:>6}  └ {}", "", description);
        }
    }
    Ok(())
}

/// 표시 이름 저장
async fn run_set_name(db_path: &PathBuf, name: &str) -> Result<()> {
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "표시 이름은 비워둘 수 없습니다");

    let profile = SqliteProfileStore::open(db_path).context("프로필 저장소 열기 실패")?;
    profile
        .set(DISPLAY_NAME_KEY, name)
        .await
        .context("표시 이름 저장 실패")?;
    println!("표시 이름이 '{name}'(으)로 설정되었습니다.");
    Ok(())
}

/// 대화형 토론 세션
async fn run_join(
    debate_id: i64,
    name: Option<String>,
    api: Arc<dyn DebateApi>,
    stream: Arc<dyn StreamClient>,
    db_path: &PathBuf,
    channel_capacity: usize,
) -> Result<()> {
    let profile: Arc<dyn ProfileStore> =
        Arc::new(SqliteProfileStore::open(db_path).context("프로필 저장소 열기 실패")?);

    if let Some(name) = &name {
        let name = name.trim();
        anyhow::ensure!(!name.is_empty(), "표시 이름은 비워둘 수 없습니다");
        profile
            .set(DISPLAY_NAME_KEY, name)
            .await
            .context("표시 이름 저장 실패")?;
    }

    // 참가 전 표시 이름 필수
    let has_name = profile
        .get(DISPLAY_NAME_KEY)
        .await
        .unwrap_or(None)
        .map(|n| !n.trim().is_empty())
        .unwrap_or(false);
    anyhow::ensure!(
        has_name,
        "표시 이름이 설정되지 않았습니다. 먼저 설정하세요: toron name <이름> (또는 --name)"
    );

    let session =
        DiscussionSession::join_with_capacity(debate_id, api, stream, profile, channel_capacity)
            .await
            .context("토론 참가 실패")?;

    println!(
        "토론 #{debate_id} 참가 — 표시 이름: {}",
        session.display_name()
    );
    println!("입력한 내용이 전송됩니다. 명령: /suggest <메시지ID>, /name <이름>, /quit");
    println!();

    // 초기 메시지 출력
    let mut printed: HashSet<i64> = HashSet::new();
    render_new_messages(&session, &mut printed);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut render_tick = tokio::time::interval(RENDER_INTERVAL);

    loop {
        tokio::select! {
            _ = render_tick.tick() => {
                render_new_messages(&session, &mut printed);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("표준 입력 읽기 실패")? else {
                    break; // EOF
                };
                if !handle_input(&session, line.trim()).await {
                    break;
                }
            }
        }
    }

    session.leave().await;
    info!("토론 #{debate_id} 이탈");
    Ok(())
}

/// 아직 출력하지 않은 메시지를 도착 순서대로 출력
fn render_new_messages(session: &DiscussionSession, printed: &mut HashSet<i64>) {
    let reconciler = session.reconciler();
    for message in reconciler.messages() {
        if !printed.insert(message.id) {
            continue;
        }
        let marker = if reconciler.is_winner(message.id) {
            "★"
        } else {
            " "
        };
        println!("{marker} [{}] {}: {}", message.id, message.author, message.content);
    }
}

/// 입력 한 줄 처리. 계속 진행하면 true, 종료면 false.
async fn handle_input(session: &DiscussionSession, input: &str) -> bool {
    if input.is_empty() {
        return true;
    }

    if let Some(rest) = input.strip_prefix("/name ") {
        match session.switch_user(rest).await {
            Ok(()) => println!("표시 이름: {}", session.display_name()),
            Err(e) => eprintln!("이름 변경 실패: {e}"),
        }
        return true;
    }

    if let Some(rest) = input.strip_prefix("/suggest ") {
        let Ok(message_id) = rest.trim().parse::<i64>() else {
            eprintln!("사용법: /suggest <메시지ID>");
            return true;
        };
        if let Err(e) = session.reconciler().request_suggestions(message_id) {
            eprintln!("제안 요청 실패: {e}");
            return true;
        }
        // 백그라운드 조회가 끝날 때까지 잠시 폴링
        for _ in 0..20 {
            match session.reconciler().suggestion_status(message_id) {
                SuggestionStatus::Ready(suggestions) => {
                    println!("메시지 {message_id}에 대한 반론 제안:");
                    for (i, s) in suggestions.iter().enumerate() {
                        println!("  {}. {s}", i + 1);
                    }
                    return true;
                }
                SuggestionStatus::Failed => {
                    eprintln!("제안을 가져오지 못했습니다. 다시 시도해 주세요.");
                    return true;
                }
                _ => tokio::time::sleep(Duration::from_millis(250)).await,
            }
        }
        eprintln!("제안 응답 대기 시간 초과");
        return true;
    }

    if input == "/quit" {
        return false;
    }

    if input.starts_with('/') {
        eprintln!("알 수 없는 명령: {input}");
        return true;
    }

    match session.send(input).await {
        Ok(Some(_)) => {}
        Ok(None) => {} // 공백 입력 — 조용히 무시
        Err(e) => eprintln!("전송 실패: {e}"),
    }
    true
}
