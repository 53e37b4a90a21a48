//! RDT 송신 클라이언트
//!
//! 파일을 RDT4.0 세션으로 피어에게 전송한다.
//!
//! 사용법:
//!   cargo run --release --bin rdt-send -- [OPTIONS]
//!
//! 예시:
//!   # 손실 10%, 손상 10%, 윈도우 5
//!   cargo run --release --bin rdt-send -- -p 127.0.0.1:9200 -f data.bin --loss 0.1 --error 0.1 -w 5

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rdt::{transfer, Config, Session};

/// 클라이언트 설정
struct SendConfig {
    bind_addr: SocketAddr,
    peer_addr: SocketAddr,
    file_path: Option<PathBuf>,
    config: Config,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9100".parse().unwrap(),
            peer_addr: "127.0.0.1:9200".parse().unwrap(),
            file_path: None,
            config: Config::default(),
        }
    }
}

fn parse_args() -> SendConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = SendConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    config.bind_addr = args[i + 1].parse().expect("유효한 주소 필요");
                    i += 1;
                }
            }
            "--peer" | "-p" => {
                if i + 1 < args.len() {
                    config.peer_addr = args[i + 1].parse().expect("유효한 주소 필요");
                    i += 1;
                }
            }
            "--file" | "-f" => {
                if i + 1 < args.len() {
                    config.file_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--loss" => {
                if i + 1 < args.len() {
                    config.config.loss_rate = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--error" => {
                if i + 1 < args.len() {
                    config.config.error_rate = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--window" | "-w" => {
                if i + 1 < args.len() {
                    config.config.window_size = args[i + 1].parse().expect("1~255 사이 숫자 필요");
                    i += 1;
                }
            }
            "--unstable" => {
                // 손실/손상 10%, 작은 패킷, 긴 타임아웃 (윈도우 크기는 유지)
                config.config = Config::unstable_network(config.config.window_size);
            }
            "--help" | "-h" => {
                println!(
                    r#"RDT Send - RDT4.0 송신 클라이언트

사용법:
  cargo run --release --bin rdt-send -- [OPTIONS]

옵션:
  -b, --bind <ADDR>     로컬 바인드 주소 (기본: 0.0.0.0:9100)
  -p, --peer <ADDR>     수신자 주소 (기본: 127.0.0.1:9200)
  -f, --file <PATH>     전송할 파일 (없으면 64KB 테스트 데이터)
  --loss <RATE>         패킷 손실 확률 0.0~1.0 (기본: 0.0)
  --error <RATE>        패킷 손상 확률 0.0~1.0 (기본: 0.0)
  -w, --window <N>      윈도우 크기 (기본: 1)
  --unstable            불안정한 네트워크 프리셋 (이후 옵션이 덮어씀)
  -h, --help            이 도움말 출력

로그 레벨은 RUST_LOG 환경 변수로 조정 (기본: info)
"#
                );
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 설정
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let send_config = parse_args();
    let config = send_config.config.clone();

    info!(
        "Drop rate: {}, Error rate: {}, Window size: {}",
        config.loss_rate, config.error_rate, config.window_size
    );

    let data = if let Some(path) = &send_config.file_path {
        info!("Loading file: {:?}", path);
        std::fs::read(path)?
    } else {
        info!("Using test data (64KB)");
        (0..64 * 1024).map(|i| (i % 251) as u8).collect()
    };

    let mut session = Session::bind(config, send_config.bind_addr).await?;
    session.set_peer(send_config.peer_addr)?;

    transfer::send_all(&mut session, &data).await?;

    let stats = session.stats().clone();
    info!(
        "Sent {} bytes, {:.1} KB/s",
        stats.bytes_sent,
        stats.send_throughput() / 1024.0
    );
    info!("{}", stats.summary());

    session.close().await?;
    Ok(())
}
